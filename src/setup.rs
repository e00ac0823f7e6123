use bevy::prelude::*;

use crate::building::BuildController;
use crate::input::CameraOrbit;
use crate::settings::BuildingSettings;

#[derive(Component)]
pub struct MainCamera;

pub fn setup(
    mut commands: Commands,
    settings: Res<BuildingSettings>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let ground = settings.ground_height.unwrap_or(0.0);

    // 1) Light
    commands.spawn((
        DirectionalLight {
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(30.0, 60.0, 20.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    // 2) Build plane (visual only; the ray hits the analytic plane)
    if settings.ground_height.is_some() {
        commands.spawn((
            Mesh3d(meshes.add(Plane3d::default().mesh().size(200.0, 200.0))),
            MeshMaterial3d(materials.add(StandardMaterial {
                base_color: Color::srgb(0.32, 0.36, 0.30),
                perceptual_roughness: 1.0,
                ..default()
            })),
            Transform::from_xyz(0.0, ground, 0.0),
        ));
    }

    // 3) Camera, which is also the builder
    let focus = Vec3::new(0.0, ground, 0.0);
    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(-20.0, ground + 24.0, 30.0).looking_at(focus, Vec3::Y),
        MainCamera,
        CameraOrbit {
            focus,
            radius: 40.0,
            yaw: 2.0,
            pitch: 0.7,
        },
        BuildController { blueprint: settings.starting_blueprint.clone() },
    ));
}
