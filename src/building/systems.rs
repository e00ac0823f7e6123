// src/building/systems.rs

use bevy::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

use crate::input::PointerPosition;
use crate::settings::BuildingSettings;
use crate::setup::MainCamera;

use super::catalog::{StructureCatalog, StructureDef};
use super::components::{BuildController, Candidate, Collider, CollisionLayer, StructureVisual, VisualSize};
use super::controller::{CommitRejected, PlacementSession, SnapState, TickOutcome};
use super::core::Structure;
use super::events::{CommitRequested, CycleBlueprintRequested, PlacementFeedback, RotateRequested};
use super::layers::tag_hierarchy;
use super::scene::SceneQuery;
use super::spatial::raycast_to_world;

/// Handle to the loaded structure catalog.
#[derive(Resource, Default)]
pub struct StructureCatalogHandle(pub Handle<StructureCatalog>);

/// World point under the pointer this frame, if the ray hit anything.
#[derive(Resource, Default, Debug, Clone, Copy, PartialEq)]
pub struct PointerTarget(pub Option<Vec3>);

/// Materials for the placeholder visuals.
#[derive(Resource)]
pub struct StructureMaterials {
    pub candidate: Handle<StandardMaterial>,
    pub placed: Handle<StandardMaterial>,
}

// ---------- Spawning ----------

/// Spawn an unplaced candidate: candidate layer, collider off.
pub fn spawn_candidate(
    commands: &mut Commands,
    controller: Entity,
    blueprint: Arc<StructureDef>,
    pose: Transform,
) -> Entity {
    commands
        .spawn((
            pose,
            GlobalTransform::from(pose),
            Visibility::Visible,
            CollisionLayer::Candidate,
            Collider::disabled(blueprint.collider_radius),
            VisualSize(blueprint.size),
            Candidate { controller, blueprint },
        ))
        .id()
}

/// Spawn a structure that is already part of the scene.
pub fn spawn_structure(commands: &mut Commands, blueprint: &StructureDef, pose: Transform) -> Entity {
    commands
        .spawn((
            pose,
            GlobalTransform::from(pose),
            Visibility::Visible,
            CollisionLayer::Structure,
            Collider::enabled(blueprint.collider_radius),
            VisualSize(blueprint.size),
            Structure::placed(blueprint, &pose),
        ))
        .id()
}

/// Give `controller` a first candidate and a fresh session around it.
pub fn begin_session(
    commands: &mut Commands,
    controller: Entity,
    blueprint: Arc<StructureDef>,
    pose: Transform,
) -> Entity {
    let group_id = blueprint.group_id;
    let candidate = spawn_candidate(commands, controller, blueprint, pose);
    commands
        .entity(controller)
        .insert(PlacementSession::new(candidate, group_id, pose));
    candidate
}

/// Startup: request the catalog, store handle.
pub fn load_catalog(
    mut handle_res: ResMut<StructureCatalogHandle>,
    settings: Res<BuildingSettings>,
    assets: Res<AssetServer>,
) {
    if handle_res.0.is_strong() { return; }
    handle_res.0 = assets.load(settings.catalog_path.as_str());
    info!("Building: loading structure catalog from '{}'", settings.catalog_path);
}

/// Where a controller's first candidate appears: where its view meets the
/// ground, else straight below it. Without ground, at the controller.
pub fn initial_pose(controller: &GlobalTransform, ground_height: Option<f32>) -> Transform {
    let origin = controller.translation();
    let Some(ground) = ground_height else {
        return Transform::from_translation(origin);
    };
    let view = Ray3d::new(origin, controller.forward());
    let at = raycast_to_world(view, Some(ground), std::iter::empty())
        .unwrap_or(Vec3::new(origin.x, ground, origin.z));
    Transform::from_translation(at)
}

/// Update: start a session on every controller that does not have one yet.
pub fn spawn_initial_candidates(
    mut commands: Commands,
    settings: Res<BuildingSettings>,
    handle: Res<StructureCatalogHandle>,
    catalogs: Res<Assets<StructureCatalog>>,
    controllers: Query<(Entity, &BuildController, &GlobalTransform), Without<PlacementSession>>,
    mut warned: Local<HashSet<Entity>>,
) {
    let Some(catalog) = catalogs.get(&handle.0) else { return; };

    for (controller, build, tf) in &controllers {
        let Some(blueprint) = catalog.get(&build.blueprint) else {
            if warned.insert(controller) {
                warn!("Building: controller {controller} wants unknown blueprint '{}'", build.blueprint);
            }
            continue;
        };
        let pose = initial_pose(tf, settings.ground_height);
        let candidate = begin_session(&mut commands, controller, blueprint.clone(), pose);
        info!("Building: '{}' candidate {candidate} ready for {controller}", blueprint.name);
    }
}

// ---------- Per-tick placement ----------

/// Free candidates face where the builder faces (yaw only).
pub fn sync_view_rotation(mut controllers: Query<(&GlobalTransform, &mut PlacementSession)>) {
    for (tf, mut session) in &mut controllers {
        let (yaw, _, _) = tf.rotation().to_euler(EulerRot::YXZ);
        session.set_view_rotation(Quat::from_rotation_y(yaw));
    }
}

/// Cursor → camera ray → nearest ground/structure hit.
pub fn resolve_pointer_target(
    pointer: Res<PointerPosition>,
    settings: Res<BuildingSettings>,
    cameras: Query<(&Camera, &GlobalTransform), With<MainCamera>>,
    scene: SceneQuery,
    mut target: ResMut<PointerTarget>,
) {
    let hit = pointer.0.and_then(|cursor| {
        let (camera, cam_tf) = cameras.single().ok()?;
        let ray = camera.viewport_to_world(cam_tf, cursor).ok()?;
        raycast_to_world(ray, settings.ground_height, scene.surfaces())
    });
    target.set_if_neq(PointerTarget(hit));
}

pub fn tick_placement(
    target: Res<PointerTarget>,
    settings: Res<BuildingSettings>,
    scene: SceneQuery,
    mut sessions: Query<(Entity, &mut PlacementSession)>,
    mut feedback: EventWriter<PlacementFeedback>,
) {
    for (controller, mut session) in &mut sessions {
        let before = session.snap_state();
        match session.tick(target.0, &scene, settings.snap_search_radius) {
            TickOutcome::Attached { anchor, reattached } => {
                debug!(
                    "Building: {controller} snapped to {} (reattached: {reattached})",
                    anchor.position
                );
                feedback.write(PlacementFeedback::Snapped { controller, anchor: anchor.position });
            }
            TickOutcome::Tracking if before == SnapState::Snapped => {
                debug!("Building: {controller} released its snap");
                feedback.write(PlacementFeedback::Released { controller });
            }
            _ => {}
        }
    }
}

pub fn handle_rotate_requests(
    mut requests: EventReader<RotateRequested>,
    settings: Res<BuildingSettings>,
    mut sessions: Query<&mut PlacementSession>,
    mut feedback: EventWriter<PlacementFeedback>,
) {
    for req in requests.read() {
        let Ok(mut session) = sessions.get_mut(req.controller) else { continue; };
        if session.rotate(settings.rotate_step()) {
            feedback.write(PlacementFeedback::Rotated { controller: req.controller });
        } else {
            debug!("Building: rotate ignored for {}, no active pivot", req.controller);
        }
    }
}

pub fn handle_commit_requests(
    mut commands: Commands,
    mut requests: EventReader<CommitRequested>,
    settings: Res<BuildingSettings>,
    scene: SceneQuery,
    mut sessions: Query<&mut PlacementSession>,
    candidates: Query<&Candidate>,
    children: Query<&Children>,
    mut feedback: EventWriter<PlacementFeedback>,
) {
    for req in requests.read() {
        let controller = req.controller;
        // 1) Resolve session + blueprint of the live candidate
        let Ok(mut session) = sessions.get_mut(controller) else { continue; };
        let Ok(candidate) = candidates.get(session.candidate()) else { continue; };
        let blueprint = candidate.blueprint.clone();

        // 2) Overlap check; on success the next candidate is spawned
        let result = session.commit(&scene, settings.placement_check_radius, |pose| {
            spawn_candidate(&mut commands, controller, blueprint.clone(), *pose)
        });

        match result {
            Ok(placed) => {
                // 3) Turn the old candidate into a solid structure
                commands.entity(placed.entity).remove::<Candidate>().insert((
                    placed.pose,
                    GlobalTransform::from(placed.pose),
                    Collider::enabled(blueprint.collider_radius),
                    Structure::placed(&blueprint, &placed.pose),
                ));
                // 4) Whole hierarchy joins the structure layer
                tag_hierarchy(&mut commands, &children, placed.entity, CollisionLayer::Structure);
                info!(
                    "Building: placed '{}' {} at {}",
                    blueprint.name, placed.entity, placed.pose.translation
                );
                feedback.write(PlacementFeedback::Placed { controller, structure: placed.entity });
            }
            Err(rejected @ CommitRejected::Blocked { count }) => {
                debug!("Building: commit for {controller} rejected: {rejected}");
                feedback.write(PlacementFeedback::Rejected { controller, blocking: count });
            }
        }
    }
}

/// Swap a controller's candidate for the next catalog blueprint, in place.
pub fn handle_cycle_requests(
    mut commands: Commands,
    mut requests: EventReader<CycleBlueprintRequested>,
    handle: Res<StructureCatalogHandle>,
    catalogs: Res<Assets<StructureCatalog>>,
    mut controllers: Query<(&mut BuildController, &mut PlacementSession)>,
    mut feedback: EventWriter<PlacementFeedback>,
) {
    let Some(catalog) = catalogs.get(&handle.0) else {
        requests.clear();
        return;
    };

    for req in requests.read() {
        let controller = req.controller;
        let Ok((mut build, mut session)) = controllers.get_mut(controller) else { continue; };
        let Some(next) = catalog.next_after(&build.blueprint) else { continue; };
        if next.name == build.blueprint { continue; }

        commands.entity(session.candidate()).despawn();
        let candidate = spawn_candidate(&mut commands, controller, next.clone(), *session.pose());
        session.swap_candidate(candidate, next.group_id);
        info!("Building: {controller} switched '{}' -> '{}'", build.blueprint, next.name);
        build.blueprint = next.name.clone();
        feedback.write(PlacementFeedback::Switched { controller });
    }
}

/// Copy each session's pose onto its candidate for rendering.
pub fn apply_candidate_pose(
    sessions: Query<&PlacementSession>,
    mut candidates: Query<&mut Transform, With<Candidate>>,
) {
    for session in &sessions {
        if let Ok(mut tf) = candidates.get_mut(session.candidate()) {
            tf.set_if_neq(*session.pose());
        }
    }
}

/// A despawned controller takes its candidate with it.
pub fn release_orphaned_candidates(
    mut commands: Commands,
    mut removed: RemovedComponents<PlacementSession>,
    candidates: Query<(Entity, &Candidate)>,
) {
    for controller in removed.read() {
        for (entity, candidate) in &candidates {
            if candidate.controller == controller {
                debug!("Building: dropping candidate {entity} of removed controller {controller}");
                commands.entity(entity).despawn();
            }
        }
    }
}

// ---------- Visuals ----------

pub fn init_structure_materials(
    mut commands: Commands,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let candidate = materials.add(StandardMaterial {
        base_color: Color::srgba(0.3, 0.8, 1.0, 0.45),
        alpha_mode: AlphaMode::Blend,
        ..default()
    });
    let placed = materials.add(StandardMaterial {
        base_color: Color::srgb_u8(196, 170, 130),
        ..default()
    });
    commands.insert_resource(StructureMaterials { candidate, placed });
}

/// Box child under every new structure or candidate root.
pub fn attach_structure_visuals(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    materials: Res<StructureMaterials>,
    added: Query<(Entity, &VisualSize, Has<Candidate>), Added<VisualSize>>,
) {
    for (entity, size, is_candidate) in &added {
        let mesh = meshes.add(Cuboid::new(size.x, size.y, size.z));
        let material = if is_candidate { materials.candidate.clone() } else { materials.placed.clone() };
        commands.entity(entity).with_children(|parent| {
            parent.spawn((
                Mesh3d(mesh),
                MeshMaterial3d(material),
                Transform::from_xyz(0.0, size.y * 0.5, 0.0),
                StructureVisual,
            ));
        });
    }
}

/// Committed candidates switch to the solid material.
pub fn recolor_placed_structures(
    materials: Res<StructureMaterials>,
    placed: Query<&Children, Added<Structure>>,
    mut visuals: Query<&mut MeshMaterial3d<StandardMaterial>, With<StructureVisual>>,
) {
    for kids in &placed {
        let kids: &[Entity] = kids;
        for &child in kids {
            if let Ok(mut material) = visuals.get_mut(child) {
                material.0 = materials.placed.clone();
            }
        }
    }
}
