use bevy::input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel};
use bevy::input::{keyboard::KeyCode, ButtonInput};
use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::actions::{ActionState, PlayerAction};
use crate::building::{CommitRequested, CycleBlueprintRequested, PlacementSession, RotateRequested};
use crate::settings::BuildingSettings;
use crate::setup::MainCamera;
use crate::state::GameState;

pub const PAN_SPEED: f32 = 20.0;
pub const ROTATE_SPEED: f32 = 0.2;
pub const MAX_CAMERA_DT: f32 = 0.05; // never use a dt larger than 50ms

#[derive(Component)]
pub struct CameraOrbit {
    pub focus: Vec3,
    pub radius: f32,
    pub yaw: f32,
    pub pitch: f32,
}

/// Cursor in primary-window coordinates; `None` while it is outside the window.
#[derive(Resource, Default, Debug, Clone, Copy, PartialEq)]
pub struct PointerPosition(pub Option<Vec2>);

pub fn track_pointer(
    windows: Query<&Window, With<PrimaryWindow>>,
    mut pointer: ResMut<PointerPosition>,
) {
    let cursor = windows.single().ok().and_then(|w| w.cursor_position());
    pointer.set_if_neq(PointerPosition(cursor));
}

pub fn input_mapping_system(
    keys: Res<ButtonInput<KeyCode>>,
    mouse_buttons: Res<ButtonInput<MouseButton>>,
    mut action_state: ResMut<ActionState>,
) {
    action_state.begin_frame();

    action_state.hold(PlayerAction::PanForward, keys.pressed(KeyCode::KeyW));
    action_state.hold(PlayerAction::PanBackward, keys.pressed(KeyCode::KeyS));
    action_state.hold(PlayerAction::PanLeft, keys.pressed(KeyCode::KeyA));
    action_state.hold(PlayerAction::PanRight, keys.pressed(KeyCode::KeyD));

    if keys.just_pressed(KeyCode::KeyR) {
        action_state.fire(PlayerAction::RotateBuilding);
    }
    if keys.just_pressed(KeyCode::Tab) {
        action_state.fire(PlayerAction::CycleBlueprint);
    }
    if mouse_buttons.just_pressed(MouseButton::Left) {
        action_state.fire(PlayerAction::PlaceBuilding);
    }
}

/// Turns fired build actions into per-controller commands.
pub fn dispatch_build_actions(
    action_state: Res<ActionState>,
    sessions: Query<Entity, With<PlacementSession>>,
    mut rotate: EventWriter<RotateRequested>,
    mut cycle: EventWriter<CycleBlueprintRequested>,
    mut commit: EventWriter<CommitRequested>,
) {
    let wants_rotate = action_state.fired(PlayerAction::RotateBuilding);
    let wants_cycle = action_state.fired(PlayerAction::CycleBlueprint);
    let wants_commit = action_state.fired(PlayerAction::PlaceBuilding);
    if !wants_rotate && !wants_cycle && !wants_commit { return; }

    for controller in &sessions {
        if wants_cycle {
            cycle.write(CycleBlueprintRequested { controller });
        }
        if wants_rotate {
            rotate.write(RotateRequested { controller });
        }
        if wants_commit {
            commit.write(CommitRequested { controller });
        }
    }
}

pub fn pause_toggle_system(
    keys: Res<ButtonInput<KeyCode>>,
    mut next_state: ResMut<NextState<GameState>>,
    current_state: Res<State<GameState>>,
) {
    if keys.just_pressed(KeyCode::Escape) {
        match current_state.get() {
            GameState::Running => {
                next_state.set(GameState::Paused);
                info!("Paused game");
            }
            GameState::Paused => {
                next_state.set(GameState::Running);
                info!("Resumed game");
            }
        }
    }
}

/// WASD pans the focus over the build plane, middle mouse orbits, wheel zooms.
pub fn camera_controller(
    time: Res<Time>,
    settings: Res<BuildingSettings>,
    mouse_buttons: Res<ButtonInput<MouseButton>>,
    mut motion_evr: EventReader<MouseMotion>,
    mut scroll_evr: EventReader<MouseWheel>,
    action_state: Res<ActionState>,
    mut query: Query<(&mut Transform, &mut CameraOrbit), With<MainCamera>>,
) {
    let dt = time.delta_secs().min(MAX_CAMERA_DT);
    let Ok((mut tf, mut orbit)) = query.single_mut() else { return; };

    // Camera-relative pan
    let forward = Vec2::new(-orbit.yaw.cos(), -orbit.yaw.sin());
    let right = Vec2::new(-forward.y, forward.x);

    let mut dir = Vec2::ZERO;
    if action_state.pressed(PlayerAction::PanForward) { dir += forward; }
    if action_state.pressed(PlayerAction::PanBackward) { dir -= forward; }
    if action_state.pressed(PlayerAction::PanLeft) { dir -= right; }
    if action_state.pressed(PlayerAction::PanRight) { dir += right; }

    if dir != Vec2::ZERO {
        let delta = dir.normalize() * PAN_SPEED * dt;
        orbit.focus.x += delta.x;
        orbit.focus.z += delta.y;
    }

    let ground = settings.ground_height.unwrap_or(0.0);
    orbit.focus.y = ground;

    for ev in scroll_evr.read() {
        let amount = match ev.unit {
            MouseScrollUnit::Line => ev.y,
            MouseScrollUnit::Pixel => ev.y * 0.02,
        };
        orbit.radius = (orbit.radius - amount).clamp(4.0, 200.0);
    }

    if mouse_buttons.pressed(MouseButton::Middle) {
        for ev in motion_evr.read() {
            orbit.yaw += ev.delta.x * ROTATE_SPEED * dt;
            orbit.pitch += ev.delta.y * ROTATE_SPEED * dt;
        }
    } else {
        motion_evr.clear();
    }

    // Stay above the build plane
    orbit.pitch = orbit.pitch.clamp(0.1, std::f32::consts::FRAC_PI_2 - 0.01);

    let xz_radius = orbit.radius * orbit.pitch.cos();
    let offset = Vec3::new(
        xz_radius * orbit.yaw.cos(),
        orbit.radius * orbit.pitch.sin(),
        xz_radius * orbit.yaw.sin(),
    );

    tf.translation = orbit.focus + offset;
    tf.look_at(orbit.focus, Vec3::Y);
}
