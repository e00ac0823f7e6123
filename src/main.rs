use bevy::prelude::*;

use keystone::actions::ActionState;
use keystone::building::{BuildSet, BuildingPlugin};
use keystone::input::{
    camera_controller, dispatch_build_actions, input_mapping_system, pause_toggle_system,
    track_pointer,
};
use keystone::setup;
use keystone::state::GameState;
use keystone::ui::{despawn_pause_overlay, spawn_build_hud, spawn_pause_overlay, update_build_hud};

fn main() {
    App::new()
        // core engine plugins
        .add_plugins(DefaultPlugins)
        // snapping, catalog, placement chain
        .add_plugins(BuildingPlugin::default())
        // init resources & game-state
        .init_resource::<ActionState>()
        .init_state::<GameState>()
        // camera (also the builder), light, build plane, HUD
        .add_systems(Startup, (setup::setup, spawn_build_hud))
        // pause-menu UI
        .add_systems(OnEnter(GameState::Paused), spawn_pause_overlay)
        .add_systems(OnExit(GameState::Paused), despawn_pause_overlay)
        // pause toggle each frame, input feeds the placement chain
        .add_systems(Update, (pause_toggle_system, update_build_hud))
        .add_systems(
            Update,
            (track_pointer, input_mapping_system, dispatch_build_actions)
                .chain()
                .in_set(BuildSet::Input),
        )
        .add_systems(
            Update,
            camera_controller
                .after(input_mapping_system)
                .run_if(in_state(GameState::Running)),
        )
        .run();
}
