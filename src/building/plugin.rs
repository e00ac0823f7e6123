use bevy::prelude::*;

use crate::input::PointerPosition;
use crate::scenery::spawn_starter_scenery;
use crate::settings::BuildingSettings;
use crate::state::GameState;

use super::catalog::StructureCatalogAssetPlugin;
use super::events::{CommitRequested, CycleBlueprintRequested, PlacementFeedback, RotateRequested};
use super::systems::{
    apply_candidate_pose, attach_structure_visuals, handle_commit_requests, handle_cycle_requests,
    handle_rotate_requests, init_structure_materials, load_catalog, recolor_placed_structures,
    release_orphaned_candidates, resolve_pointer_target, spawn_initial_candidates,
    sync_view_rotation, tick_placement, PointerTarget, StructureCatalogHandle,
};

/// Update ordering: input is mapped before the placement chain reads it.
#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub enum BuildSet {
    Input,
    Placement,
}

pub struct BuildingPlugin {
    /// Settings file on disk (RON). Missing file = defaults.
    pub settings_path: String,
}

impl Default for BuildingPlugin {
    fn default() -> Self {
        Self { settings_path: "assets/building.ron".to_string() }
    }
}

impl Plugin for BuildingPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(StructureCatalogAssetPlugin)
            .insert_resource(BuildingSettings::load_or_default(&self.settings_path))
            .init_resource::<StructureCatalogHandle>()
            .init_resource::<PointerPosition>()
            .init_resource::<PointerTarget>()
            .add_event::<RotateRequested>()
            .add_event::<CycleBlueprintRequested>()
            .add_event::<CommitRequested>()
            .add_event::<PlacementFeedback>()

            // --- Update ordering, paused = frozen ---
            .configure_sets(Update, BuildSet::Input.run_if(in_state(GameState::Running)))
            .configure_sets(
                Update,
                BuildSet::Placement
                    .after(BuildSet::Input)
                    .run_if(in_state(GameState::Running)),
            )

            .add_systems(Startup, (load_catalog, init_structure_materials))
            // Catalog-driven spawning + visuals, independent of pause
            .add_systems(
                Update,
                (
                    spawn_initial_candidates,
                    spawn_starter_scenery,
                    release_orphaned_candidates,
                    attach_structure_visuals,
                    recolor_placed_structures,
                ),
            )
            // One placement tick: view → blueprint → target → snap → rotate → commit → pose out
            .add_systems(
                Update,
                (
                    sync_view_rotation,
                    handle_cycle_requests,
                    resolve_pointer_target,
                    tick_placement,
                    handle_rotate_requests,
                    handle_commit_requests,
                    apply_candidate_pose,
                )
                    .chain()
                    .in_set(BuildSet::Placement),
            );
    }
}
