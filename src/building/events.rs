// src/building/events.rs
use bevy::prelude::*;

/// Ask `controller` to turn its candidate one step around the active pivot.
#[derive(Event, Clone, Copy, Debug)]
pub struct RotateRequested {
    pub controller: Entity,
}

/// Ask `controller` to place its candidate.
#[derive(Event, Clone, Copy, Debug)]
pub struct CommitRequested {
    pub controller: Entity,
}

/// Ask `controller` to swap its candidate for the next blueprint in the catalog.
#[derive(Event, Clone, Copy, Debug)]
pub struct CycleBlueprintRequested {
    pub controller: Entity,
}

/// Outcome stream for UI and audio cues.
#[derive(Event, Clone, Copy, Debug, PartialEq)]
pub enum PlacementFeedback {
    Snapped { controller: Entity, anchor: Vec3 },
    Released { controller: Entity },
    Rotated { controller: Entity },
    Placed { controller: Entity, structure: Entity },
    Rejected { controller: Entity, blocking: usize },
    /// The candidate now uses another blueprint (see `BuildController`).
    Switched { controller: Entity },
}
