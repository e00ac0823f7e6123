// src/building/components.rs
use bevy::prelude::*;
use std::sync::Arc;

use super::catalog::StructureDef;

/// Collision category. Overlap queries filter on it so an unplaced candidate
/// never counts as an obstacle.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CollisionLayer {
    Candidate,
    Structure,
}

/// Collision sphere around the entity origin.
/// Candidates carry a disabled one; it is switched on at commit.
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct Collider {
    pub radius: f32,
    pub enabled: bool,
}

impl Collider {
    pub const fn enabled(radius: f32) -> Self {
        Self { radius, enabled: true }
    }

    pub const fn disabled(radius: f32) -> Self {
        Self { radius, enabled: false }
    }
}

/// The unplaced ghost structure owned by a controller's session.
#[derive(Component, Clone, Debug)]
pub struct Candidate {
    pub controller: Entity,
    pub blueprint: Arc<StructureDef>,
}

/// Marks a builder entity. Once the catalog is ready it receives a
/// `PlacementSession` for a candidate of `blueprint`.
#[derive(Component, Clone, Debug)]
pub struct BuildController {
    pub blueprint: String,
}

/// Box extents of the placeholder mesh child to attach.
#[derive(Component, Clone, Copy, Debug, Deref)]
pub struct VisualSize(pub Vec3);

/// Mesh child spawned under a structure or candidate root.
#[derive(Component)]
pub struct StructureVisual;
