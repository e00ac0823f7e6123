// src/building/core.rs
//! Structure & anchor model.
//! A placed structure advertises a snap group id and offers zero or more
//! snapping groups to its neighbours. Everything here is immutable once built.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::catalog::{AnchorDef, SnappingGroupDef, StructureDef};

/// Snapping-group identity. Matching is plain equality, no hierarchy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapGroupId(pub i32);

/// World-space point a candidate origin can lock onto, plus the orientation
/// the candidate adopts when it does.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Anchor {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Anchor {
    pub const fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    pub const fn at(position: Vec3) -> Self {
        Self { position, rotation: Quat::IDENTITY }
    }
}

impl AnchorDef {
    /// Resolve this local anchor against the pose of its owning structure.
    pub fn to_world(&self, pose: &Transform) -> Anchor {
        Anchor::new(
            pose.transform_point(self.offset),
            pose.rotation * Quat::from_rotation_y(self.yaw_degrees.to_radians()),
        )
    }
}

/// Cluster of position anchors and rotation pivots sharing one group id.
///
/// The two lists are independent: pivot `i` has nothing to do with anchor `i`.
/// Order is preserved so nearest-point ties resolve the same way every tick.
#[derive(Clone, Debug, PartialEq)]
pub struct SnappingGroup {
    group_id: SnapGroupId,
    position_anchors: Arc<[Anchor]>,
    rotation_pivots: Arc<[Vec3]>,
}

impl SnappingGroup {
    pub fn new(group_id: SnapGroupId, position_anchors: Vec<Anchor>, rotation_pivots: Vec<Vec3>) -> Self {
        Self {
            group_id,
            position_anchors: position_anchors.into(),
            rotation_pivots: rotation_pivots.into(),
        }
    }

    /// Build the world-space group for a structure placed at `pose`.
    pub fn from_def_at(def: &SnappingGroupDef, pose: &Transform) -> Self {
        Self::new(
            def.group_id,
            def.position_anchors.iter().map(|a| a.to_world(pose)).collect(),
            def.rotation_pivots.iter().map(|&p| pose.transform_point(p)).collect(),
        )
    }

    pub fn group_id(&self) -> SnapGroupId { self.group_id }
    pub fn position_anchors(&self) -> &[Anchor] { &self.position_anchors }
    pub fn rotation_pivots(&self) -> &[Vec3] { &self.rotation_pivots }

    pub fn is_empty(&self) -> bool {
        self.position_anchors.is_empty() && self.rotation_pivots.is_empty()
    }

    /// True when a candidate of `group_id` may use this group.
    #[inline]
    pub fn accepts(&self, group_id: SnapGroupId) -> bool {
        self.group_id == group_id && !self.is_empty()
    }
}

/// A placed building entity and the snapping groups it offers.
#[derive(Component, Clone, Debug, PartialEq)]
pub struct Structure {
    group_id: SnapGroupId,
    snapping_groups: Arc<[SnappingGroup]>,
}

impl Structure {
    pub fn new(group_id: SnapGroupId, snapping_groups: Vec<SnappingGroup>) -> Self {
        Self { group_id, snapping_groups: snapping_groups.into() }
    }

    /// Author the world-space anchors of `def` placed at `pose`.
    pub fn placed(def: &StructureDef, pose: &Transform) -> Self {
        Self::new(
            def.group_id,
            def.snapping_groups
                .iter()
                .map(|g| SnappingGroup::from_def_at(g, pose))
                .collect(),
        )
    }

    pub fn group_id(&self) -> SnapGroupId { self.group_id }
    pub fn snapping_groups(&self) -> &[SnappingGroup] { &self.snapping_groups }

    /// Groups a candidate of `group_id` may snap to, in authoring order.
    pub fn matching_groups(&self, group_id: SnapGroupId) -> impl Iterator<Item = &SnappingGroup> {
        self.snapping_groups.iter().filter(move |g| g.accepts(group_id))
    }
}
