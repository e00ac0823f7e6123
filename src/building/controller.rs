// src/building/controller.rs
//! Placement session: the per-tick snap state machine for one candidate.
//!
//! The session owns the candidate pose while it is unplaced. Each tick it is
//! handed the world-space target under the pointer and a `SpatialQuery`
//! over the scene, and decides whether the candidate follows the target
//! (`Free`) or stays pinned to an anchor on the closest structure (`Snapped`).

use bevy::prelude::*;

use super::components::CollisionLayer;
use super::core::{Anchor, SnapGroupId};
use super::spatial::{nearest_by, nearest_point, SpatialQuery};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SnapState {
    #[default]
    Free,
    Snapped,
}

/// What a tick did to the candidate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TickOutcome {
    /// No target under the pointer; pose unchanged.
    Held,
    /// Free: the candidate sits on the raw target.
    Tracking,
    /// Snapped to `anchor` this tick. `reattached` is set when an existing
    /// snap was invalidated because the nearest anchor moved.
    Attached { anchor: Anchor, reattached: bool },
    /// Still pinned to the active anchor.
    Pinned,
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitRejected {
    #[error("placement blocked by {count} overlapping structure(s)")]
    Blocked { count: usize },
}

/// The candidate handed over to the scene by a successful commit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacedCandidate {
    pub entity: Entity,
    pub pose: Transform,
}

#[derive(Component, Clone, Debug)]
pub struct PlacementSession {
    candidate: Entity,
    group_id: SnapGroupId,
    pose: Transform,
    view_rotation: Quat,
    snap_state: SnapState,
    active_snap: Option<Anchor>,
    active_pivot: Option<Vec3>,
}

impl PlacementSession {
    pub fn new(candidate: Entity, group_id: SnapGroupId, pose: Transform) -> Self {
        Self {
            candidate,
            group_id,
            pose,
            view_rotation: pose.rotation,
            snap_state: SnapState::Free,
            active_snap: None,
            active_pivot: None,
        }
    }

    pub fn candidate(&self) -> Entity { self.candidate }
    pub fn group_id(&self) -> SnapGroupId { self.group_id }
    pub fn pose(&self) -> &Transform { &self.pose }
    pub fn snap_state(&self) -> SnapState { self.snap_state }
    pub fn active_snap(&self) -> Option<Anchor> { self.active_snap }
    pub fn active_pivot(&self) -> Option<Vec3> { self.active_pivot }

    /// Rotation the candidate takes while free (the builder's facing).
    pub fn set_view_rotation(&mut self, rotation: Quat) {
        self.view_rotation = rotation;
    }

    pub fn tick<Q>(&mut self, target: Option<Vec3>, scene: &Q, search_radius: f32) -> TickOutcome
    where
        Q: SpatialQuery + ?Sized,
    {
        // 1) Nothing under the pointer: hold
        let Some(target) = target else {
            return TickOutcome::Held;
        };

        // 2) Closest structure around the target, never our own candidate
        let nearby = scene
            .query_overlap(target, search_radius, CollisionLayer::Structure)
            .into_iter()
            .filter(|&e| e != self.candidate)
            .filter_map(|e| scene.structure(e));
        let Some(closest) = nearest_by(target, nearby, |view| view.origin) else {
            return self.release(target);
        };

        // 3) Nearest anchor + pivot per matching group; last group wins
        let was_snapped = self.snap_state == SnapState::Snapped;
        let mut matched = false;
        for group in closest.structure.matching_groups(self.group_id) {
            let new_snap = nearest_by(target, group.position_anchors().iter().copied(), |a| a.position);
            let new_pivot = nearest_point(target, group.rotation_pivots());

            if let (Some(old), Some(new)) = (self.active_snap, new_snap) {
                if old.position != new.position {
                    self.snap_state = SnapState::Free;
                }
            }
            self.active_snap = new_snap;
            self.active_pivot = new_pivot;
            matched = true;
        }

        // 4) No usable anchor: back to free
        let anchor = match (matched, self.active_snap) {
            (true, Some(anchor)) => anchor,
            _ => return self.release(target),
        };

        // 5) Pin (or re-pin after a forced release)
        if self.snap_state == SnapState::Snapped {
            return TickOutcome::Pinned;
        }
        self.pose.translation = anchor.position;
        self.pose.rotation = anchor.rotation;
        self.snap_state = SnapState::Snapped;
        TickOutcome::Attached { anchor, reattached: was_snapped }
    }

    /// Turn the candidate by `step` radians about its own up axis through the
    /// active pivot. Returns false (and does nothing) without a pivot.
    pub fn rotate(&mut self, step: f32) -> bool {
        let Some(pivot) = self.active_pivot else {
            return false;
        };
        let up = self.pose.up();
        self.pose.rotate_around(pivot, Quat::from_axis_angle(*up, step));
        true
    }

    /// Validate and hand the candidate over to the scene.
    ///
    /// On rejection nothing changes. On success `spawn_next` is asked for the
    /// replacement candidate and the session restarts `Free` around it.
    pub fn commit<Q>(
        &mut self,
        scene: &Q,
        check_radius: f32,
        spawn_next: impl FnOnce(&Transform) -> Entity,
    ) -> Result<PlacedCandidate, CommitRejected>
    where
        Q: SpatialQuery + ?Sized,
    {
        let count = scene
            .query_overlap(self.pose.translation, check_radius, CollisionLayer::Structure)
            .into_iter()
            .filter(|&e| e != self.candidate)
            .count();
        if count > 0 {
            return Err(CommitRejected::Blocked { count });
        }

        let placed = PlacedCandidate { entity: self.candidate, pose: self.pose };
        self.candidate = spawn_next(&self.pose);
        self.snap_state = SnapState::Free;
        self.active_snap = None;
        self.active_pivot = None;
        Ok(placed)
    }

    /// Replace the candidate with one of another blueprint (group). The pose is
    /// kept; anything learned about the old group's anchors is dropped.
    pub fn swap_candidate(&mut self, candidate: Entity, group_id: SnapGroupId) {
        self.candidate = candidate;
        self.group_id = group_id;
        self.snap_state = SnapState::Free;
        self.active_snap = None;
        self.active_pivot = None;
    }

    fn release(&mut self, target: Vec3) -> TickOutcome {
        self.snap_state = SnapState::Free;
        self.active_snap = None;
        self.active_pivot = None;
        self.pose.translation = target;
        self.pose.rotation = self.view_rotation;
        TickOutcome::Tracking
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::building::catalog::StructureCatalog;
    use crate::building::core::{SnappingGroup, Structure};
    use crate::settings::BuildingSettings;
    use crate::building::spatial::{spheres_overlap, StructureView};
    use std::f32::consts::FRAC_PI_2;

    struct Body {
        entity: Entity,
        origin: Vec3,
        radius: f32,
        layer: CollisionLayer,
        structure: Option<Structure>,
    }

    /// In-memory scene standing in for the ECS broad-phase.
    #[derive(Default)]
    struct TestScene {
        bodies: Vec<Body>,
    }

    impl TestScene {
        fn with_structure(mut self, id: u32, origin: Vec3, radius: f32, structure: Structure) -> Self {
            self.bodies.push(Body {
                entity: Entity::from_raw(id),
                origin,
                radius,
                layer: CollisionLayer::Structure,
                structure: Some(structure),
            });
            self
        }

        fn with_body(mut self, id: u32, origin: Vec3, radius: f32, layer: CollisionLayer) -> Self {
            self.bodies.push(Body { entity: Entity::from_raw(id), origin, radius, layer, structure: None });
            self
        }
    }

    impl SpatialQuery for TestScene {
        fn query_overlap(&self, center: Vec3, radius: f32, layer: CollisionLayer) -> Vec<Entity> {
            self.bodies
                .iter()
                .filter(|b| b.layer == layer && spheres_overlap(center, radius, b.origin, b.radius))
                .map(|b| b.entity)
                .collect()
        }

        fn structure(&self, entity: Entity) -> Option<StructureView<'_>> {
            let body = self.bodies.iter().find(|b| b.entity == entity)?;
            Some(StructureView { entity, origin: body.origin, structure: body.structure.as_ref()? })
        }
    }

    const CANDIDATE: u32 = 100;
    const SEARCH: f32 = 5.0;
    const CHECK: f32 = 1.0;

    fn session(group: i32) -> PlacementSession {
        PlacementSession::new(Entity::from_raw(CANDIDATE), SnapGroupId(group), Transform::IDENTITY)
    }

    fn single_anchor(group: i32, at: Vec3) -> Structure {
        Structure::new(
            SnapGroupId(group),
            vec![SnappingGroup::new(SnapGroupId(group), vec![Anchor::at(at)], vec![at])],
        )
    }

    fn two_anchor_scene() -> TestScene {
        let group = SnappingGroup::new(
            SnapGroupId(1),
            vec![Anchor::at(Vec3::new(0.0, 0.0, 5.0)), Anchor::at(Vec3::new(0.0, 0.0, -5.0))],
            vec![Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -5.0)],
        );
        TestScene::default().with_structure(1, Vec3::ZERO, 1.0, Structure::new(SnapGroupId(1), vec![group]))
    }

    #[test]
    fn snaps_to_matching_anchor() {
        let scene = TestScene::default().with_structure(1, Vec3::ZERO, 1.0, single_anchor(1, Vec3::new(0.0, 0.0, 5.0)));
        let mut s = session(1);

        let outcome = s.tick(Some(Vec3::new(0.0, 0.0, 4.5)), &scene, SEARCH);

        assert!(matches!(outcome, TickOutcome::Attached { reattached: false, .. }));
        assert_eq!(s.snap_state(), SnapState::Snapped);
        assert_eq!(s.pose().translation, Vec3::new(0.0, 0.0, 5.0));
        assert_eq!(s.active_pivot(), Some(Vec3::new(0.0, 0.0, 5.0)));
    }

    #[test]
    fn mismatched_group_tracks_target() {
        let scene = TestScene::default().with_structure(1, Vec3::ZERO, 1.0, single_anchor(1, Vec3::new(0.0, 0.0, 5.0)));
        let mut s = session(2);
        let target = Vec3::new(0.0, 0.0, 4.5);

        assert_eq!(s.tick(Some(target), &scene, SEARCH), TickOutcome::Tracking);
        assert_eq!(s.snap_state(), SnapState::Free);
        assert_eq!(s.pose().translation, target);
        assert_eq!(s.active_snap(), None);
    }

    #[test]
    fn nothing_nearby_tracks_with_view_rotation() {
        let scene = TestScene::default();
        let mut s = session(1);
        let facing = Quat::from_rotation_y(0.3);
        s.set_view_rotation(facing);

        assert_eq!(s.tick(Some(Vec3::new(7.0, 0.0, 1.0)), &scene, SEARCH), TickOutcome::Tracking);
        assert_eq!(s.pose().translation, Vec3::new(7.0, 0.0, 1.0));
        assert_eq!(s.pose().rotation, facing);
    }

    #[test]
    fn no_target_holds_pose() {
        let scene = TestScene::default().with_structure(1, Vec3::ZERO, 1.0, single_anchor(1, Vec3::new(0.0, 0.0, 5.0)));
        let mut s = session(1);
        s.tick(Some(Vec3::new(0.0, 0.0, 4.5)), &scene, SEARCH);
        let before = *s.pose();

        assert_eq!(s.tick(None, &scene, SEARCH), TickOutcome::Held);
        assert_eq!(*s.pose(), before);
        assert_eq!(s.snap_state(), SnapState::Snapped);
    }

    #[test]
    fn snapped_pose_stays_pinned_while_pointer_moves() {
        let scene = two_anchor_scene();
        let mut s = session(1);
        s.tick(Some(Vec3::new(0.0, 0.0, 4.0)), &scene, SEARCH);

        // Still nearest to the same anchor.
        assert_eq!(s.tick(Some(Vec3::new(1.0, 0.0, 3.0)), &scene, SEARCH), TickOutcome::Pinned);
        assert_eq!(s.pose().translation, Vec3::new(0.0, 0.0, 5.0));
    }

    #[test]
    fn anchor_change_forces_resnap_in_same_tick() {
        let scene = two_anchor_scene();
        let mut s = session(1);
        s.tick(Some(Vec3::new(0.0, 0.0, 4.0)), &scene, SEARCH);
        assert_eq!(s.snap_state(), SnapState::Snapped);

        let outcome = s.tick(Some(Vec3::new(0.0, 0.0, -4.0)), &scene, SEARCH);

        match outcome {
            TickOutcome::Attached { anchor, reattached } => {
                assert!(reattached);
                assert_eq!(anchor.position, Vec3::new(0.0, 0.0, -5.0));
            }
            other => panic!("expected re-attach, got {other:?}"),
        }
        assert_eq!(s.snap_state(), SnapState::Snapped);
        assert_eq!(s.pose().translation, Vec3::new(0.0, 0.0, -5.0));
    }

    #[test]
    fn closest_structure_by_origin_decides() {
        let scene = TestScene::default()
            .with_structure(1, Vec3::new(-3.0, 0.0, 0.0), 1.0, single_anchor(1, Vec3::new(-3.0, 0.0, 2.0)))
            .with_structure(2, Vec3::new(3.0, 0.0, 0.0), 1.0, single_anchor(1, Vec3::new(3.0, 0.0, 2.0)));
        let mut s = session(1);

        s.tick(Some(Vec3::new(2.0, 0.0, 0.0)), &scene, SEARCH);
        assert_eq!(s.pose().translation, Vec3::new(3.0, 0.0, 2.0));
    }

    #[test]
    fn last_matching_group_wins() {
        let structure = Structure::new(
            SnapGroupId(1),
            vec![
                SnappingGroup::new(SnapGroupId(1), vec![Anchor::at(Vec3::new(0.0, 0.0, 1.0))], vec![]),
                SnappingGroup::new(SnapGroupId(1), vec![Anchor::at(Vec3::new(0.0, 0.0, 3.0))], vec![]),
            ],
        );
        let scene = TestScene::default().with_structure(1, Vec3::ZERO, 1.0, structure);
        let mut s = session(1);

        s.tick(Some(Vec3::new(0.0, 0.0, 1.0)), &scene, SEARCH);
        assert_eq!(s.pose().translation, Vec3::new(0.0, 0.0, 3.0));
    }

    #[test]
    fn candidate_never_snaps_to_itself() {
        let scene = TestScene::default().with_structure(CANDIDATE, Vec3::ZERO, 1.0, single_anchor(1, Vec3::Z));
        let mut s = session(1);

        assert_eq!(s.tick(Some(Vec3::ZERO), &scene, SEARCH), TickOutcome::Tracking);
    }

    #[test]
    fn anchor_rotation_is_adopted_on_snap() {
        let rotation = Quat::from_rotation_y(FRAC_PI_2);
        let structure = Structure::new(
            SnapGroupId(1),
            vec![SnappingGroup::new(SnapGroupId(1), vec![Anchor::new(Vec3::Z, rotation)], vec![])],
        );
        let scene = TestScene::default().with_structure(1, Vec3::ZERO, 1.0, structure);
        let mut s = session(1);

        s.tick(Some(Vec3::Z), &scene, SEARCH);
        assert_eq!(s.pose().rotation, rotation);
    }

    #[test]
    fn rotate_without_pivot_is_noop() {
        let mut s = session(1);
        s.tick(Some(Vec3::new(20.0, 0.0, 0.0)), &TestScene::default(), SEARCH);
        let before = *s.pose();

        assert!(!s.rotate(FRAC_PI_2));
        assert_eq!(*s.pose(), before);
    }

    #[test]
    fn rotate_turns_about_pivot() {
        let structure = Structure::new(
            SnapGroupId(1),
            vec![SnappingGroup::new(
                SnapGroupId(1),
                vec![Anchor::at(Vec3::new(2.0, 0.0, 0.0))],
                vec![Vec3::ZERO],
            )],
        );
        let scene = TestScene::default().with_structure(1, Vec3::ZERO, 1.0, structure);
        let mut s = session(1);
        s.tick(Some(Vec3::new(2.0, 0.0, 0.0)), &scene, SEARCH);

        assert!(s.rotate(FRAC_PI_2));
        assert!(s.pose().translation.abs_diff_eq(Vec3::new(0.0, 0.0, -2.0), 1e-4));
        assert!(s.pose().rotation.abs_diff_eq(Quat::from_rotation_y(FRAC_PI_2), 1e-5));
        // Rotation is not undone by the next tick while the snap holds.
        assert_eq!(s.tick(Some(Vec3::new(2.0, 0.0, 0.0)), &scene, SEARCH), TickOutcome::Pinned);
        assert!(s.pose().translation.abs_diff_eq(Vec3::new(0.0, 0.0, -2.0), 1e-4));
    }

    #[test]
    fn blocked_commit_changes_nothing() {
        let scene = TestScene::default().with_body(7, Vec3::new(0.5, 0.0, 0.0), 0.5, CollisionLayer::Structure);
        let mut s = session(1);
        s.tick(Some(Vec3::ZERO), &TestScene::default(), SEARCH);
        let before = s.clone();
        let mut spawned = false;

        let result = s.commit(&scene, CHECK, |_| {
            spawned = true;
            Entity::from_raw(200)
        });

        assert_eq!(result, Err(CommitRejected::Blocked { count: 1 }));
        assert!(!spawned);
        assert_eq!(s.candidate(), before.candidate());
        assert_eq!(*s.pose(), *before.pose());
    }

    #[test]
    fn clear_commit_hands_over_and_restarts_free() {
        let scene = TestScene::default()
            .with_structure(1, Vec3::ZERO, 1.0, single_anchor(1, Vec3::new(0.0, 0.0, 5.0)))
            .with_body(9, Vec3::new(0.0, 0.0, 5.0), 1.0, CollisionLayer::Candidate);
        let mut s = session(1);
        s.tick(Some(Vec3::new(0.0, 0.0, 4.5)), &scene, SEARCH);

        let placed = s.commit(&scene, CHECK, |_| Entity::from_raw(200)).unwrap();

        assert_eq!(placed.entity, Entity::from_raw(CANDIDATE));
        assert_eq!(placed.pose.translation, Vec3::new(0.0, 0.0, 5.0));
        assert_eq!(s.candidate(), Entity::from_raw(200));
        assert_eq!(s.snap_state(), SnapState::Free);
        assert_eq!(s.active_snap(), None);
        assert_eq!(s.active_pivot(), None);
    }

    #[test]
    fn swapping_candidate_starts_over_free() {
        let scene = TestScene::default().with_structure(1, Vec3::ZERO, 1.0, single_anchor(1, Vec3::new(0.0, 0.0, 5.0)));
        let mut s = session(1);
        s.tick(Some(Vec3::new(0.0, 0.0, 4.5)), &scene, SEARCH);
        let pose = *s.pose();

        s.swap_candidate(Entity::from_raw(300), SnapGroupId(2));

        assert_eq!(s.candidate(), Entity::from_raw(300));
        assert_eq!(s.group_id(), SnapGroupId(2));
        assert_eq!(s.snap_state(), SnapState::Free);
        assert_eq!(s.active_snap(), None);
        assert_eq!(s.active_pivot(), None);
        assert_eq!(*s.pose(), pose);
        // The group-1 anchor no longer applies.
        assert_eq!(s.tick(Some(Vec3::new(0.0, 0.0, 4.5)), &scene, SEARCH), TickOutcome::Tracking);
    }

    #[test]
    fn shipped_walls_commit_on_every_foundation_edge() {
        let catalog = StructureCatalog::from_ron_bytes(include_bytes!(
            "../../assets/structures/default.structures.ron"
        ))
        .unwrap();
        let settings = BuildingSettings::default();
        let foundation = catalog.get("foundation").unwrap();
        let wall = catalog.get("wall").unwrap();
        let placed = Structure::placed(foundation, &Transform::IDENTITY);
        let edges: Vec<Anchor> = placed
            .matching_groups(wall.group_id)
            .flat_map(|g| g.position_anchors().iter().copied())
            .collect();
        assert_eq!(edges.len(), 4);
        let scene = TestScene::default().with_structure(1, Vec3::ZERO, foundation.collider_radius, placed);

        for edge in edges {
            let mut s = PlacementSession::new(Entity::from_raw(CANDIDATE), wall.group_id, Transform::IDENTITY);
            let near_edge = Vec3::new(edge.position.x * 1.2, 0.0, edge.position.z * 1.2);

            let outcome = s.tick(Some(near_edge), &scene, settings.snap_search_radius);
            assert!(matches!(outcome, TickOutcome::Attached { .. }), "no snap near {near_edge}");
            assert!(s.pose().translation.abs_diff_eq(edge.position, 1e-5));

            let committed = s.commit(&scene, settings.placement_check_radius, |_| Entity::from_raw(200));
            assert!(committed.is_ok(), "wall at {} blocked: {committed:?}", edge.position);
        }
    }

    #[test]
    fn commit_error_message_counts_blockers() {
        let err = CommitRejected::Blocked { count: 2 };
        assert_eq!(err.to_string(), "placement blocked by 2 overlapping structure(s)");
    }
}
