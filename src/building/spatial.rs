// src/building/spatial.rs
//! Geometric lookups behind the placement controller.
//! All of them are total: empty input gives `None` / an empty result.

use bevy::prelude::*;

use super::components::CollisionLayer;
use super::core::Structure;

/// A structure returned by the broad-phase, with its world origin.
#[derive(Clone, Copy, Debug)]
pub struct StructureView<'a> {
    pub entity: Entity,
    pub origin: Vec3,
    pub structure: &'a Structure,
}

/// Broad-phase collaborator the controller queries every tick.
pub trait SpatialQuery {
    /// Entities on `layer` whose enabled collider intersects the sphere.
    fn query_overlap(&self, center: Vec3, radius: f32, layer: CollisionLayer) -> Vec<Entity>;

    /// Structure data for an entity returned by `query_overlap`.
    fn structure(&self, entity: Entity) -> Option<StructureView<'_>>;
}

/// Item whose `position` is closest to `target`.
/// Ties keep the earliest item; the input order is never rearranged.
pub fn nearest_by<T, I, F>(target: Vec3, items: I, position: F) -> Option<T>
where
    I: IntoIterator<Item = T>,
    F: Fn(&T) -> Vec3,
{
    let mut best: Option<(T, f32)> = None;
    for item in items {
        let d2 = position(&item).distance_squared(target);
        if best.as_ref().is_none_or(|(_, best_d2)| d2 < *best_d2) {
            best = Some((item, d2));
        }
    }
    best.map(|(item, _)| item)
}

pub fn nearest_point(target: Vec3, candidates: &[Vec3]) -> Option<Vec3> {
    nearest_by(target, candidates.iter().copied(), |p| *p)
}

/// Touching spheres count as overlapping.
#[inline]
pub fn spheres_overlap(a_center: Vec3, a_radius: f32, b_center: Vec3, b_radius: f32) -> bool {
    let reach = a_radius + b_radius;
    a_center.distance_squared(b_center) <= reach * reach
}

/// Nearest surface hit of a pointer ray against the ground plane (if any)
/// and the given collision spheres.
pub fn raycast_to_world<I>(ray: Ray3d, ground_height: Option<f32>, spheres: I) -> Option<Vec3>
where
    I: IntoIterator<Item = (Vec3, f32)>,
{
    let mut nearest: Option<f32> = None;
    let mut consider = |t: f32| {
        if t >= 0.0 && nearest.is_none_or(|n| t < n) {
            nearest = Some(t);
        }
    };

    if let Some(h) = ground_height {
        if let Some(t) = ray.intersect_plane(Vec3::Y * h, InfinitePlane3d::new(Vec3::Y)) {
            consider(t);
        }
    }
    for (center, radius) in spheres {
        if let Some(t) = ray_sphere(&ray, center, radius) {
            consider(t);
        }
    }

    nearest.map(|t| ray.get_point(t))
}

/// Distance along `ray` to the first sphere surface in front of the origin.
fn ray_sphere(ray: &Ray3d, center: Vec3, radius: f32) -> Option<f32> {
    let dir: Vec3 = *ray.direction;
    let oc = ray.origin - center;
    let b = oc.dot(dir);
    let c = oc.length_squared() - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }

    let root = disc.sqrt();
    let near = -b - root;
    if near >= 0.0 {
        return Some(near);
    }
    // Origin inside the sphere: exit point.
    let far = -b + root;
    (far >= 0.0).then_some(far)
}
