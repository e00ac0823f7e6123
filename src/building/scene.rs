// src/building/scene.rs
//! ECS-backed `SpatialQuery`: brute-force sphere tests over every collider.
//! Structure counts near the pointer are small, so no acceleration structure.

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use super::components::{Collider, CollisionLayer};
use super::core::Structure;
use super::spatial::{spheres_overlap, SpatialQuery, StructureView};

#[derive(SystemParam)]
pub struct SceneQuery<'w, 's> {
    colliders: Query<
        'w,
        's,
        (
            Entity,
            &'static GlobalTransform,
            &'static Collider,
            &'static CollisionLayer,
            Option<&'static Structure>,
        ),
    >,
}

impl SceneQuery<'_, '_> {
    /// Enabled structure colliders as (center, radius), for pointer hits.
    pub fn surfaces(&self) -> impl Iterator<Item = (Vec3, f32)> + '_ {
        self.colliders
            .iter()
            .filter(|(_, _, c, layer, _)| c.enabled && **layer == CollisionLayer::Structure)
            .map(|(_, tf, c, _, _)| (tf.translation(), c.radius))
    }
}

impl SpatialQuery for SceneQuery<'_, '_> {
    fn query_overlap(&self, center: Vec3, radius: f32, layer: CollisionLayer) -> Vec<Entity> {
        self.colliders
            .iter()
            .filter(|(_, tf, c, l, _)| {
                c.enabled && **l == layer && spheres_overlap(center, radius, tf.translation(), c.radius)
            })
            .map(|(e, ..)| e)
            .collect()
    }

    fn structure(&self, entity: Entity) -> Option<StructureView<'_>> {
        let (entity, tf, _, _, structure) = self.colliders.get(entity).ok()?;
        Some(StructureView { entity, origin: tf.translation(), structure: structure? })
    }
}
