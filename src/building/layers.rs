// src/building/layers.rs
use bevy::prelude::*;

use super::components::CollisionLayer;

/// Tag `root` and every descendant with `layer`.
pub fn tag_hierarchy(
    commands: &mut Commands,
    children: &Query<&Children>,
    root: Entity,
    layer: CollisionLayer,
) {
    commands.entity(root).insert(layer);
    if let Ok(kids) = children.get(root) {
        let kids: &[Entity] = kids;
        for &child in kids {
            tag_hierarchy(commands, children, child, layer);
        }
    }
}
