// src/scenery.rs
//! Starter structures laid out on a jittered grid (deterministic per seed),
//! so a fresh scene has something to snap onto.

use bevy::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::f32::consts::FRAC_PI_2;

use crate::building::catalog::StructureCatalog;
use crate::building::systems::{spawn_structure, StructureCatalogHandle};
use crate::settings::BuildingSettings;

/// Cell side of the starter grid (meters).
pub const SCENERY_SPACING: f32 = 16.0;

/// Poses for `count` starter structures. Yaw is a random quarter turn;
/// positions jitter up to a quarter cell around each cell center.
pub fn starter_layout(seed: u64, count: usize, spacing: f32, ground: f32) -> Vec<Transform> {
    if count == 0 {
        return Vec::new();
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed ^ 0x5EED_B01D_0000_0001u64);
    let side = (count as f32).sqrt().ceil() as usize;
    let half = (side as f32 - 1.0) * 0.5;
    let jitter = spacing * 0.25;

    let mut out = Vec::with_capacity(count);
    'outer: for j in 0..side {
        for i in 0..side {
            if out.len() >= count { break 'outer; }

            let cx = (i as f32 - half) * spacing;
            let cz = (j as f32 - half) * spacing;
            let jx = (rng.random::<f32>() - 0.5) * 2.0 * jitter;
            let jz = (rng.random::<f32>() - 0.5) * 2.0 * jitter;
            let quarter_turns = rng.random_range(0..4u32);

            out.push(
                Transform::from_xyz(cx + jx, ground, cz + jz)
                    .with_rotation(Quat::from_rotation_y(quarter_turns as f32 * FRAC_PI_2)),
            );
        }
    }
    out
}

/// Update: once the catalog is in, drop the starter structures.
pub fn spawn_starter_scenery(
    mut commands: Commands,
    settings: Res<BuildingSettings>,
    handle: Res<StructureCatalogHandle>,
    catalogs: Res<Assets<StructureCatalog>>,
    mut done: Local<bool>,
) {
    if *done { return; }
    let Some(catalog) = catalogs.get(&handle.0) else { return; };
    *done = true;

    let Some(blueprint) = catalog.get(&settings.starting_blueprint) else {
        warn!("Scenery: unknown blueprint '{}', skipping", settings.starting_blueprint);
        return;
    };

    let ground = settings.ground_height.unwrap_or(0.0);
    let poses = starter_layout(settings.scenery_seed, settings.scenery_count, SCENERY_SPACING, ground);
    for pose in &poses {
        spawn_structure(&mut commands, blueprint, *pose);
    }
    info!("Scenery: spawned {} '{}' (seed {})", poses.len(), blueprint.name, settings.scenery_seed);
}
