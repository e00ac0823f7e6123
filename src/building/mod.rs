// src/building/mod.rs
//! Anchor-snapping structure placement.

pub mod catalog;
pub mod components;
pub mod controller;
pub mod core;
pub mod events;
pub mod scene;
pub mod spatial;
pub mod systems;
mod layers;
mod plugin;

pub use components::{BuildController, Candidate, Collider, CollisionLayer};
pub use controller::{PlacementSession, SnapState};
pub use events::{CommitRequested, CycleBlueprintRequested, PlacementFeedback, RotateRequested};
pub use plugin::{BuildSet, BuildingPlugin};
