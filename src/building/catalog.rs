// src/building/catalog.rs
//! Data-driven structure blueprints + loader.

use bevy::asset::{io::Reader, AssetLoader, LoadContext};
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use super::core::SnapGroupId;

// ---------- Public plugin to register asset+loader ----------

pub struct StructureCatalogAssetPlugin;

impl Plugin for StructureCatalogAssetPlugin {
    fn build(&self, app: &mut App) {
        app.init_asset::<StructureCatalog>()
            .register_asset_loader(StructureCatalogLoader);
    }
}

// ---------- Blueprint definitions (data form) ----------

/// Position anchor in the owning structure's local space.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnchorDef {
    pub offset: Vec3,
    /// Yaw (degrees) added on top of the structure's rotation when snapping.
    #[serde(default)]
    pub yaw_degrees: f32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SnappingGroupDef {
    pub group_id: SnapGroupId,
    #[serde(default)]
    pub position_anchors: Vec<AnchorDef>,
    /// Local-space pivots for the rotate command.
    #[serde(default)]
    pub rotation_pivots: Vec<Vec3>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StructureDef {
    /// Unique human-readable name (used for lookup).
    pub name: String,

    /// Group this structure snaps with when it is the candidate.
    pub group_id: SnapGroupId,

    /// Box extents for the placeholder visual.
    #[serde(default = "default_size")]
    pub size: Vec3,

    /// Collision sphere used by overlap checks and pointer hits.
    #[serde(default = "default_collider_radius")]
    pub collider_radius: f32,

    /// Groups offered to neighbours once placed.
    #[serde(default)]
    pub snapping_groups: Vec<SnappingGroupDef>,
}

fn default_size() -> Vec3 {
    Vec3::new(4.0, 0.5, 4.0)
}
fn default_collider_radius() -> f32 {
    1.5
}

// ---------- Runtime catalog asset ----------

#[derive(Asset, TypePath, Clone, Debug)]
pub struct StructureCatalog {
    /// Ordered as authored. Shared so candidates can hold their blueprint.
    pub blueprints: Vec<Arc<StructureDef>>,
    /// Name → index for quick lookups.
    pub name_to_index: HashMap<String, usize>,
}

impl StructureCatalog {
    pub fn from_defs(defs: Vec<StructureDef>) -> Result<Self, CatalogLoadError> {
        if defs.is_empty() {
            return Err(CatalogLoadError::Empty);
        }

        let mut name_to_index = HashMap::with_capacity(defs.len());
        for (i, def) in defs.iter().enumerate() {
            if let Some(prev) = name_to_index.insert(def.name.clone(), i) {
                return Err(CatalogLoadError::DuplicateName {
                    name: def.name.clone(),
                    first: prev,
                    second: i,
                });
            }
        }

        Ok(Self { blueprints: defs.into_iter().map(Arc::new).collect(), name_to_index })
    }

    pub fn from_ron_bytes(bytes: &[u8]) -> Result<Self, CatalogLoadError> {
        let defs: Vec<StructureDef> =
            ron::de::from_bytes(bytes).map_err(|e| CatalogLoadError::Ron(e.to_string()))?;
        Self::from_defs(defs)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<StructureDef>> {
        self.name_to_index.get(name).and_then(|&i| self.blueprints.get(i))
    }

    /// Blueprint after `name` in authoring order, wrapping around. Unknown
    /// names start from the first entry.
    pub fn next_after(&self, name: &str) -> Option<&Arc<StructureDef>> {
        if self.blueprints.is_empty() {
            return None;
        }
        let next = self.name_to_index.get(name).map_or(0, |&i| (i + 1) % self.blueprints.len());
        self.blueprints.get(next)
    }
}

// ---------- Asset loader for `.structures.ron` ----------

#[derive(Default)]
pub struct StructureCatalogLoader;

impl AssetLoader for StructureCatalogLoader {
    type Asset = StructureCatalog;
    type Settings = ();
    type Error = CatalogLoadError;

    fn extensions(&self) -> &[&str] {
        &["structures.ron"]
    }

    async fn load(
        &self,
        reader: &mut dyn Reader,
        _settings: &Self::Settings,
        _load_context: &mut LoadContext<'_>,
    ) -> Result<Self::Asset, Self::Error> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).await?;
        StructureCatalog::from_ron_bytes(&bytes)
    }
}

// ---------- Loader errors ----------

#[derive(thiserror::Error, Debug)]
pub enum CatalogLoadError {
    #[error("I/O while reading structure catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON parse error: {0}")]
    Ron(String),
    #[error("Duplicate blueprint name '{name}' (first idx {first}, second idx {second})")]
    DuplicateName { name: String, first: usize, second: usize },
    #[error("structure catalog has no blueprints")]
    Empty,
}
