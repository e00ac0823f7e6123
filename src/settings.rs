// src/settings.rs
//! Tunables for the building feature, read from a RON file at startup.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Resource, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildingSettings {
    /// Radius around the pointer target searched for structures to snap to.
    pub snap_search_radius: f32,
    /// Radius around the candidate origin that must be free of structures.
    pub placement_check_radius: f32,
    pub rotate_step_degrees: f32,
    /// Height of the ground plane the pointer ray lands on; `None` = no ground.
    pub ground_height: Option<f32>,
    /// Catalog asset path, relative to `assets/`.
    pub catalog_path: String,
    pub starting_blueprint: String,
    pub scenery_seed: u64,
    pub scenery_count: usize,
}

impl Default for BuildingSettings {
    fn default() -> Self {
        Self {
            snap_search_radius: 5.0,
            placement_check_radius: 1.0,
            rotate_step_degrees: 90.0,
            ground_height: Some(0.0),
            catalog_path: "structures/default.structures.ron".to_string(),
            starting_blueprint: "foundation".to_string(),
            scenery_seed: 1337,
            scenery_count: 4,
        }
    }
}

impl BuildingSettings {
    pub fn from_ron_str(src: &str) -> Result<Self, SettingsError> {
        ron::from_str(src).map_err(|e| SettingsError::Ron(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let src = std::fs::read_to_string(path)?;
        Self::from_ron_str(&src)
    }

    /// Missing file → defaults with a warning; broken file → defaults with an error log.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(settings) => {
                info!("Building: settings loaded from '{}'", path.display());
                settings
            }
            Err(SettingsError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Building: no settings at '{}', using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                error!("Building: {e}; using defaults");
                Self::default()
            }
        }
    }

    #[inline]
    pub fn rotate_step(&self) -> f32 {
        self.rotate_step_degrees.to_radians()
    }
}

#[derive(thiserror::Error, Debug)]
pub enum SettingsError {
    #[error("I/O while reading settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON parse error in settings: {0}")]
    Ron(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let s = BuildingSettings::from_ron_str("(snap_search_radius: 8.0, ground_height: None)").unwrap();
        assert_eq!(s.snap_search_radius, 8.0);
        assert_eq!(s.ground_height, None);
        assert_eq!(s.placement_check_radius, 1.0);
        assert_eq!(s.starting_blueprint, "foundation");
    }

    #[test]
    fn empty_struct_is_default() {
        assert_eq!(BuildingSettings::from_ron_str("()").unwrap(), BuildingSettings::default());
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(matches!(
            BuildingSettings::from_ron_str("(snap_search_radius: \"far\")"),
            Err(SettingsError::Ron(_))
        ));
    }

    #[test]
    fn missing_file_falls_back() {
        let s = BuildingSettings::load_or_default("does/not/exist/building.ron");
        assert_eq!(s, BuildingSettings::default());
    }

    #[test]
    fn default_step_is_quarter_turn() {
        let step = BuildingSettings::default().rotate_step();
        assert!((step - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
    }
}
