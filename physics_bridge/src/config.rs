//! Configuration types for the physics bridge

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// What `jump(None)` does on a built character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroJumpBehavior {
    /// Call the native jump with a zero vector; the backend then jumps with
    /// the configured jump speed along the up axis.
    #[default]
    PassZeroVector,
    /// Do not call the native jump at all.
    Skip,
}

/// Errors raised while loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Simulation-wide settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Fixed timestep in seconds
    pub fixed_timestep: f32,
    /// Maximum fixed steps per frame, at least 1
    pub max_substeps: u32,
    /// World gravity in engine space
    pub gravity: Vec3,
    /// Height of the reference backend's ground plane, if any
    pub ground_height: Option<f32>,
    pub zero_jump: ZeroJumpBehavior,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            fixed_timestep: 1.0 / 60.0,
            max_substeps: 1,
            gravity: Vec3::new(0.0, -10.0, 0.0),
            ground_height: None,
            zero_jump: ZeroJumpBehavior::default(),
        }
    }
}

impl PhysicsConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_json::from_str(json)?;
        config.max_substeps = config.max_substeps.max(1);
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&contents)?;
        debug!(path = ?path, config = ?config, "Loaded physics config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = PhysicsConfig::default();
        assert!((config.fixed_timestep - 1.0 / 60.0).abs() < 1e-9);
        assert_eq!(config.max_substeps, 1);
        assert_eq!(config.gravity, Vec3::new(0.0, -10.0, 0.0));
        assert_eq!(config.ground_height, None);
        assert_eq!(config.zero_jump, ZeroJumpBehavior::PassZeroVector);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config =
            PhysicsConfig::from_json_str(r#"{ "ground_height": 0.0, "zero_jump": "skip" }"#)
                .unwrap();
        assert_eq!(config.ground_height, Some(0.0));
        assert_eq!(config.zero_jump, ZeroJumpBehavior::Skip);
        assert_eq!(config.max_substeps, 1);
    }

    #[test]
    fn test_substeps_clamped() {
        let config = PhysicsConfig::from_json_str(r#"{ "max_substeps": 0 }"#).unwrap();
        assert_eq!(config.max_substeps, 1);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{ "gravity": [0.0, -20.0, 0.0], "max_substeps": 4 }}"#).unwrap();

        let config = PhysicsConfig::load(file.path()).unwrap();
        assert_eq!(config.gravity, Vec3::new(0.0, -20.0, 0.0));
        assert_eq!(config.max_substeps, 4);
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            PhysicsConfig::load(dir.path().join("missing.json")),
            Err(ConfigError::Io(_))
        ));

        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            PhysicsConfig::load(file.path()),
            Err(ConfigError::Json(_))
        ));
    }
}
