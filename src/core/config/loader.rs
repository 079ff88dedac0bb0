#![allow(clippy::result_large_err)]

use super::PipelineConfig;
use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use std::env;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "transit.toml";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config from workspace root (workspace/transit.toml)
    /// Environment variables override config file values
    pub fn load_from_workspace(workspace_path: &Path) -> Result<PipelineConfig, AppError> {
        let config_path = workspace_path.join(CONFIG_FILE_NAME);
        let config_file = Self::load_from_file(&config_path)?;

        let mut config = config_file.unwrap_or_default();
        Self::apply_env_overrides(&mut config);

        Ok(config)
    }

    /// Load config from an explicit path, which must exist
    pub fn load_explicit(path: &Path) -> Result<PipelineConfig, AppError> {
        let mut config = Self::load_from_file(path)?.ok_or_else(|| {
            AppError::new(
                ErrorCategory::ConfigError,
                format!("Config file {} does not exist", path.display()),
            )
            .with_code("CFG-001")
        })?;
        Self::apply_env_overrides(&mut config);
        Ok(config)
    }

    /// Load config from specific file path
    /// Returns Ok(None) if file doesn't exist
    pub fn load_from_file(path: &Path) -> Result<Option<PipelineConfig>, AppError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::new(
                ErrorCategory::IoError,
                format!("Failed to read config file {}: {}", path.display(), e),
            )
            .with_code("CFG-002")
        })?;

        let config: PipelineConfig = toml::from_str(&content).map_err(|e| {
            AppError::new(
                ErrorCategory::ConfigError,
                format!("Failed to parse config file {}: {}", path.display(), e),
            )
            .with_code("CFG-003")
        })?;

        Ok(Some(config))
    }

    /// Apply environment variable overrides to the configuration
    /// Values that fail to parse are ignored
    fn apply_env_overrides(config: &mut PipelineConfig) {
        if let Ok(dir) = env::var("TRANSIT_INPUT_DIR") {
            config.paths.input_dir = PathBuf::from(dir);
        }

        if let Ok(dir) = env::var("TRANSIT_CANONICAL_DIR") {
            config.paths.canonical_dir = PathBuf::from(dir);
        }

        if let Ok(dir) = env::var("TRANSIT_GOLD_DIR") {
            config.paths.gold_dir = PathBuf::from(dir);
        }

        if let Ok(key_space_str) = env::var("TRANSIT_KEY_SPACE") {
            if let Ok(key_space) = key_space_str.trim().parse::<u64>() {
                config.keys.key_space = key_space;
            }
        }

        if let Ok(fail_str) = env::var("TRANSIT_FAIL_ON_COLLISION") {
            if let Ok(fail) = fail_str.trim().parse::<bool>() {
                config.keys.fail_on_collision = fail;
            }
        }
    }

    /// Get documentation for supported environment variables
    pub fn env_var_documentation() -> &'static [&'static str] {
        &[
            "TRANSIT_INPUT_DIR - Override the raw extract directory (default: data/bronze)",
            "TRANSIT_CANONICAL_DIR - Override the canonical snapshot directory (default: data/silver)",
            "TRANSIT_GOLD_DIR - Override the dimension/fact directory (default: data/gold)",
            "TRANSIT_KEY_SPACE - Override the surrogate key modulus (default: 100000000)",
            "TRANSIT_FAIL_ON_COLLISION - Abort when surrogate keys collide (true/false, default: false)",
        ]
    }
}
