//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading engine
//! configuration from YAML files.

use std::fs;
use std::path::Path;

use crate::error::{EngineError, EngineResult};
use crate::models::LeaveTemplate;

use super::types::{BusinessConfig, Defaults, EngineConfig, FineConfig};

/// Loads and provides access to the engine configuration.
///
/// The `ConfigLoader` reads YAML configuration files from a directory.
///
/// # Directory Structure
///
/// ```text
/// config/default/
/// ├── business.yaml   # timezone, shift and half-day settings
/// ├── fines.yaml      # fine method and override rules
/// └── leave.yaml      # leave template (per-type limits, carry-forward)
/// ```
///
/// # Example
///
/// ```no_run
/// use leave_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/default").unwrap();
/// let config = loader.config();
/// assert!(config.fines.enabled);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: EngineConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration directory (e.g., "./config/default")
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` instance on success, or an error if any
    /// required file is missing or contains invalid YAML.
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let business_path = path.join("business.yaml");
        let business = Self::load_yaml::<BusinessConfig>(&business_path)?;

        let fines_path = path.join("fines.yaml");
        let fines = Self::load_yaml::<FineConfig>(&fines_path)?;

        let leave_path = path.join("leave.yaml");
        let template = Self::load_yaml::<LeaveTemplate>(&leave_path)?;

        let config = EngineConfig::new(business, fines, template, Defaults::default());

        Ok(Self { config })
    }

    /// Replaces the injected system defaults (used by tests and hosts that
    /// run with a different primary timezone or shift).
    pub fn with_defaults(mut self, defaults: Defaults) -> Self {
        self.config.defaults = defaults;
        self
    }

    /// Returns the loaded configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }
}
