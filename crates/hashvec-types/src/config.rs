//! Configuration loading for hashvec.
//!
//! Layered config: defaults -> config file -> env vars.
//! The default config file lives at ~/.config/hashvec/config.toml
//! (platform equivalent via `directories`).

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::VectorError;

/// Index settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Path to the RocksDB directory holding the index
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Vector dimension, fixed for the lifetime of the index
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    /// Candidates pulled by the Hamming scan when a query gives no limit
    #[serde(default = "default_candidate_limit")]
    pub candidate_limit: usize,

    /// Fixed seed for the hyperplane family of a fresh index.
    /// Leave unset in production so every new index gets its own planes.
    #[serde(default)]
    pub hyperplane_seed: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_db_path() -> String {
    ProjectDirs::from("", "", "hashvec")
        .map(|p| p.data_local_dir().join("index"))
        .unwrap_or_else(|| PathBuf::from("./hashvec-index"))
        .to_string_lossy()
        .to_string()
}

fn default_dimension() -> usize {
    768
}

fn default_candidate_limit() -> usize {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            dimension: default_dimension(),
            candidate_limit: default_candidate_limit(),
            hyperplane_seed: None,
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (~/.config/hashvec/config.toml)
    /// 3. Explicit config file (optional)
    /// 4. Environment variables (HASHVEC_*)
    pub fn load(config_path: Option<&str>) -> Result<Self, VectorError> {
        let config_dir = ProjectDirs::from("", "", "hashvec")
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .set_default("db_path", default_db_path())
            .map_err(|e| VectorError::Config(e.to_string()))?
            .set_default("dimension", default_dimension() as i64)
            .map_err(|e| VectorError::Config(e.to_string()))?
            .set_default("candidate_limit", default_candidate_limit() as i64)
            .map_err(|e| VectorError::Config(e.to_string()))?
            .set_default("log_level", default_log_level())
            .map_err(|e| VectorError::Config(e.to_string()))?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // HASHVEC_DB_PATH, HASHVEC_DIMENSION, HASHVEC_CANDIDATE_LIMIT, ...
        builder = builder.add_source(
            Environment::with_prefix("HASHVEC")
                .prefix_separator("_")
                .try_parsing(true),
        );

        let settings: Settings = builder
            .build()
            .map_err(|e| VectorError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| VectorError::Config(e.to_string()))?;

        settings.validate()?;
        Ok(settings)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), VectorError> {
        if self.dimension == 0 {
            return Err(VectorError::Config("dimension must be > 0".to_string()));
        }
        if self.candidate_limit == 0 {
            return Err(VectorError::Config(
                "candidate_limit must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Expand ~ in db_path to the home directory
    pub fn expanded_db_path(&self) -> PathBuf {
        if let Some(rest) = self.db_path.strip_prefix("~/") {
            if let Some(dirs) = directories::BaseDirs::new() {
                return dirs.home_dir().join(rest);
            }
        }
        PathBuf::from(&self.db_path)
    }
}
