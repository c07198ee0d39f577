//! Engine configuration, loadable from TOML.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::world_state::Tick;

/// Errors from reading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Settings for the progression engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Ticks between auto-resolve sweeps (5 simulated seconds).
    pub auto_resolve_interval: Tick,
    /// Time budget per quest level (one simulated day).
    pub ticks_per_level: Tick,
    /// Seed for auto-resolve randomness. Entropy when unset.
    pub rng_seed: Option<u64>,
    pub content_dir: Option<PathBuf>,
    /// Where the world record is saved.
    pub save_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            auto_resolve_interval: 100,
            ticks_per_level: 24_000,
            rng_seed: None,
            content_dir: None,
            save_path: None,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        tracing::info!(path = %path.display(), "Loaded engine config");
        Ok(config)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    /// The sweep interval, never zero.
    pub fn sweep_interval(&self) -> Tick {
        self.auto_resolve_interval.max(1)
    }
}
