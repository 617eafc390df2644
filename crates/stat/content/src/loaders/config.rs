//! Engine configuration loader.

use std::path::Path;

use serde::{Deserialize, Serialize};
use stat_core::EffectConfig;

use crate::loaders::{LoadResult, read_file};

/// Engine settings read from `config.toml`.
///
/// ```toml
/// event_buffer_size = 256
///
/// [effects]
/// timed_cancellation = "interrupt"
/// prevent_periodic = "cancel-and-replace"
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub effects: EffectConfig,
    /// Effect event channel capacity; `None` keeps the runtime default.
    pub event_buffer_size: Option<usize>,
}

/// Loader for engine configuration from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config data from a TOML file.
    pub fn load(path: &Path) -> LoadResult<EngineConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<EngineConfig> {
        toml::from_str(content).map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))
    }
}
