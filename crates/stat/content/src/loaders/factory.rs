//! Content factory for loading stat data from a directory.

use std::path::{Path, PathBuf};

use stat_core::StatContainer;

use crate::loaders::{
    ConfigLoader, EffectCatalogLoader, EffectLoad, EngineConfig, LoadResult, StatContainerLoader,
};

/// Content factory that loads all stat content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── config.toml
/// ├── effects.toml
/// └── stats/
///     ├── hero.ron
///     └── goblin.ron
/// ```
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Load engine configuration from `config.toml`. A missing file yields
    /// the defaults.
    pub fn load_config(&self) -> LoadResult<EngineConfig> {
        let path = self.data_dir.join("config.toml");
        if !path.exists() {
            return Ok(EngineConfig::default());
        }
        ConfigLoader::load(&path)
    }

    /// Load the effect catalog from `effects.toml`.
    pub fn load_effects(&self) -> LoadResult<EffectLoad> {
        let path = self.data_dir.join("effects.toml");
        EffectCatalogLoader::load(&path)
    }

    /// Load a stat container from `stats/{name}.ron`.
    pub fn load_stats(&self, name: &str) -> LoadResult<StatContainer> {
        let path = self.data_dir.join("stats").join(format!("{}.ron", name));
        StatContainerLoader::load(&path)
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
