//! Stat container loader.

use std::path::Path;

use stat_core::StatContainer;

use crate::loaders::{LoadResult, read_file};

/// Loader for stat containers from RON files.
///
/// The whole file must parse; per-stat validation happens when the container
/// is registered on a sheet.
pub struct StatContainerLoader;

impl StatContainerLoader {
    /// Load a stat container from a RON file.
    pub fn load(path: &Path) -> LoadResult<StatContainer> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<StatContainer> {
        ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse stat container RON: {}", e))
    }
}
