//! Content loaders for reading stat data from files.

pub mod config;
pub mod effects;
pub mod factory;
pub mod stats;

pub use config::{ConfigLoader, EngineConfig};
pub use effects::{EffectCatalogLoader, EffectLoad, SkippedEntry};
pub use factory::ContentFactory;
pub use stats::StatContainerLoader;

use std::path::Path;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}
