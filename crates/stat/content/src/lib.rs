//! Data-driven stat content and loaders.
//!
//! This crate reads the static inputs of the stat system from data files:
//! - Stat containers (data-driven via RON)
//! - Effect catalogs (data-driven via TOML, one `[[effects]]` table per effect)
//! - Effect lifecycle configuration (data-driven via TOML)
//!
//! All loaders use stat-core types directly with serde for RON/TOML
//! deserialization. Effect catalogs tolerate bad entries: each one is skipped
//! and reported while the rest still load.

#[cfg(feature = "loaders")]
pub mod loaders;

#[cfg(feature = "loaders")]
pub use loaders::{
    ConfigLoader, ContentFactory, EffectCatalogLoader, EffectLoad, EngineConfig, LoadResult,
    SkippedEntry, StatContainerLoader,
};
