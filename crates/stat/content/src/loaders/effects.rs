//! Effect catalog loader.
//!
//! Catalogs are TOML files with one `[[effects]]` table per effect. Entries
//! are decoded one at a time so a single malformed or invalid effect is
//! reported and skipped instead of failing the whole file.

use std::path::Path;

use serde::Deserialize;
use stat_core::EffectDefinition;
use tracing::warn;

use crate::loaders::{LoadResult, read_file};

#[derive(Debug, Deserialize)]
struct RawCatalog {
    #[serde(default)]
    effects: Vec<toml::Value>,
}

/// An entry that did not make it into the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    /// Position of the entry in the file, starting at 0.
    pub index: usize,
    pub name: Option<String>,
    pub reason: String,
}

/// Effects decoded from one catalog file.
#[derive(Debug, Clone, Default)]
pub struct EffectLoad {
    pub effects: Vec<EffectDefinition>,
    pub skipped: Vec<SkippedEntry>,
}

/// Loader for effect catalogs from TOML files.
pub struct EffectCatalogLoader;

impl EffectCatalogLoader {
    /// Load an effect catalog from a TOML file.
    ///
    /// Fails only when the file cannot be read or is not valid TOML.
    pub fn load(path: &Path) -> LoadResult<EffectLoad> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<EffectLoad> {
        let raw: RawCatalog = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse effect catalog TOML: {}", e))?;

        let mut load = EffectLoad::default();
        for (index, value) in raw.effects.into_iter().enumerate() {
            let name = value
                .get("name")
                .and_then(toml::Value::as_str)
                .map(str::to_owned);

            let decoded = value
                .try_into::<EffectDefinition>()
                .map_err(|e| e.to_string())
                .and_then(|definition| {
                    definition
                        .validate()
                        .map(|()| definition)
                        .map_err(|e| e.to_string())
                });

            match decoded {
                Ok(definition) => load.effects.push(definition),
                Err(reason) => {
                    warn!(
                        target: "stat_content",
                        index,
                        name = name.as_deref().unwrap_or("<unnamed>"),
                        %reason,
                        "skipping effect entry"
                    );
                    load.skipped.push(SkippedEntry {
                        index,
                        name,
                        reason,
                    });
                }
            }
        }
        Ok(load)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stat_core::{DuplicateHandling, ModifierKind};

    const CATALOG: &str = r#"
        [[effects]]
        name = "poison"
        affected_stat = "hp"
        modifier_value = -5.0
        modifier_kind = "Flat"
        duplicate_handling = "Refresh"
        tick_interval_secs = 1.0
        tick_count = 5

        [[effects]]
        name = "broken"
        affected_stat = "hp"
        modifier_value = "lots"

        [[effects]]
        name = "rage"
        affected_stat = "str"
        modifier_value = 0.1
        modifier_kind = "PercentAdd"
        is_permanent = true
        duplicate_handling = "Stack"
        max_stacks = 3
        per_stack_bonus = 0.5

        [[effects]]
        name = "backwards"
        affected_stat = "hp"
        modifier_value = 1.0
        duration_secs = -2.0
    "#;

    #[test]
    fn bad_entries_are_skipped_and_reported() {
        let load = EffectCatalogLoader::parse(CATALOG).expect("catalog should parse");

        let names: Vec<_> = load.effects.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["poison", "rage"]);

        let skipped: Vec<_> = load.skipped.iter().map(|s| s.index).collect();
        assert_eq!(skipped, vec![1, 3]);
        assert_eq!(load.skipped[0].name.as_deref(), Some("broken"));
    }

    #[test]
    fn omitted_fields_take_defaults() {
        let load = EffectCatalogLoader::parse(CATALOG).expect("catalog should parse");
        let poison = &load.effects[0];
        assert_eq!(poison.duplicate_handling, DuplicateHandling::Refresh);
        assert!(!poison.is_permanent);
        assert!(poison.is_periodic());

        let rage = &load.effects[1];
        assert_eq!(rage.modifier_kind, ModifierKind::PercentAdd);
        assert_eq!(rage.max_stacks, 3);
        assert_eq!(rage.order, None);
    }

    #[test]
    fn invalid_toml_fails_the_whole_file() {
        assert!(EffectCatalogLoader::parse("[[effects]\nname = ").is_err());
    }
}
