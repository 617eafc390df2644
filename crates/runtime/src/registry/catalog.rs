//! Effect definitions keyed by name.

use std::collections::BTreeMap;

use stat_core::EffectDefinition;

use super::RegistrationReport;
use crate::api::RegistryError;

#[derive(Debug, Default, Clone)]
pub struct EffectCatalog {
    effects: BTreeMap<String, EffectDefinition>,
}

impl EffectCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a catalog, skipping invalid definitions and repeated names.
    /// The first definition of a name wins.
    pub fn from_definitions(
        definitions: impl IntoIterator<Item = EffectDefinition>,
    ) -> (Self, RegistrationReport) {
        let mut catalog = Self::new();
        let mut report = RegistrationReport::default();
        for definition in definitions {
            report.record(catalog.insert(definition));
        }
        (catalog, report)
    }

    pub fn insert(&mut self, definition: EffectDefinition) -> Result<(), RegistryError> {
        definition
            .validate()
            .map_err(|source| RegistryError::Invalid {
                name: definition.name.clone(),
                source,
            })?;
        if self.effects.contains_key(&definition.name) {
            return Err(RegistryError::Duplicate(definition.name));
        }
        self.effects.insert(definition.name.clone(), definition);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&EffectDefinition> {
        self.effects.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.effects.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EffectDefinition> {
        self.effects.values()
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}
