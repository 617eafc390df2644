//! Per-subject stat registry.

use std::collections::BTreeMap;
use std::sync::Arc;

use stat_core::{
    EffectDefinition, StatContainer, StatDefinition, TextStatDefinition, TimedCancellation,
};
use tracing::warn;

use super::RegistrationReport;
use crate::api::{ApplyOutcome, NotApplicable, RegistryError};
use crate::config::RuntimeConfig;
use crate::effects::EffectApplier;
use crate::stat::{StatValue, TextStat};

/// A registered stat of either kind.
#[derive(Debug, Clone)]
pub enum Stat {
    Numeric(Arc<StatValue>),
    Text(Arc<TextStat>),
}

impl Stat {
    pub fn id(&self) -> &str {
        match self {
            Stat::Numeric(stat) => stat.id(),
            Stat::Text(stat) => stat.id(),
        }
    }

    pub fn as_numeric(&self) -> Option<&Arc<StatValue>> {
        match self {
            Stat::Numeric(stat) => Some(stat),
            Stat::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&Arc<TextStat>> {
        match self {
            Stat::Text(stat) => Some(stat),
            Stat::Numeric(_) => None,
        }
    }
}

/// Named collection of stats belonging to one subject.
///
/// Numeric stats take the sheet's timed-cancellation mode for waits started
/// on them directly. Waits an [`EffectApplier`] starts use the applier's mode.
///
/// [`EffectApplier`]: crate::EffectApplier
#[derive(Debug)]
pub struct StatSheet {
    name: String,
    cancellation: TimedCancellation,
    stats: BTreeMap<String, Stat>,
}

impl StatSheet {
    pub fn new(name: impl Into<String>, config: &RuntimeConfig) -> Self {
        Self {
            name: name.into(),
            cancellation: config.effects.timed_cancellation,
            stats: BTreeMap::new(),
        }
    }

    /// Builds a sheet from a container, skipping invalid and duplicate ids.
    pub fn from_container(
        container: &StatContainer,
        config: &RuntimeConfig,
    ) -> (Self, RegistrationReport) {
        let mut sheet = Self::new(container.name.clone(), config);
        let mut report = RegistrationReport::default();
        for definition in &container.numeric {
            report.record(sheet.register_numeric(definition));
        }
        for definition in &container.text {
            report.record(sheet.register_text(definition));
        }
        (sheet, report)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn register_numeric(
        &mut self,
        definition: &StatDefinition,
    ) -> Result<Arc<StatValue>, RegistryError> {
        definition.validate().map_err(|source| RegistryError::Invalid {
            name: definition.id.clone(),
            source,
        })?;
        self.ensure_vacant(&definition.id)?;

        let stat = Arc::new(StatValue::new(definition).with_cancellation(self.cancellation));
        self.stats
            .insert(definition.id.clone(), Stat::Numeric(Arc::clone(&stat)));
        Ok(stat)
    }

    pub fn register_text(
        &mut self,
        definition: &TextStatDefinition,
    ) -> Result<Arc<TextStat>, RegistryError> {
        definition.validate().map_err(|source| RegistryError::Invalid {
            name: definition.id.clone(),
            source,
        })?;
        self.ensure_vacant(&definition.id)?;

        let stat = Arc::new(TextStat::from_definition(definition));
        self.stats
            .insert(definition.id.clone(), Stat::Text(Arc::clone(&stat)));
        Ok(stat)
    }

    fn ensure_vacant(&self, id: &str) -> Result<(), RegistryError> {
        if self.stats.contains_key(id) {
            return Err(RegistryError::Duplicate(id.to_owned()));
        }
        Ok(())
    }

    pub fn stat(&self, id: &str) -> Option<&Stat> {
        self.stats.get(id)
    }

    pub fn numeric(&self, id: &str) -> Option<&Arc<StatValue>> {
        self.stat(id).and_then(Stat::as_numeric)
    }

    pub fn text(&self, id: &str) -> Option<&Arc<TextStat>> {
        self.stat(id).and_then(Stat::as_text)
    }

    /// Registered ids in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.stats.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.stats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    /// Looks up the numeric stat an effect may target.
    pub fn resolve(&self, id: &str) -> Result<&Arc<StatValue>, NotApplicable> {
        match self.stat(id) {
            Some(Stat::Numeric(stat)) => Ok(stat),
            Some(Stat::Text(_)) => Err(NotApplicable::NonNumericTarget(id.to_owned())),
            None => Err(NotApplicable::MissingStat(id.to_owned())),
        }
    }

    /// Applies `definition` to the stat named by its `affected_stat`.
    pub fn apply_effect(
        &self,
        applier: &EffectApplier,
        definition: &EffectDefinition,
    ) -> ApplyOutcome {
        match self.resolve(&definition.affected_stat) {
            Ok(stat) => applier.apply_effect(definition, stat),
            Err(reason) => {
                warn!(
                    target: "runtime::registry",
                    sheet = %self.name,
                    effect = %definition.name,
                    %reason,
                    "effect not applicable"
                );
                reason.into()
            }
        }
    }

    /// Removes `definition` from its stat. `false` when the stat is missing
    /// or nothing was active.
    pub fn remove_effect(&self, applier: &EffectApplier, definition: &EffectDefinition) -> bool {
        self.resolve(&definition.affected_stat)
            .is_ok_and(|stat| applier.remove_effect(definition, stat))
    }
}
