//! Stat and effect definitions authored as external content.
//!
//! Definitions are plain data. Stat definitions are consumed once when a stat
//! is built; effect definitions are consumed on every apply/remove call.

use core::time::Duration;

use crate::error::{DefinitionError, ensure_finite};
use crate::modifier::{ModifierKind, ModifierRecord};
use crate::source::SourceId;

/// Numeric stat definition: `{statId, baseValue, min, max}`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatDefinition {
    pub id: String,
    pub base_value: f64,
    pub min: f64,
    pub max: f64,
}

impl StatDefinition {
    pub fn new(id: impl Into<String>, base_value: f64, min: f64, max: f64) -> Self {
        Self {
            id: id.into(),
            base_value,
            min,
            max,
        }
    }

    pub fn validate(&self) -> Result<(), DefinitionError> {
        if self.id.trim().is_empty() {
            return Err(DefinitionError::EmptyName { field: "stat id" });
        }
        ensure_finite("base value", self.base_value)?;
        // Infinite bounds are allowed (unbounded stats); NaN is not.
        if self.min.is_nan() || self.max.is_nan() {
            return Err(DefinitionError::InvalidBounds {
                min: self.min,
                max: self.max,
            });
        }
        if self.min > self.max {
            return Err(DefinitionError::InvalidBounds {
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// Non-numeric stat definition (e.g. a title or class name).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextStatDefinition {
    pub id: String,
    pub value: String,
}

impl TextStatDefinition {
    pub fn new(id: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            value: value.into(),
        }
    }

    pub fn validate(&self) -> Result<(), DefinitionError> {
        if self.id.trim().is_empty() {
            return Err(DefinitionError::EmptyName { field: "stat id" });
        }
        Ok(())
    }
}

/// The set of stats one subject starts with.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct StatContainer {
    pub name: String,
    pub numeric: Vec<StatDefinition>,
    pub text: Vec<TextStatDefinition>,
}

/// How reapplying an already-active effect is handled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DuplicateHandling {
    /// Every application is independent.
    #[default]
    Allow,
    /// Reapplication is rejected while a persistent modifier is active.
    Prevent,
    /// Reapplication adds a stack (up to the cap) and rescales the contribution.
    Stack,
    /// Reapplication tears everything down and restarts the clocks.
    Refresh,
}

/// Effect definition consumed by the effect applier.
///
/// An effect is periodic when `tick_interval_secs > 0`; it then applies a
/// timed modifier every interval, `tick_count` times (or forever when
/// `is_permanent`). Non-periodic effects apply one modifier that is either
/// permanent or timed for `duration_secs`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct EffectDefinition {
    pub name: String,
    pub affected_stat: String,
    pub modifier_value: f64,
    pub modifier_kind: ModifierKind,
    pub order: Option<i32>,
    pub is_permanent: bool,
    pub duration_secs: f64,
    pub duplicate_handling: DuplicateHandling,
    pub tick_interval_secs: f64,
    pub tick_count: u32,
    pub max_stacks: u32,
    pub per_stack_bonus: f64,
}

impl Default for EffectDefinition {
    fn default() -> Self {
        Self {
            name: String::new(),
            affected_stat: String::new(),
            modifier_value: 0.0,
            modifier_kind: ModifierKind::Flat,
            order: None,
            is_permanent: false,
            duration_secs: 0.0,
            duplicate_handling: DuplicateHandling::Allow,
            tick_interval_secs: 0.0,
            tick_count: 0,
            max_stacks: 1,
            per_stack_bonus: 0.0,
        }
    }
}

impl EffectDefinition {
    /// Creates a permanent, non-periodic `Allow` effect.
    pub fn new(
        name: impl Into<String>,
        affected_stat: impl Into<String>,
        modifier_value: f64,
        modifier_kind: ModifierKind,
    ) -> Self {
        Self {
            name: name.into(),
            affected_stat: affected_stat.into(),
            modifier_value,
            modifier_kind,
            is_permanent: true,
            ..Self::default()
        }
    }

    /// Makes the effect timed for `secs` seconds.
    pub fn timed(mut self, secs: f64) -> Self {
        self.is_permanent = false;
        self.duration_secs = secs;
        self
    }

    /// Makes the effect periodic: `count` ticks of `interval_secs` each.
    pub fn ticking(mut self, interval_secs: f64, count: u32) -> Self {
        self.tick_interval_secs = interval_secs;
        self.tick_count = count;
        self
    }

    pub fn permanent(mut self, is_permanent: bool) -> Self {
        self.is_permanent = is_permanent;
        self
    }

    pub fn handling(mut self, policy: DuplicateHandling) -> Self {
        self.duplicate_handling = policy;
        self
    }

    pub fn stacking(mut self, max_stacks: u32, per_stack_bonus: f64) -> Self {
        self.duplicate_handling = DuplicateHandling::Stack;
        self.max_stacks = max_stacks;
        self.per_stack_bonus = per_stack_bonus;
        self
    }

    pub fn ordered(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }

    /// Source identity of every modifier this effect creates.
    pub fn source(&self) -> SourceId {
        SourceId::from_name(&self.name)
    }

    pub fn is_periodic(&self) -> bool {
        self.tick_interval_secs > 0.0
    }

    pub fn duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.duration_secs).unwrap_or(Duration::ZERO)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.tick_interval_secs).unwrap_or(Duration::ZERO)
    }

    /// Whether applying this effect needs a timer (timed wait or tick loop).
    pub fn needs_timer(&self) -> bool {
        self.is_periodic() || !self.is_permanent
    }

    /// Contribution scaled for a stack count: `value × (1 + bonus × (stacks − 1))`.
    ///
    /// A stack count of zero is treated as one.
    pub fn stacked_value(&self, stacks: u32) -> f64 {
        let extra = stacks.max(1) - 1;
        self.modifier_value * (1.0 + self.per_stack_bonus * f64::from(extra))
    }

    /// Builds the modifier record this effect contributes at `stacks`.
    pub fn create_modifier(&self, stacks: u32) -> ModifierRecord {
        let value = self.stacked_value(stacks);
        let order = self
            .order
            .unwrap_or_else(|| self.modifier_kind.default_order());
        ModifierRecord::with_order(value, self.modifier_kind, order, self.source())
    }

    pub fn validate(&self) -> Result<(), DefinitionError> {
        if self.name.trim().is_empty() {
            return Err(DefinitionError::EmptyName {
                field: "effect name",
            });
        }
        if self.affected_stat.trim().is_empty() {
            return Err(DefinitionError::EmptyName {
                field: "affected stat",
            });
        }
        ensure_finite("modifier value", self.modifier_value)?;
        ensure_finite("per-stack bonus", self.per_stack_bonus)?;
        ensure_finite("duration", self.duration_secs)?;
        ensure_finite("tick interval", self.tick_interval_secs)?;
        if self.duration_secs < 0.0 {
            return Err(DefinitionError::NegativeDuration(self.duration_secs));
        }
        if self.tick_interval_secs < 0.0 {
            return Err(DefinitionError::NegativeTickInterval(
                self.tick_interval_secs,
            ));
        }
        if self.max_stacks == 0 {
            return Err(DefinitionError::ZeroMaxStacks);
        }
        Ok(())
    }
}
