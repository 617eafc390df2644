//! Cached compute engine for one numeric stat.
//!
//! ```text
//! value = clamp(round4(compose(base, modifiers)) + temporary + permanent, min, max)
//! ```
//!
//! `compose` only reruns when a modifier changed since the last read or the
//! base moved; every other read reuses the cached composition.

use crate::compose::{clamp, compose, round_int};
use crate::definition::StatDefinition;
use crate::modifier::ModifierRecord;
use crate::source::SourceId;

/// Mutable state of a numeric stat.
///
/// The modifier list and both accumulation pools are private; the only way
/// to change them is through the methods below.
#[derive(Clone, Debug)]
pub struct StatState {
    base: f64,
    min: f64,
    max: f64,
    modifiers: Vec<ModifierRecord>,
    /// Contributions of timed modifiers whose clocks are still running.
    temporary: f64,
    /// Contributions of timed modifiers whose clocks ran out.
    permanent: f64,
    cached: f64,
    dirty: bool,
    last_base: f64,
}

impl StatState {
    pub fn new(base: f64, min: f64, max: f64) -> Self {
        Self {
            base,
            min,
            max,
            modifiers: Vec::new(),
            temporary: 0.0,
            permanent: 0.0,
            cached: base,
            dirty: true,
            last_base: base,
        }
    }

    pub fn from_definition(definition: &StatDefinition) -> Self {
        Self::new(definition.base_value, definition.min, definition.max)
    }

    pub fn base(&self) -> f64 {
        self.base
    }

    /// Replaces the base value; the next read recomposes.
    pub fn set_base(&mut self, base: f64) {
        self.base = base;
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn temporary(&self) -> f64 {
        self.temporary
    }

    pub fn permanent(&self) -> f64 {
        self.permanent
    }

    pub fn modifiers(&self) -> &[ModifierRecord] {
        &self.modifiers
    }

    pub fn add_modifier(&mut self, modifier: ModifierRecord) {
        self.modifiers.push(modifier);
        self.dirty = true;
    }

    /// Removes every static modifier from `source`, returning how many went.
    pub fn remove_modifiers_from_source(&mut self, source: SourceId) -> usize {
        let before = self.modifiers.len();
        self.modifiers.retain(|m| m.source() != source);
        let removed = before - self.modifiers.len();
        if removed > 0 {
            self.dirty = true;
        }
        removed
    }

    pub fn has_modifier_from_source(&self, source: SourceId) -> bool {
        self.modifiers.iter().any(|m| m.source() == source)
    }

    /// Contribution `modifier` would make as a timed modifier right now.
    ///
    /// Percentages scale `base + temporary`, so stacked temporary effects
    /// compound against each other rather than against the bare base.
    pub fn timed_contribution(&self, modifier: &ModifierRecord) -> f64 {
        modifier.timed_contribution(self.base + self.temporary)
    }

    pub fn add_temporary(&mut self, amount: f64) {
        self.temporary += amount;
    }

    /// Drops a temporary contribution without keeping it.
    pub fn revert_temporary(&mut self, amount: f64) {
        self.temporary -= amount;
    }

    /// Moves a contribution from the temporary pool into the permanent pool.
    pub fn migrate(&mut self, amount: f64) {
        self.temporary -= amount;
        self.permanent += amount;
    }

    /// Rounded composition of base and static modifiers (cached).
    pub fn composed(&mut self) -> f64 {
        if self.dirty || self.last_base != self.base {
            self.last_base = self.base;
            self.cached = compose(self.base, &self.modifiers);
            self.dirty = false;
        }
        self.cached
    }

    pub fn value(&mut self) -> f64 {
        let composed = self.composed();
        clamp(composed + self.temporary + self.permanent, self.min, self.max)
    }

    pub fn int_value(&mut self) -> i64 {
        round_int(self.value())
    }

    /// True when the next read will recompose.
    pub fn is_dirty(&self) -> bool {
        self.dirty || self.last_base != self.base
    }
}
