//! Modifier records: immutable contributions to a stat's composed value.

use crate::source::SourceId;

/// How a modifier contributes to the composition walk.
///
/// - **Flat**: added directly to the running total
/// - **PercentAdd**: summed into a pending bucket; a contiguous run of these
///   is applied as one lump `× (1 + Σ)` increment
/// - **PercentMult**: multiplies the running total by `(1 + value)` on its own
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ModifierKind {
    Flat,
    PercentAdd,
    PercentMult,
}

impl ModifierKind {
    /// Rank used when the caller does not choose an explicit order.
    ///
    /// Keeps the natural grouping `Flat < PercentAdd < PercentMult`.
    pub const fn default_order(self) -> i32 {
        match self {
            Self::Flat => 100,
            Self::PercentAdd => 200,
            Self::PercentMult => 300,
        }
    }
}

/// One contribution to a stat.
///
/// Records are value objects: once built they never change, and a stat only
/// stores, sorts, and drops them.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModifierRecord {
    value: f64,
    kind: ModifierKind,
    order: i32,
    source: SourceId,
}

impl ModifierRecord {
    /// Creates a record ranked by its kind's default order.
    pub fn new(value: f64, kind: ModifierKind, source: SourceId) -> Self {
        Self::with_order(value, kind, kind.default_order(), source)
    }

    /// Creates a record with an explicit order, for interleaving kinds.
    pub fn with_order(value: f64, kind: ModifierKind, order: i32, source: SourceId) -> Self {
        Self {
            value,
            kind,
            order,
            source,
        }
    }

    pub fn flat(value: f64, source: SourceId) -> Self {
        Self::new(value, ModifierKind::Flat, source)
    }

    pub fn percent_add(value: f64, source: SourceId) -> Self {
        Self::new(value, ModifierKind::PercentAdd, source)
    }

    pub fn percent_mult(value: f64, source: SourceId) -> Self {
        Self::new(value, ModifierKind::PercentMult, source)
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn kind(&self) -> ModifierKind {
        self.kind
    }

    pub fn order(&self) -> i32 {
        self.order
    }

    pub fn source(&self) -> SourceId {
        self.source
    }

    /// Numeric contribution of this record when applied as a timed modifier.
    ///
    /// Flat records contribute their value; percentage records scale the
    /// given baseline (the stat's base plus its outstanding temporary pool).
    pub fn timed_contribution(&self, baseline: f64) -> f64 {
        match self.kind {
            ModifierKind::Flat => self.value,
            ModifierKind::PercentAdd | ModifierKind::PercentMult => baseline * self.value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_orders_group_by_kind() {
        assert!(ModifierKind::Flat.default_order() < ModifierKind::PercentAdd.default_order());
        assert!(
            ModifierKind::PercentAdd.default_order() < ModifierKind::PercentMult.default_order()
        );

        let source = SourceId::new(7);
        assert_eq!(ModifierRecord::percent_mult(0.5, source).order(), 300);
        assert_eq!(
            ModifierRecord::with_order(0.5, ModifierKind::PercentMult, 50, source).order(),
            50
        );
    }

    #[test]
    fn timed_contribution_scales_percentages_by_baseline() {
        let source = SourceId::new(1);
        assert_eq!(ModifierRecord::flat(5.0, source).timed_contribution(40.0), 5.0);
        assert_eq!(
            ModifierRecord::percent_add(0.25, source).timed_contribution(40.0),
            10.0
        );
        assert_eq!(
            ModifierRecord::percent_mult(0.5, source).timed_contribution(40.0),
            20.0
        );
    }
}
