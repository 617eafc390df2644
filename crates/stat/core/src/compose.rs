//! Composition walk over an ordered modifier sequence.
//!
//! Modifiers are applied in ascending `order` (ties keep insertion order):
//!
//! ```text
//! Flat        → total += value
//! PercentAdd  → bucket += value
//! PercentMult → total *= 1 + value
//! after each non-PercentAdd (or the last modifier): total *= 1 + bucket; bucket = 0
//! ```
//!
//! A contiguous run of `PercentAdd` modifiers therefore lands as one lump
//! increment right before the next non-`PercentAdd` modifier, or at the end.

use crate::modifier::{ModifierKind, ModifierRecord};

/// Composes `base` with `modifiers` and rounds the result to 4 decimals.
///
/// # Example
/// ```
/// # use stat_core::{ModifierKind, ModifierRecord, SourceId, compose};
/// let source = SourceId::new(1);
/// let modifiers = [
///     ModifierRecord::with_order(20.0, ModifierKind::Flat, 100, source),
///     ModifierRecord::with_order(0.1, ModifierKind::PercentAdd, 200, source),
///     ModifierRecord::with_order(0.5, ModifierKind::PercentMult, 300, source),
/// ];
/// // (100 + 20) × 1.5 = 180, then the pending +10% bucket: 180 × 1.1 = 198
/// assert_eq!(compose(100.0, &modifiers), 198.0);
/// ```
pub fn compose(base: f64, modifiers: &[ModifierRecord]) -> f64 {
    let mut sorted: Vec<&ModifierRecord> = modifiers.iter().collect();
    // Stable sort: equal orders keep insertion sequence.
    sorted.sort_by_key(|m| m.order());

    let last = sorted.len().saturating_sub(1);
    let mut total = base;
    let mut bucket = 0.0;

    for (index, modifier) in sorted.iter().enumerate() {
        match modifier.kind() {
            ModifierKind::Flat => total += modifier.value(),
            ModifierKind::PercentAdd => bucket += modifier.value(),
            ModifierKind::PercentMult => total *= 1.0 + modifier.value(),
        }

        if modifier.kind() != ModifierKind::PercentAdd || index == last {
            total *= 1.0 + bucket;
            bucket = 0.0;
        }
    }

    round4(total)
}

/// Rounds to 4 decimal places, half-to-even.
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round_ties_even() / 10_000.0
}

/// Rounds to the nearest integer, half-to-even.
pub fn round_int(value: f64) -> i64 {
    value.round_ties_even() as i64
}

/// Clamps into `[min, max]` without panicking on inverted bounds.
///
/// Values below `min` become `min`; otherwise values above `max` become `max`.
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceId;

    const SRC: SourceId = SourceId::new(1);

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn empty_sequence_returns_base() {
        assert_eq!(compose(42.5, &[]), 42.5);
    }

    #[test]
    fn flats_are_summed() {
        let mods = [ModifierRecord::flat(5.0, SRC), ModifierRecord::flat(-2.0, SRC)];
        assert_eq!(compose(10.0, &mods), 13.0);
    }

    #[test]
    fn percent_adds_land_as_one_lump() {
        let mods = [
            ModifierRecord::percent_add(0.2, SRC),
            ModifierRecord::percent_add(0.3, SRC),
        ];
        // 100 × (1 + 0.5), never 100 × 1.2 × 1.3
        assert_eq!(compose(100.0, &mods), 150.0);
    }

    #[test]
    fn percent_mults_compound_in_any_order() {
        let forward = [
            ModifierRecord::percent_mult(0.2, SRC),
            ModifierRecord::percent_mult(0.3, SRC),
        ];
        let backward = [
            ModifierRecord::percent_mult(0.3, SRC),
            ModifierRecord::percent_mult(0.2, SRC),
        ];
        assert!(close(compose(100.0, &forward), 156.0));
        assert!(close(compose(100.0, &forward), compose(100.0, &backward)));
    }

    #[test]
    fn bucket_flushes_before_next_non_percent_add() {
        // Custom order interleaves: PercentAdd (10) before Flat (20).
        let mods = [
            ModifierRecord::with_order(10.0, ModifierKind::Flat, 20, SRC),
            ModifierRecord::with_order(0.5, ModifierKind::PercentAdd, 10, SRC),
        ];
        // bucket 0.5 waits, then Flat: (100 + 10) × 1.5 = 165
        assert_eq!(compose(100.0, &mods), 165.0);
    }

    #[test]
    fn separate_percent_add_runs_apply_separately() {
        let mods = [
            ModifierRecord::with_order(0.1, ModifierKind::PercentAdd, 1, SRC),
            ModifierRecord::with_order(0.0, ModifierKind::Flat, 2, SRC),
            ModifierRecord::with_order(0.1, ModifierKind::PercentAdd, 3, SRC),
        ];
        // 100 × 1.1 × 1.1 = 121
        assert!(close(compose(100.0, &mods), 121.0));
    }

    #[test]
    fn insertion_order_breaks_ties() {
        let a = [
            ModifierRecord::with_order(10.0, ModifierKind::Flat, 5, SRC),
            ModifierRecord::with_order(1.0, ModifierKind::PercentMult, 5, SRC),
        ];
        let b = [
            ModifierRecord::with_order(1.0, ModifierKind::PercentMult, 5, SRC),
            ModifierRecord::with_order(10.0, ModifierKind::Flat, 5, SRC),
        ];
        assert_eq!(compose(10.0, &a), 40.0);
        assert_eq!(compose(10.0, &b), 30.0);
    }

    #[test]
    fn rounding_is_four_decimals_half_even() {
        assert_eq!(round4(1.234_56), 1.2346);
        assert_eq!(round4(-0.000_04), -0.0);
        assert_eq!(round_int(2.5), 2);
        assert_eq!(round_int(3.5), 4);
        assert_eq!(round_int(-1.6), -2);
    }

    #[test]
    fn clamp_handles_bounds() {
        assert_eq!(clamp(5.0, 0.0, 10.0), 5.0);
        assert_eq!(clamp(-1.0, 0.0, 10.0), 0.0);
        assert_eq!(clamp(11.0, 0.0, 10.0), 10.0);
    }
}
