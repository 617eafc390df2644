//! Tunable effect-lifecycle behavior.
//!
//! Both knobs govern what cancellation means for work already in flight.
//! The defaults are the lenient variants: nothing is cut short.

/// What cancelling an outstanding timed modifier does.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "kebab-case")]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "kebab-case")
)]
pub enum TimedCancellation {
    /// Cancellation only unregisters the modifier. The wait keeps running and
    /// its contribution still migrates into the permanent pool when it ends.
    #[default]
    RunToCompletion,

    /// Cancellation interrupts the wait and reverts the temporary
    /// contribution immediately. Nothing migrates.
    Interrupt,
}

/// How `Prevent` treats repeated applications of a periodic effect.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "kebab-case")]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "kebab-case")
)]
pub enum PreventPeriodic {
    /// Every application starts a new tick loop. The instance's loop handle is
    /// replaced without cancelling the previous loop, which keeps running
    /// until the effect is removed.
    #[default]
    SpawnIndependent,

    /// The previous loop is cancelled before the new one starts.
    CancelAndReplace,
}

/// Effect lifecycle configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct EffectConfig {
    pub timed_cancellation: TimedCancellation,
    pub prevent_periodic: PreventPeriodic,
}

impl EffectConfig {
    pub const fn new(
        timed_cancellation: TimedCancellation,
        prevent_periodic: PreventPeriodic,
    ) -> Self {
        Self {
            timed_cancellation,
            prevent_periodic,
        }
    }

    /// Tightened configuration: interrupting cancellation and no orphaned loops.
    pub const fn strict() -> Self {
        Self::new(
            TimedCancellation::Interrupt,
            PreventPeriodic::CancelAndReplace,
        )
    }
}
