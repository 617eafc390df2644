//! Runtime configuration and environment loading.

use std::env;
use std::str::FromStr;

use stat_core::{EffectConfig, PreventPeriodic, TimedCancellation};

/// Runtime configuration shared by stats, the effect applier, and the event bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub effects: EffectConfig,
    pub event_buffer_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            effects: EffectConfig::default(),
            event_buffer_size: 100,
        }
    }
}

impl RuntimeConfig {
    pub fn with_effects(mut self, effects: EffectConfig) -> Self {
        self.effects = effects;
        self
    }

    pub fn with_timed_cancellation(mut self, mode: TimedCancellation) -> Self {
        self.effects.timed_cancellation = mode;
        self
    }

    pub fn with_prevent_periodic(mut self, mode: PreventPeriodic) -> Self {
        self.effects.prevent_periodic = mode;
        self
    }

    pub fn with_event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = size.max(1);
        self
    }

    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `STAT_TIMED_CANCELLATION` - `run-to-completion` (default) or `interrupt`
    /// - `STAT_PREVENT_PERIODIC` - `spawn-independent` (default) or `cancel-and-replace`
    /// - `STAT_EVENT_BUFFER` - Effect event channel capacity (default: 100)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    ///
    /// Unparseable values are ignored and the default is kept.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(mode) = parse::<TimedCancellation>(&lookup, "STAT_TIMED_CANCELLATION") {
            config.effects.timed_cancellation = mode;
        }

        if let Some(mode) = parse::<PreventPeriodic>(&lookup, "STAT_PREVENT_PERIODIC") {
            config.effects.prevent_periodic = mode;
        }

        if let Some(capacity) = parse::<usize>(&lookup, "STAT_EVENT_BUFFER") {
            config.event_buffer_size = capacity.max(1);
        }

        config
    }
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: FromStr,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(
                target: "runtime::config",
                key,
                value = %raw,
                "ignoring unparseable setting"
            );
            None
        }
    }
}
