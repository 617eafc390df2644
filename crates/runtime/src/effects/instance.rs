//! Per `(effect, stat)` runtime state.

use std::sync::Weak;

use stat_core::{EffectPhase, SourceId};

use crate::cancel::CancelToken;
use crate::stat::{StatKey, StatValue};

/// Identifies one effect instance: the effect's source on one live stat.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct InstanceKey {
    pub(crate) source: SourceId,
    pub(crate) stat: StatKey,
}

impl InstanceKey {
    pub(crate) fn new(source: SourceId, stat: &StatValue) -> Self {
        Self {
            source,
            stat: stat.key(),
        }
    }
}

/// Mutable state of one effect instance.
///
/// `generation` changes on every teardown, so work started before a teardown
/// (an in-flight tick, a cancelled loop winding down) can tell it no longer
/// owns the instance.
#[derive(Debug)]
pub(crate) struct EffectInstance {
    pub(crate) stacks: u32,
    pub(crate) completed_ticks: u32,
    /// Token of the loop the instance currently tracks.
    pub(crate) tick_cancel: Option<CancelToken>,
    /// Parent of every token handed out for this instance.
    pub(crate) total_cancel: CancelToken,
    pub(crate) generation: u64,
    /// Loops of this generation still running, the tracked one included.
    pub(crate) live_loops: u32,
    /// Permanent modifiers planned under the lock but not yet on the stat.
    pub(crate) pending_static: u32,
    pub(crate) stat: Weak<StatValue>,
}

impl EffectInstance {
    pub(crate) fn new(generation: u64, stat: Weak<StatValue>) -> Self {
        Self {
            stacks: 0,
            completed_ticks: 0,
            tick_cancel: None,
            total_cancel: CancelToken::new(),
            generation,
            live_loops: 0,
            pending_static: 0,
            stat,
        }
    }

    /// Cancels every token handed out so far and resets to a fresh generation.
    pub(crate) fn teardown(&mut self, generation: u64) {
        self.cancel_all();
        let stat = std::mem::take(&mut self.stat);
        *self = Self::new(generation, stat);
    }

    pub(crate) fn cancel_all(&self) {
        if let Some(token) = &self.tick_cancel {
            token.cancel();
        }
        self.total_cancel.cancel();
    }

    pub(crate) fn is_ticking(&self) -> bool {
        self.live_loops > 0
    }

    /// True when nothing about the instance would survive a removal.
    pub(crate) fn is_quiet(&self) -> bool {
        self.stacks == 0 && self.live_loops == 0 && self.pending_static == 0
    }

    /// True when dropping the entry loses nothing observable: the instance
    /// is quiet and has no tick count to report, or its stat is gone.
    pub(crate) fn is_disposable(&self) -> bool {
        let orphaned = self.stat.strong_count() == 0 && self.live_loops == 0;
        orphaned || (self.is_quiet() && self.completed_ticks == 0)
    }

    pub(crate) fn phase(&self, stat: &StatValue, source: SourceId) -> EffectPhase {
        if self.stacks > 0 {
            EffectPhase::Stacked {
                stacks: self.stacks,
                ticking: self.is_ticking(),
            }
        } else if self.is_ticking() {
            EffectPhase::Ticking
        } else if outstanding(stat, source) {
            EffectPhase::Active
        } else {
            EffectPhase::Idle
        }
    }
}

/// Phase of a pair that has no instance yet.
pub(crate) fn bare_phase(stat: &StatValue, source: SourceId) -> EffectPhase {
    if outstanding(stat, source) {
        EffectPhase::Active
    } else {
        EffectPhase::Idle
    }
}

fn outstanding(stat: &StatValue, source: SourceId) -> bool {
    stat.has_modifier_from_source(source) || stat.has_timed_from_source(source)
}
