//! Periodic tick loop.
//!
//! Each iteration applies one timed modifier of length `tick_interval` and
//! waits it out. Cancellation is observed between ticks; whether it also cuts
//! an in-flight tick short depends on the applier's [`TimedCancellation`] mode.
//!
//! [`TimedCancellation`]: stat_core::TimedCancellation

use std::sync::Arc;
use std::time::Duration;

use stat_core::{EffectDefinition, ModifierRecord};
use tracing::debug;

use super::applier::Shared;
use super::instance::InstanceKey;
use crate::cancel::CancelToken;
use crate::events::{LoopEnd, TickEvent};
use crate::stat::{StatValue, TimedOutcome};

pub(crate) struct TickLoop {
    pub(crate) shared: Arc<Shared>,
    pub(crate) definition: EffectDefinition,
    pub(crate) stat: Arc<StatValue>,
    pub(crate) key: InstanceKey,
    pub(crate) generation: u64,
    pub(crate) stacks: u32,
    pub(crate) token: CancelToken,
}

impl TickLoop {
    pub(crate) async fn run(self) {
        let record = self.definition.create_modifier(self.stacks);
        let interval = self.definition.tick_interval();

        let reason = loop {
            if self.token.is_cancelled() {
                break LoopEnd::Cancelled;
            }
            if !self.definition.is_permanent && self.completed() >= self.definition.tick_count {
                break LoopEnd::Exhausted;
            }

            if self.tick(record, interval).await == TimedOutcome::Interrupted {
                break LoopEnd::Interrupted;
            }

            if let Some(tick) = self.shared.record_tick(self.key, self.generation) {
                debug!(
                    target: "runtime::effects",
                    effect = %self.definition.name,
                    stat = %self.stat.id(),
                    tick,
                    "tick completed"
                );
                self.shared.events.publish(TickEvent::Completed {
                    effect: self.definition.name.clone(),
                    stat: self.stat.id().to_owned(),
                    tick,
                });
            }
        };

        self.shared.loop_finished(self.key, self.generation, &self.token);

        debug!(
            target: "runtime::effects",
            effect = %self.definition.name,
            stat = %self.stat.id(),
            ?reason,
            "tick loop ended"
        );
        self.shared.events.publish(TickEvent::LoopEnded {
            effect: self.definition.name.clone(),
            stat: self.stat.id().to_owned(),
            reason,
        });
    }

    async fn tick(&self, record: ModifierRecord, interval: Duration) -> TimedOutcome {
        self.stat
            .start_timed_modifier_with(
                record,
                interval,
                Some(&self.token),
                self.shared.config.timed_cancellation,
            )
            .finish()
            .await
    }

    /// Ticks counted so far; a torn-down instance reads as exhausted.
    fn completed(&self) -> u32 {
        self.shared
            .completed_ticks(self.key, self.generation)
            .unwrap_or(self.definition.tick_count)
    }
}
