//! Shared numeric stat: the cached compute engine behind a lock, plus timed
//! modifiers and value-changed subscriptions.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use stat_core::{
    ModifierRecord, SourceId, StatDefinition, StatState, TimedCancellation, round_int,
};
use tracing::trace;

use super::subscription::{SubscriptionId, Subscribers};
use super::timed::{TimedId, TimedRegistry};
use crate::cancel::CancelToken;

/// Process-unique identity of one [`StatValue`].
///
/// Stat ids (`"hp"`) repeat across subjects; keys never do.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StatKey(u64);

static NEXT_KEY: AtomicU64 = AtomicU64::new(1);

/// How a timed wait ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimedOutcome {
    /// The clock ran out; the contribution moved into the permanent pool.
    Elapsed,
    /// Cancellation interrupted the wait; the contribution was reverted.
    Interrupted,
}

struct Inner {
    state: StatState,
    timed: TimedRegistry,
}

/// A numeric stat shared between callers and running effects.
///
/// All mutation goes through this type's methods, which serialize on one
/// internal lock. The lock is never held across a suspension point or while
/// subscribers run.
pub struct StatValue {
    id: String,
    key: StatKey,
    cancellation: TimedCancellation,
    inner: Mutex<Inner>,
    subscribers: Subscribers<f64>,
}

impl StatValue {
    pub fn new(definition: &StatDefinition) -> Self {
        Self::with_bounds(
            definition.id.clone(),
            definition.base_value,
            definition.min,
            definition.max,
        )
    }

    pub fn with_bounds(id: impl Into<String>, base: f64, min: f64, max: f64) -> Self {
        Self {
            id: id.into(),
            key: StatKey(NEXT_KEY.fetch_add(1, Ordering::Relaxed)),
            cancellation: TimedCancellation::default(),
            inner: Mutex::new(Inner {
                state: StatState::new(base, min, max),
                timed: TimedRegistry::default(),
            }),
            subscribers: Subscribers::new(),
        }
    }

    pub fn with_cancellation(mut self, cancellation: TimedCancellation) -> Self {
        self.cancellation = cancellation;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn key(&self) -> StatKey {
        self.key
    }

    /// Mode of waits started through [`start_timed_modifier`](Self::start_timed_modifier).
    pub fn cancellation(&self) -> TimedCancellation {
        self.cancellation
    }

    /// Current value: composed, rounded, plus both pools, clamped.
    pub fn value(&self) -> f64 {
        self.inner.lock().state.value()
    }

    /// [`value`](Self::value) rounded half-to-even.
    pub fn int_value(&self) -> i64 {
        round_int(self.value())
    }

    pub fn base(&self) -> f64 {
        self.inner.lock().state.base()
    }

    pub fn bounds(&self) -> (f64, f64) {
        let inner = self.inner.lock();
        (inner.state.min(), inner.state.max())
    }

    pub fn temporary(&self) -> f64 {
        self.inner.lock().state.temporary()
    }

    pub fn permanent(&self) -> f64 {
        self.inner.lock().state.permanent()
    }

    /// Snapshot of the static modifiers, in insertion order.
    pub fn modifiers(&self) -> Vec<ModifierRecord> {
        self.inner.lock().state.modifiers().to_vec()
    }

    /// Number of timed modifiers still registered.
    pub fn timed_count(&self) -> usize {
        self.inner.lock().timed.len()
    }

    pub fn set_base(&self, base: f64) {
        self.mutate(|inner| {
            let changed = inner.state.base() != base;
            inner.state.set_base(base);
            ((), changed)
        });
    }

    /// Adds a static modifier. No duplicate checking happens here.
    pub fn add_modifier(&self, modifier: ModifierRecord) {
        self.mutate(|inner| {
            inner.state.add_modifier(modifier);
            ((), true)
        });
    }

    /// Removes every static and timed modifier from `source`.
    ///
    /// Registered timed modifiers are unregistered and their tokens cancelled.
    /// Those started under [`TimedCancellation::Interrupt`] have their
    /// temporary contributions reverted on the spot. Returns whether anything
    /// was removed; a second call with nothing left returns `false` and
    /// changes nothing.
    pub fn remove_all_from_source(&self, source: SourceId) -> bool {
        self.mutate(|inner| {
            let statics = inner.state.remove_modifiers_from_source(source);
            let timed = inner.timed.drain_source(source);

            let mut changed = statics > 0;
            for entry in &timed {
                if entry.mode == TimedCancellation::Interrupt {
                    inner.state.revert_temporary(entry.contribution);
                    changed = true;
                }
                entry.cancel.cancel();
            }

            (statics > 0 || !timed.is_empty(), changed)
        })
    }

    /// True iff a static (non-timed) modifier from `source` is present.
    ///
    /// Timed modifiers are deliberately excluded: this answers "is a
    /// persistent effect active", not "is a temporary wait in progress".
    pub fn has_modifier_from_source(&self, source: SourceId) -> bool {
        self.inner.lock().state.has_modifier_from_source(source)
    }

    /// True iff a timed modifier from `source` is still registered.
    pub fn has_timed_from_source(&self, source: SourceId) -> bool {
        self.inner.lock().timed.has_source(source)
    }

    /// Adds a timed modifier and waits out its duration.
    pub async fn add_timed_modifier(
        self: &Arc<Self>,
        modifier: ModifierRecord,
        duration: Duration,
    ) -> TimedOutcome {
        self.start_timed_modifier(modifier, duration, None)
            .finish()
            .await
    }

    /// Registers a timed modifier now and returns the wait to drive.
    ///
    /// The contribution (computed against `base + temporary`) is added to the
    /// temporary pool before this returns. `parent` ties the wait's token to
    /// a caller's token so cancelling the caller reaches it. The wait uses
    /// this stat's [`cancellation`](Self::cancellation) mode.
    pub fn start_timed_modifier(
        self: &Arc<Self>,
        modifier: ModifierRecord,
        duration: Duration,
        parent: Option<&CancelToken>,
    ) -> TimedWait {
        self.start_timed_modifier_with(modifier, duration, parent, self.cancellation)
    }

    /// [`start_timed_modifier`](Self::start_timed_modifier) under an explicit
    /// cancellation mode.
    pub fn start_timed_modifier_with(
        self: &Arc<Self>,
        modifier: ModifierRecord,
        duration: Duration,
        parent: Option<&CancelToken>,
        mode: TimedCancellation,
    ) -> TimedWait {
        let cancel = parent.map_or_else(CancelToken::new, CancelToken::child);
        let token = cancel.clone();
        let (id, contribution) = self.mutate(move |inner| {
            let contribution = inner.state.timed_contribution(&modifier);
            inner.state.add_temporary(contribution);
            let id = inner.timed.insert(modifier, contribution, mode, token);
            ((id, contribution), true)
        });

        TimedWait {
            stat: Arc::clone(self),
            id,
            contribution,
            duration,
            mode,
            cancel,
        }
    }

    pub fn subscribe(&self, handler: impl Fn(f64) + Send + Sync + 'static) -> SubscriptionId {
        self.subscribers.subscribe(handler)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    fn complete(&self, id: TimedId, contribution: f64, mode: TimedCancellation) -> TimedOutcome {
        self.mutate(|inner| {
            let registered = inner.timed.remove(id).is_some();
            if !registered && mode == TimedCancellation::Interrupt {
                // Already reverted by source removal.
                return (TimedOutcome::Interrupted, false);
            }
            inner.state.migrate(contribution);
            (TimedOutcome::Elapsed, true)
        })
    }

    fn interrupt(&self, id: TimedId) {
        self.mutate(|inner| match inner.timed.remove(id) {
            Some(entry) => {
                inner.state.revert_temporary(entry.contribution);
                ((), true)
            }
            None => ((), false),
        });
    }

    /// Runs `f` under the lock; notifies subscribers afterwards if it reports
    /// a change.
    fn mutate<R>(&self, f: impl FnOnce(&mut Inner) -> (R, bool)) -> R {
        let (result, notify) = {
            let mut inner = self.inner.lock();
            let (result, changed) = f(&mut inner);
            let value = changed.then(|| {
                let dirty = inner.state.is_dirty();
                let value = inner.state.value();
                if dirty {
                    trace!(target: "runtime::stat", stat = %self.id, value, "recomposed");
                }
                value
            });
            (result, value)
        };
        if let Some(value) = notify {
            self.subscribers.notify(value);
        }
        result
    }
}

impl fmt::Debug for StatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatValue")
            .field("id", &self.id)
            .field("key", &self.key)
            .field("value", &self.value())
            .finish()
    }
}

/// An in-flight timed modifier.
///
/// The contribution is already in the temporary pool; driving
/// [`finish`](Self::finish) to completion is what migrates it (or reverts it
/// on interruption). A wait that is dropped unfinished leaves its
/// contribution in the temporary pool.
#[must_use = "a timed modifier only resolves when its wait is driven"]
pub struct TimedWait {
    stat: Arc<StatValue>,
    id: TimedId,
    contribution: f64,
    duration: Duration,
    mode: TimedCancellation,
    cancel: CancelToken,
}

impl TimedWait {
    pub fn contribution(&self) -> f64 {
        self.contribution
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn mode(&self) -> TimedCancellation {
        self.mode
    }

    /// Suspends for the duration, then migrates the contribution.
    ///
    /// Under [`TimedCancellation::RunToCompletion`] cancellation does not cut
    /// the wait short. Under [`TimedCancellation::Interrupt`] it does, and the
    /// contribution is reverted instead.
    pub async fn finish(self) -> TimedOutcome {
        let interrupted = match self.mode {
            TimedCancellation::RunToCompletion => {
                tokio::time::sleep(self.duration).await;
                false
            }
            TimedCancellation::Interrupt => {
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => true,
                    _ = tokio::time::sleep(self.duration) => false,
                }
            }
        };

        if interrupted {
            self.stat.interrupt(self.id);
            TimedOutcome::Interrupted
        } else {
            self.stat.complete(self.id, self.contribution, self.mode)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stat_core::ModifierKind;

    const SRC: SourceId = SourceId::new(1);

    fn recorder(stat: &StatValue) -> Arc<Mutex<Vec<f64>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        stat.subscribe(move |v| sink.lock().push(v));
        seen
    }

    #[test]
    fn notifies_once_per_mutation() {
        let stat = StatValue::with_bounds("str", 10.0, 0.0, 100.0);
        let seen = recorder(&stat);

        stat.add_modifier(ModifierRecord::flat(5.0, SRC));
        stat.set_base(20.0);
        stat.set_base(20.0);
        assert!(stat.remove_all_from_source(SRC));
        assert!(!stat.remove_all_from_source(SRC));

        assert_eq!(*seen.lock(), vec![15.0, 25.0, 20.0]);
    }

    #[test]
    fn has_modifier_ignores_other_sources() {
        let stat = StatValue::with_bounds("dex", 10.0, 0.0, 100.0);
        stat.add_modifier(ModifierRecord::new(
            2.0,
            ModifierKind::Flat,
            SourceId::new(99),
        ));
        assert!(!stat.has_modifier_from_source(SRC));
        assert!(stat.has_modifier_from_source(SourceId::new(99)));
    }

    #[tokio::test(start_paused = true)]
    async fn timed_contribution_migrates_when_clock_runs_out() {
        let stat = Arc::new(StatValue::with_bounds("hp", 10.0, 0.0, 100.0));
        let wait = stat.start_timed_modifier(
            ModifierRecord::flat(5.0, SRC),
            Duration::from_secs(1),
            None,
        );

        assert_eq!(stat.value(), 15.0);
        assert_eq!(stat.temporary(), 5.0);
        assert!(stat.has_timed_from_source(SRC));
        assert!(!stat.has_modifier_from_source(SRC));

        assert_eq!(wait.finish().await, TimedOutcome::Elapsed);
        assert_eq!(stat.value(), 15.0);
        assert_eq!(stat.temporary(), 0.0);
        assert_eq!(stat.permanent(), 5.0);
        assert_eq!(stat.timed_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn run_to_completion_still_migrates_after_removal() {
        let stat = Arc::new(StatValue::with_bounds("hp", 10.0, 0.0, 100.0));
        let wait = stat.start_timed_modifier(
            ModifierRecord::flat(5.0, SRC),
            Duration::from_secs(1),
            None,
        );

        assert!(stat.remove_all_from_source(SRC));
        assert!(wait.cancel_token().is_cancelled());
        assert_eq!(stat.value(), 15.0);

        assert_eq!(wait.finish().await, TimedOutcome::Elapsed);
        assert_eq!(stat.permanent(), 5.0);
        assert_eq!(stat.value(), 15.0);
    }

    #[tokio::test(start_paused = true)]
    async fn interrupt_reverts_on_removal() {
        let stat = Arc::new(
            StatValue::with_bounds("hp", 10.0, 0.0, 100.0)
                .with_cancellation(TimedCancellation::Interrupt),
        );
        let wait = stat.start_timed_modifier(
            ModifierRecord::flat(5.0, SRC),
            Duration::from_secs(60),
            None,
        );
        assert_eq!(stat.value(), 15.0);

        assert!(stat.remove_all_from_source(SRC));
        assert_eq!(stat.value(), 10.0);

        let started = tokio::time::Instant::now();
        assert_eq!(wait.finish().await, TimedOutcome::Interrupted);
        assert!(started.elapsed() < Duration::from_secs(60));
        assert_eq!(stat.permanent(), 0.0);
        assert_eq!(stat.value(), 10.0);
    }

    #[tokio::test(start_paused = true)]
    async fn explicit_mode_overrides_the_stat_default() {
        let stat = Arc::new(StatValue::with_bounds("hp", 10.0, 0.0, 100.0));
        let wait = stat.start_timed_modifier_with(
            ModifierRecord::flat(5.0, SRC),
            Duration::from_secs(30),
            None,
            TimedCancellation::Interrupt,
        );
        assert_eq!(stat.cancellation(), TimedCancellation::RunToCompletion);
        assert_eq!(wait.mode(), TimedCancellation::Interrupt);

        assert!(stat.remove_all_from_source(SRC));
        assert_eq!(stat.value(), 10.0);
        assert_eq!(wait.finish().await, TimedOutcome::Interrupted);
        assert_eq!(stat.permanent(), 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn interrupt_via_parent_token() {
        let stat = Arc::new(
            StatValue::with_bounds("hp", 10.0, 0.0, 100.0)
                .with_cancellation(TimedCancellation::Interrupt),
        );
        let parent = CancelToken::new();
        let wait = stat.start_timed_modifier(
            ModifierRecord::percent_add(0.5, SRC),
            Duration::from_secs(5),
            Some(&parent),
        );
        assert_eq!(stat.value(), 15.0);

        parent.cancel();
        assert_eq!(wait.finish().await, TimedOutcome::Interrupted);
        assert_eq!(stat.value(), 10.0);
        assert_eq!(stat.timed_count(), 0);
    }
}
