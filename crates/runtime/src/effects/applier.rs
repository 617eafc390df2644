//! Duplicate-handling executor.
//!
//! [`EffectApplier`] owns every effect instance and drives the transition
//! tables from `stat-core`. Applying an effect runs in two phases: the
//! transition is decided and its instance-local steps are applied under the
//! instance lock, then the stat-facing actions run with no lock held, in
//! step order. Value-changed handlers can therefore call back into the
//! applier without deadlocking.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use stat_core::{
    EffectConfig, EffectDefinition, EffectPhase, PolicyInput, SourceId, Step, Transition,
    Verdict, table_for,
};
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use super::instance::{EffectInstance, InstanceKey, bare_phase};
use super::tick::TickLoop;
use crate::api::{ApplyOutcome, NotApplicable};
use crate::cancel::CancelToken;
use crate::config::RuntimeConfig;
use crate::events::{Event, EventBus, LifecycleEvent, Topic};
use crate::stat::StatValue;

pub(crate) struct Shared {
    pub(crate) config: EffectConfig,
    instances: Mutex<HashMap<InstanceKey, EffectInstance>>,
    pub(crate) events: EventBus,
    generations: AtomicU64,
}

impl Shared {
    fn next_generation(&self) -> u64 {
        self.generations.fetch_add(1, Ordering::Relaxed)
    }

    pub(crate) fn completed_ticks(&self, key: InstanceKey, generation: u64) -> Option<u32> {
        self.instances
            .lock()
            .get(&key)
            .filter(|instance| instance.generation == generation)
            .map(|instance| instance.completed_ticks)
    }

    /// Counts a finished tick; `None` when the instance was torn down since.
    pub(crate) fn record_tick(&self, key: InstanceKey, generation: u64) -> Option<u32> {
        let mut instances = self.instances.lock();
        let instance = instances
            .get_mut(&key)
            .filter(|instance| instance.generation == generation)?;
        instance.completed_ticks += 1;
        Some(instance.completed_ticks)
    }

    pub(crate) fn loop_finished(&self, key: InstanceKey, generation: u64, token: &CancelToken) {
        let mut instances = self.instances.lock();
        let Some(instance) = instances
            .get_mut(&key)
            .filter(|instance| instance.generation == generation)
        else {
            return;
        };
        instance.live_loops = instance.live_loops.saturating_sub(1);
        if instance
            .tick_cancel
            .as_ref()
            .is_some_and(|current| current.same(token))
        {
            instance.tick_cancel = None;
        }
        if instance.is_disposable() {
            instances.remove(&key);
        }
    }

    /// Clears the permanent modifiers `apply_effect` planned once they are on
    /// the stat, and drops the instance if nothing is left to track.
    fn settle(&self, key: InstanceKey, generation: u64, applied: u32) {
        let mut instances = self.instances.lock();
        let Some(instance) = instances.get_mut(&key) else {
            return;
        };
        if instance.generation == generation {
            instance.pending_static = instance.pending_static.saturating_sub(applied);
        }
        if instance.is_disposable() {
            instances.remove(&key);
        }
    }
}

/// Stat-facing work decided under the instance lock, run after it is released.
enum Action {
    RemoveSource,
    Apply { stacks: u32, parent: CancelToken },
    Spawn(TickLoop),
}

/// Applies and removes effects on live stats.
///
/// Cloning is cheap; clones share instances and the event bus.
#[derive(Clone)]
pub struct EffectApplier {
    shared: Arc<Shared>,
}

impl EffectApplier {
    pub fn new(config: &RuntimeConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                config: config.effects,
                instances: Mutex::new(HashMap::new()),
                events: EventBus::with_capacity(config.event_buffer_size),
                generations: AtomicU64::new(1),
            }),
        }
    }

    pub fn config(&self) -> EffectConfig {
        self.shared.config
    }

    pub fn events(&self) -> &EventBus {
        &self.shared.events
    }

    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.shared.events.subscribe(topic)
    }

    /// Applies `definition` to `stat` under its duplicate-handling policy.
    ///
    /// Timed waits and tick loops are spawned onto the current tokio runtime;
    /// this call itself never suspends.
    pub fn apply_effect(
        &self,
        definition: &EffectDefinition,
        stat: &Arc<StatValue>,
    ) -> ApplyOutcome {
        if let Err(error) = definition.validate() {
            warn!(
                target: "runtime::effects",
                effect = %definition.name,
                %error,
                "rejecting invalid effect definition"
            );
            return NotApplicable::InvalidDefinition(error).into();
        }

        let handle = if definition.needs_timer() {
            match Handle::try_current() {
                Ok(handle) => Some(handle),
                Err(_) => {
                    warn!(
                        target: "runtime::effects",
                        effect = %definition.name,
                        "timed effect applied outside a tokio runtime"
                    );
                    return NotApplicable::NoRuntime(definition.name.clone()).into();
                }
            }
        } else {
            None
        };

        let source = definition.source();
        let key = InstanceKey::new(source, stat);
        let (transition, actions, generation) = {
            let mut instances = self.shared.instances.lock();
            if !instances.contains_key(&key) {
                instances.retain(|_, instance| !instance.is_disposable());
            }
            let instance = instances.entry(key).or_insert_with(|| {
                EffectInstance::new(self.shared.next_generation(), Arc::downgrade(stat))
            });

            let input = PolicyInput {
                phase: instance.phase(stat, source),
                stacks: instance.stacks,
                max_stacks: definition.max_stacks,
                periodic: definition.is_periodic(),
                // The stat decides; `pending_static` only covers permanent
                // modifiers another call has planned but not yet added.
                has_static_modifier: instance.pending_static > 0
                    || stat.has_modifier_from_source(source),
                prevent_periodic: self.shared.config.prevent_periodic,
            };
            let transition = table_for(definition.duplicate_handling).transition(&input);
            let actions = self.plan(instance, key, &transition, definition, stat);
            (transition, actions, instance.generation)
        };

        let mut applied_static = 0;
        for action in actions {
            match action {
                Action::RemoveSource => {
                    stat.remove_all_from_source(source);
                }
                Action::Apply { stacks, parent } => {
                    let record = definition.create_modifier(stacks);
                    match &handle {
                        Some(handle) if !definition.is_permanent => {
                            let wait = stat.start_timed_modifier_with(
                                record,
                                definition.duration(),
                                Some(&parent),
                                self.shared.config.timed_cancellation,
                            );
                            handle.spawn(wait.finish());
                        }
                        _ => {
                            stat.add_modifier(record);
                            applied_static += 1;
                        }
                    }
                }
                Action::Spawn(tick_loop) => {
                    if let Some(handle) = &handle {
                        handle.spawn(tick_loop.run());
                    }
                }
            }
        }
        self.shared.settle(key, generation, applied_static);

        self.report(definition, stat, &transition);
        transition.verdict.into()
    }

    /// Resolves the transition's steps against the instance.
    fn plan(
        &self,
        instance: &mut EffectInstance,
        key: InstanceKey,
        transition: &Transition,
        definition: &EffectDefinition,
        stat: &Arc<StatValue>,
    ) -> Vec<Action> {
        let mut actions = Vec::new();
        for step in &transition.steps {
            match *step {
                Step::Teardown => {
                    instance.teardown(self.shared.next_generation());
                    actions.push(Action::RemoveSource);
                }
                Step::CancelTickLoop => {
                    if let Some(token) = instance.tick_cancel.take() {
                        token.cancel();
                    }
                }
                Step::RemoveSourceModifiers => actions.push(Action::RemoveSource),
                Step::SetStacks(stacks) => instance.stacks = stacks,
                Step::ApplyModifier { stacks } => {
                    if definition.is_permanent {
                        instance.pending_static += 1;
                    }
                    actions.push(Action::Apply {
                        stacks,
                        parent: instance.total_cancel.clone(),
                    });
                }
                Step::StartTickLoop { stacks } => {
                    let tick_loop = self.tick_loop(instance, key, definition, stat, stacks);
                    // Replaces without cancelling; a prior loop stays reachable
                    // through `total_cancel`.
                    instance.tick_cancel = Some(tick_loop.token.clone());
                    actions.push(Action::Spawn(tick_loop));
                }
            }
        }
        actions
    }

    /// Builds a loop under the instance's effect-wide token and counts it live.
    fn tick_loop(
        &self,
        instance: &mut EffectInstance,
        key: InstanceKey,
        definition: &EffectDefinition,
        stat: &Arc<StatValue>,
        stacks: u32,
    ) -> TickLoop {
        instance.live_loops += 1;
        TickLoop {
            shared: Arc::clone(&self.shared),
            definition: definition.clone(),
            stat: Arc::clone(stat),
            key,
            generation: instance.generation,
            stacks,
            token: instance.total_cancel.child(),
        }
    }

    fn report(&self, definition: &EffectDefinition, stat: &StatValue, transition: &Transition) {
        let stacks = transition.next.stacks();
        debug!(
            target: "runtime::effects",
            effect = %definition.name,
            stat = %stat.id(),
            verdict = ?transition.verdict,
            stacks,
            "effect application resolved"
        );

        let effect = definition.name.clone();
        let stat = stat.id().to_owned();
        let event = match transition.verdict {
            Verdict::Applied => LifecycleEvent::Applied {
                effect,
                stat,
                stacks,
            },
            Verdict::SuppressedDuplicate => LifecycleEvent::Suppressed { effect, stat },
            Verdict::StackCapped => LifecycleEvent::StackCapped {
                effect,
                stat,
                stacks,
            },
        };
        self.shared.events.publish(event);
    }

    /// Tears the effect down on `stat`: cancels its loops and waits, removes
    /// every modifier it owns, and resets the instance.
    ///
    /// Returns whether anything was torn down. Calling it again, or on a pair
    /// that was never applied, is a no-op returning `false`.
    pub fn remove_effect(&self, definition: &EffectDefinition, stat: &StatValue) -> bool {
        self.remove_source(definition.source(), &definition.name, stat)
    }

    fn remove_source(&self, source: SourceId, effect: &str, stat: &StatValue) -> bool {
        let instance = self
            .shared
            .instances
            .lock()
            .remove(&InstanceKey::new(source, stat));
        let had_state = instance.as_ref().is_some_and(|instance| {
            instance.cancel_all();
            !instance.is_quiet()
        });
        let removed = stat.remove_all_from_source(source);

        if !(had_state || removed) {
            return false;
        }
        debug!(target: "runtime::effects", effect, stat = %stat.id(), "effect removed");
        self.shared.events.publish(LifecycleEvent::Removed {
            effect: effect.to_owned(),
            stat: stat.id().to_owned(),
        });
        true
    }

    pub fn phase(&self, definition: &EffectDefinition, stat: &StatValue) -> EffectPhase {
        let source = definition.source();
        match self.shared.instances.lock().get(&InstanceKey::new(source, stat)) {
            Some(instance) => instance.phase(stat, source),
            None => bare_phase(stat, source),
        }
    }

    pub fn stacks(&self, definition: &EffectDefinition, stat: &StatValue) -> u32 {
        self.with_instance(definition, stat, |instance| instance.stacks)
    }

    pub fn completed_ticks(&self, definition: &EffectDefinition, stat: &StatValue) -> u32 {
        self.with_instance(definition, stat, |instance| instance.completed_ticks)
    }

    fn with_instance(
        &self,
        definition: &EffectDefinition,
        stat: &StatValue,
        read: impl FnOnce(&EffectInstance) -> u32,
    ) -> u32 {
        self.shared
            .instances
            .lock()
            .get(&InstanceKey::new(definition.source(), stat))
            .map_or(0, read)
    }

    #[cfg(test)]
    fn instance_count(&self) -> usize {
        self.shared.instances.lock().len()
    }
}

impl Default for EffectApplier {
    fn default() -> Self {
        Self::new(&RuntimeConfig::default())
    }
}
