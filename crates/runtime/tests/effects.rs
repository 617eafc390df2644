//! Effect lifecycle scenarios driven on virtual time.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use runtime::{
    ApplyOutcome, EffectApplier, Event, LifecycleEvent, LoopEnd, RuntimeConfig, StatValue,
    TickEvent, Topic,
};
use stat_core::{
    DuplicateHandling, EffectConfig, EffectDefinition, EffectPhase, ModifierKind,
    PreventPeriodic, TimedCancellation,
};
use tokio::sync::broadcast;

fn hp(base: f64) -> Arc<StatValue> {
    Arc::new(StatValue::with_bounds("hp", base, 0.0, 1000.0))
}

async fn advance(secs: f64) {
    tokio::time::sleep(Duration::from_secs_f64(secs)).await;
}

fn drain(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Periodic damage: `value` every `interval` seconds, `count` times.
fn poison(value: f64, interval: f64, count: u32) -> EffectDefinition {
    EffectDefinition::new("poison", "hp", value, ModifierKind::Flat)
        .permanent(false)
        .ticking(interval, count)
}

#[tokio::test(start_paused = true)]
async fn timed_modifier_migrates_to_permanent() {
    let applier = EffectApplier::default();
    let stat = hp(10.0);
    let buff = EffectDefinition::new("buff", "hp", 5.0, ModifierKind::Flat).timed(1.0);

    assert_eq!(applier.apply_effect(&buff, &stat), ApplyOutcome::Applied);
    assert_eq!(stat.value(), 15.0);
    assert_eq!(applier.phase(&buff, &stat), EffectPhase::Active);

    advance(1.5).await;
    assert_eq!(stat.value(), 15.0);
    assert_eq!(stat.temporary(), 0.0);
    assert_eq!(stat.permanent(), 5.0);
    assert_eq!(applier.phase(&buff, &stat), EffectPhase::Idle);
}

#[test]
fn stacking_scales_until_the_cap() {
    let applier = EffectApplier::default();
    let stat = hp(100.0);
    let rage = EffectDefinition::new("rage", "hp", 10.0, ModifierKind::Flat).stacking(3, 0.5);

    let mut seen = Vec::new();
    for _ in 0..4 {
        let outcome = applier.apply_effect(&rage, &stat);
        seen.push((outcome, stat.value()));
    }

    assert_eq!(
        seen,
        vec![
            (ApplyOutcome::Applied, 110.0),
            (ApplyOutcome::Applied, 115.0),
            (ApplyOutcome::Applied, 120.0),
            (ApplyOutcome::StackCapped, 120.0),
        ]
    );
    assert_eq!(applier.stacks(&rage, &stat), 3);
    assert_eq!(stat.modifiers().len(), 1);
    assert_eq!(
        applier.phase(&rage, &stat),
        EffectPhase::Stacked {
            stacks: 3,
            ticking: false
        }
    );
}

#[test]
fn refresh_keeps_one_modifier_where_allow_accumulates() {
    let applier = EffectApplier::default();
    let allow_stat = hp(10.0);
    let refresh_stat = hp(10.0);
    let allow = EffectDefinition::new("ward", "hp", 5.0, ModifierKind::Flat);
    let refresh = allow.clone().handling(DuplicateHandling::Refresh);

    applier.apply_effect(&allow, &allow_stat);
    applier.apply_effect(&refresh, &refresh_stat);
    assert_eq!(allow_stat.value(), refresh_stat.value());

    applier.apply_effect(&allow, &allow_stat);
    applier.apply_effect(&refresh, &refresh_stat);
    assert_eq!(allow_stat.value(), 20.0);
    assert_eq!(allow_stat.modifiers().len(), 2);
    assert_eq!(refresh_stat.value(), 15.0);
    assert_eq!(refresh_stat.modifiers().len(), 1);
}

#[test]
fn prevent_reports_suppression() {
    let applier = EffectApplier::default();
    let mut lifecycle = applier.subscribe(Topic::Lifecycle);
    let stat = hp(10.0);
    let aura = EffectDefinition::new("aura", "hp", 1.0, ModifierKind::Flat)
        .handling(DuplicateHandling::Prevent);

    assert_eq!(applier.apply_effect(&aura, &stat), ApplyOutcome::Applied);
    assert_eq!(
        applier.apply_effect(&aura, &stat),
        ApplyOutcome::SuppressedDuplicate
    );
    assert_eq!(stat.value(), 11.0);

    let events = drain(&mut lifecycle);
    assert_eq!(
        events.last(),
        Some(&Event::Lifecycle(LifecycleEvent::Suppressed {
            effect: "aura".into(),
            stat: "hp".into(),
        }))
    );
}

#[test]
fn prevent_applies_again_once_the_modifier_is_removed() {
    let applier = EffectApplier::default();
    let stat = hp(10.0);
    let aura = EffectDefinition::new("aura", "hp", 3.0, ModifierKind::Flat)
        .handling(DuplicateHandling::Prevent);

    assert_eq!(applier.apply_effect(&aura, &stat), ApplyOutcome::Applied);
    assert!(stat.remove_all_from_source(aura.source()));
    assert_eq!(stat.value(), 10.0);

    assert_eq!(applier.apply_effect(&aura, &stat), ApplyOutcome::Applied);
    assert_eq!(stat.value(), 13.0);
    assert_eq!(
        applier.apply_effect(&aura, &stat),
        ApplyOutcome::SuppressedDuplicate
    );
}

#[tokio::test(start_paused = true)]
async fn refresh_restarts_the_tick_clock() {
    let applier = EffectApplier::default();
    let stat = hp(100.0);
    let poison = poison(-5.0, 1.0, 3).handling(DuplicateHandling::Refresh);

    applier.apply_effect(&poison, &stat);
    advance(1.5).await;
    assert_eq!(applier.completed_ticks(&poison, &stat), 1);
    assert_eq!(stat.value(), 90.0);

    assert_eq!(applier.apply_effect(&poison, &stat), ApplyOutcome::Applied);
    assert_eq!(applier.completed_ticks(&poison, &stat), 0);

    // The old loop's in-flight tick still lands but no longer counts.
    advance(0.1).await;
    assert_eq!(stat.value(), 85.0);
    advance(1.4).await;
    assert_eq!(applier.completed_ticks(&poison, &stat), 1);
    assert_eq!(stat.value(), 80.0);

    advance(5.0).await;
    assert_eq!(applier.completed_ticks(&poison, &stat), 3);
    assert_eq!(stat.value(), 75.0);
    assert_eq!(applier.phase(&poison, &stat), EffectPhase::Idle);
}

#[tokio::test(start_paused = true)]
async fn permanent_periodic_effects_tick_until_removed() {
    let applier = EffectApplier::default();
    let stat = hp(100.0);
    let regen = EffectDefinition::new("regen", "hp", 1.0, ModifierKind::Flat)
        .permanent(true)
        .ticking(1.0, 2)
        .handling(DuplicateHandling::Refresh);

    assert_eq!(applier.apply_effect(&regen, &stat), ApplyOutcome::Applied);
    advance(10.5).await;
    assert_eq!(applier.completed_ticks(&regen, &stat), 10);
    assert_eq!(applier.phase(&regen, &stat), EffectPhase::Ticking);
    assert_eq!(stat.value(), 111.0);

    assert!(applier.remove_effect(&regen, &stat));
    advance(5.0).await;
    assert_eq!(stat.value(), 111.0);
    assert_eq!(stat.timed_count(), 0);
    assert_eq!(applier.phase(&regen, &stat), EffectPhase::Idle);
}

#[tokio::test(start_paused = true)]
async fn tick_loop_runs_its_count_and_ends() {
    let applier = EffectApplier::default();
    let mut ticks = applier.subscribe(Topic::Ticks);
    let stat = hp(100.0);
    let poison = poison(-5.0, 1.0, 3).handling(DuplicateHandling::Refresh);

    assert_eq!(applier.apply_effect(&poison, &stat), ApplyOutcome::Applied);
    assert_eq!(applier.phase(&poison, &stat), EffectPhase::Ticking);

    advance(0.5).await;
    assert_eq!(stat.value(), 95.0);
    advance(1.0).await;
    assert_eq!(stat.value(), 90.0);
    assert_eq!(applier.completed_ticks(&poison, &stat), 1);

    advance(2.0).await;
    assert_eq!(stat.value(), 85.0);
    assert_eq!(stat.temporary(), 0.0);
    assert_eq!(applier.completed_ticks(&poison, &stat), 3);
    assert_eq!(applier.phase(&poison, &stat), EffectPhase::Idle);

    let events = drain(&mut ticks);
    let numbers: Vec<u32> = events
        .iter()
        .filter_map(|event| match event {
            Event::Tick(TickEvent::Completed { tick, .. }) => Some(*tick),
            _ => None,
        })
        .collect();
    assert_eq!(numbers, vec![1, 2, 3]);
    assert!(matches!(
        events.last(),
        Some(Event::Tick(TickEvent::LoopEnded {
            reason: LoopEnd::Exhausted,
            ..
        }))
    ));
}

#[tokio::test(start_paused = true)]
async fn stacking_a_periodic_effect_replaces_its_loop() {
    let applier = EffectApplier::default();
    let stat = hp(100.0);
    let venom = poison(-2.0, 1.0, 4).stacking(3, 1.0);

    applier.apply_effect(&venom, &stat);
    advance(0.5).await;
    applier.apply_effect(&venom, &stat);
    assert_eq!(applier.stacks(&venom, &stat), 2);

    // The first loop's in-flight tick still lands at 1.0s and counts toward
    // the shared total; the replacement deals -4 per tick until four ticks.
    advance(4.5).await;
    assert_eq!(applier.completed_ticks(&venom, &stat), 4);
    assert_eq!(stat.value(), 100.0 - 2.0 - 4.0 * 3.0);
    assert_eq!(
        applier.phase(&venom, &stat),
        EffectPhase::Stacked {
            stacks: 2,
            ticking: false
        }
    );
}

#[tokio::test(start_paused = true)]
async fn removal_stops_orphaned_prevent_loops() {
    let applier = EffectApplier::default();
    let mut ticks = applier.subscribe(Topic::Ticks);
    let stat = hp(100.0);
    let bleed = EffectDefinition::new("bleed", "hp", -1.0, ModifierKind::Flat)
        .ticking(1.0, 0)
        .handling(DuplicateHandling::Prevent);

    assert_eq!(applier.apply_effect(&bleed, &stat), ApplyOutcome::Applied);
    assert_eq!(applier.apply_effect(&bleed, &stat), ApplyOutcome::Applied);

    advance(0.5).await;
    assert_eq!(stat.value(), 98.0);

    assert!(applier.remove_effect(&bleed, &stat));
    assert!(!applier.remove_effect(&bleed, &stat));
    assert_eq!(applier.phase(&bleed, &stat), EffectPhase::Idle);

    // In-flight ticks run to completion and keep their contribution.
    advance(5.0).await;
    assert_eq!(stat.value(), 98.0);
    assert_eq!(stat.timed_count(), 0);

    let ended = drain(&mut ticks)
        .into_iter()
        .filter(|event| {
            matches!(
                event,
                Event::Tick(TickEvent::LoopEnded {
                    reason: LoopEnd::Cancelled,
                    ..
                })
            )
        })
        .count();
    assert_eq!(ended, 2);
}

#[tokio::test(start_paused = true)]
async fn interrupt_mode_reverts_on_removal() {
    let config = RuntimeConfig::default().with_effects(EffectConfig::strict());
    let applier = EffectApplier::new(&config);
    let stat = hp(10.0);
    let buff = EffectDefinition::new("buff", "hp", 5.0, ModifierKind::Flat).timed(10.0);
    assert_eq!(stat.cancellation(), TimedCancellation::RunToCompletion);

    applier.apply_effect(&buff, &stat);
    advance(1.0).await;
    assert_eq!(stat.value(), 15.0);

    assert!(applier.remove_effect(&buff, &stat));
    assert_eq!(stat.value(), 10.0);

    advance(20.0).await;
    assert_eq!(stat.value(), 10.0);
    assert_eq!(stat.permanent(), 0.0);
}

#[tokio::test(start_paused = true)]
async fn cancel_and_replace_interrupts_the_previous_loop() {
    let config = RuntimeConfig::default()
        .with_timed_cancellation(TimedCancellation::Interrupt)
        .with_prevent_periodic(PreventPeriodic::CancelAndReplace);
    let applier = EffectApplier::new(&config);
    let mut ticks = applier.subscribe(Topic::Ticks);
    let stat = Arc::new(StatValue::with_bounds("hp", 100.0, 0.0, 100.0));
    let burn = poison(-5.0, 1.0, 5).handling(DuplicateHandling::Prevent);

    applier.apply_effect(&burn, &stat);
    advance(0.5).await;
    applier.apply_effect(&burn, &stat);

    advance(0.1).await;
    assert_eq!(stat.value(), 95.0);

    advance(10.0).await;
    assert_eq!(applier.completed_ticks(&burn, &stat), 5);
    assert_eq!(stat.value(), 75.0);

    let reasons: Vec<LoopEnd> = drain(&mut ticks)
        .into_iter()
        .filter_map(|event| match event {
            Event::Tick(TickEvent::LoopEnded { reason, .. }) => Some(reason),
            _ => None,
        })
        .collect();
    assert_eq!(reasons, vec![LoopEnd::Interrupted, LoopEnd::Exhausted]);
}

#[tokio::test(start_paused = true)]
async fn allow_ignores_the_tick_interval() {
    let applier = EffectApplier::default();
    let stat = hp(100.0);
    let sting = poison(-1.0, 1.0, 2).timed(3.0);

    applier.apply_effect(&sting, &stat);
    advance(0.5).await;
    applier.apply_effect(&sting, &stat);
    assert_eq!(stat.value(), 98.0);
    assert_eq!(applier.phase(&sting, &stat), EffectPhase::Active);

    advance(5.0).await;
    assert_eq!(stat.value(), 98.0);
    assert_eq!(stat.permanent(), -2.0);
    assert_eq!(applier.completed_ticks(&sting, &stat), 0);
    assert_eq!(applier.phase(&sting, &stat), EffectPhase::Idle);
}

#[tokio::test(start_paused = true)]
async fn subscribers_hear_every_value_change() {
    let applier = EffectApplier::default();
    let stat = hp(10.0);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let token = stat.subscribe(move |value| sink.lock().push(value));

    let buff = EffectDefinition::new("buff", "hp", 5.0, ModifierKind::Flat).timed(1.0);
    applier.apply_effect(&buff, &stat);
    advance(2.0).await;

    assert!(stat.unsubscribe(token));
    stat.set_base(50.0);

    assert_eq!(*seen.lock(), vec![15.0, 15.0]);
}
