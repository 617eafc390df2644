//! Duplicate-handling state machine.
//!
//! Each `(effect, stat)` pair sits in one [`EffectPhase`]. Applying the effect
//! again consults the transition table of its [`DuplicateHandling`] policy,
//! which answers with a [`Transition`]: a verdict, the ordered steps the
//! runtime must execute, and the phase the pair ends up in.
//!
//! ```text
//! Allow    any          → ApplyModifier                             (tick interval ignored)
//! Prevent  static held  → Suppressed
//!          otherwise    → ApplyModifier
//!          periodic     → [CancelTickLoop?] StartTickLoop           (see PreventPeriodic)
//! Stack    n < max      → SetStacks(n+1), rebuild at n+1
//!          n = max      → SetStacks(max), rebuild at max, StackCapped
//! Refresh  any          → Teardown, then apply from scratch
//! ```
//!
//! Tables are pure: they never touch a stat, so each policy can be tested on
//! its own.

use crate::config::PreventPeriodic;
use crate::definition::DuplicateHandling;

/// Observable lifecycle phase of one `(effect, stat)` pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EffectPhase {
    Idle,
    /// A modifier or timed wait is outstanding; no tick loop.
    Active,
    /// A tick loop is running.
    Ticking,
    /// The instance carries `stacks` stacks, possibly with a tick loop.
    Stacked { stacks: u32, ticking: bool },
}

impl EffectPhase {
    pub fn stacks(&self) -> u32 {
        match self {
            Self::Stacked { stacks, .. } => *stacks,
            _ => 0,
        }
    }
}

/// Everything a table may consult when deciding a transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PolicyInput {
    pub phase: EffectPhase,
    pub stacks: u32,
    pub max_stacks: u32,
    pub periodic: bool,
    /// A static (non-timed) modifier from this effect is on the stat.
    pub has_static_modifier: bool,
    pub prevent_periodic: PreventPeriodic,
}

/// One instruction for the runtime, executed in order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// Cancel every loop and wait, remove all of the source's modifiers,
    /// and reset stacks and completed ticks to zero.
    Teardown,
    /// Cancel the loop currently tracked by the instance.
    CancelTickLoop,
    /// Remove every modifier of the source from the stat.
    RemoveSourceModifiers,
    SetStacks(u32),
    /// Apply one modifier scaled for `stacks`: permanent or timed, per definition.
    ApplyModifier { stacks: u32 },
    /// Start a tick loop scaled for `stacks` and track it in the instance.
    StartTickLoop { stacks: u32 },
}

/// Caller-facing result of a transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Verdict {
    Applied,
    SuppressedDuplicate,
    StackCapped,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transition {
    pub verdict: Verdict,
    pub steps: Vec<Step>,
    pub next: EffectPhase,
}

impl Transition {
    fn applied(steps: Vec<Step>, next: EffectPhase) -> Self {
        Self {
            verdict: Verdict::Applied,
            steps,
            next,
        }
    }
}

/// Transition table of one duplicate-handling policy.
pub trait TransitionTable: Send + Sync {
    fn policy(&self) -> DuplicateHandling;

    fn transition(&self, input: &PolicyInput) -> Transition;
}

fn fresh_phase(periodic: bool) -> EffectPhase {
    if periodic {
        EffectPhase::Ticking
    } else {
        EffectPhase::Active
    }
}

/// Every application is fresh and independent.
///
/// Allow never runs a tick loop: a periodic definition still contributes one
/// modifier (timed or permanent) per application.
#[derive(Clone, Copy, Debug, Default)]
pub struct AllowTable;

impl TransitionTable for AllowTable {
    fn policy(&self) -> DuplicateHandling {
        DuplicateHandling::Allow
    }

    fn transition(&self, _input: &PolicyInput) -> Transition {
        Transition::applied(vec![Step::ApplyModifier { stacks: 1 }], EffectPhase::Active)
    }
}

/// Rejects reapplication while a static modifier from the effect is present.
///
/// Periodic effects are exempt from the check; see [`PreventPeriodic`].
#[derive(Clone, Copy, Debug, Default)]
pub struct PreventTable;

impl TransitionTable for PreventTable {
    fn policy(&self) -> DuplicateHandling {
        DuplicateHandling::Prevent
    }

    fn transition(&self, input: &PolicyInput) -> Transition {
        if input.periodic {
            let steps = match input.prevent_periodic {
                PreventPeriodic::SpawnIndependent => vec![Step::StartTickLoop { stacks: 1 }],
                PreventPeriodic::CancelAndReplace => {
                    vec![Step::CancelTickLoop, Step::StartTickLoop { stacks: 1 }]
                }
            };
            return Transition::applied(steps, EffectPhase::Ticking);
        }

        if input.has_static_modifier {
            return Transition {
                verdict: Verdict::SuppressedDuplicate,
                steps: Vec::new(),
                next: input.phase,
            };
        }

        Transition::applied(vec![Step::ApplyModifier { stacks: 1 }], EffectPhase::Active)
    }
}

/// Adds a stack up to the cap and rebuilds the contribution at the new count.
#[derive(Clone, Copy, Debug, Default)]
pub struct StackTable;

impl TransitionTable for StackTable {
    fn policy(&self) -> DuplicateHandling {
        DuplicateHandling::Stack
    }

    fn transition(&self, input: &PolicyInput) -> Transition {
        let max = input.max_stacks.max(1);
        let capped = input.stacks >= max;
        let stacks = if capped { max } else { input.stacks + 1 };

        let mut steps = vec![Step::SetStacks(stacks)];
        if input.periodic {
            steps.push(Step::CancelTickLoop);
            steps.push(Step::StartTickLoop { stacks });
        } else {
            steps.push(Step::RemoveSourceModifiers);
            steps.push(Step::ApplyModifier { stacks });
        }

        Transition {
            verdict: if capped {
                Verdict::StackCapped
            } else {
                Verdict::Applied
            },
            steps,
            next: EffectPhase::Stacked {
                stacks,
                ticking: input.periodic,
            },
        }
    }
}

/// Tears everything down and reapplies from scratch.
#[derive(Clone, Copy, Debug, Default)]
pub struct RefreshTable;

impl TransitionTable for RefreshTable {
    fn policy(&self) -> DuplicateHandling {
        DuplicateHandling::Refresh
    }

    fn transition(&self, input: &PolicyInput) -> Transition {
        let rebuild = if input.periodic {
            Step::StartTickLoop { stacks: 1 }
        } else {
            Step::ApplyModifier { stacks: 1 }
        };
        Transition::applied(vec![Step::Teardown, rebuild], fresh_phase(input.periodic))
    }
}

/// Returns the transition table for a policy.
pub fn table_for(policy: DuplicateHandling) -> &'static dyn TransitionTable {
    match policy {
        DuplicateHandling::Allow => &AllowTable,
        DuplicateHandling::Prevent => &PreventTable,
        DuplicateHandling::Stack => &StackTable,
        DuplicateHandling::Refresh => &RefreshTable,
    }
}
