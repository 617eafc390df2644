//! Event types for different topics.

use serde::{Deserialize, Serialize};

/// Events about an effect instance's lifecycle on one stat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LifecycleEvent {
    /// The effect was applied (or reapplied) to the stat.
    Applied {
        effect: String,
        stat: String,
        /// Stack count after the application; 0 for non-stacking policies.
        stacks: u32,
    },

    /// A `Prevent` effect was rejected because it is already active.
    Suppressed { effect: String, stat: String },

    /// A `Stack` effect was reapplied at its cap.
    StackCapped {
        effect: String,
        stat: String,
        stacks: u32,
    },

    /// `remove_effect` tore the instance down.
    Removed { effect: String, stat: String },
}

/// Why a tick loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoopEnd {
    /// All configured ticks ran.
    Exhausted,
    /// The loop's token was cancelled between ticks.
    Cancelled,
    /// A tick's wait was cut short by cancellation.
    Interrupted,
}

/// Events emitted by running tick loops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TickEvent {
    /// One tick elapsed and its contribution migrated.
    Completed {
        effect: String,
        stat: String,
        /// 1-based tick number within the loop.
        tick: u32,
    },

    /// A tick loop exited.
    LoopEnded {
        effect: String,
        stat: String,
        reason: LoopEnd,
    },
}
