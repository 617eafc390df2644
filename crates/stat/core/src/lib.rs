//! Pure stat composition and effect rules shared across the workspace.
//!
//! `stat-core` defines the canonical numeric rules (modifier records, the
//! composition walk, the cached stat engine) together with the content
//! definitions consumed by loaders and the duplicate-handling transition
//! tables driven by the runtime. Nothing here suspends, spawns, or performs
//! I/O; the async lifecycle lives in the `runtime` crate.
pub mod compose;
pub mod config;
pub mod definition;
pub mod error;
pub mod modifier;
pub mod policy;
pub mod source;
pub mod state;

pub use compose::{clamp, compose, round_int, round4};
pub use config::{EffectConfig, PreventPeriodic, TimedCancellation};
pub use definition::{
    DuplicateHandling, EffectDefinition, StatContainer, StatDefinition, TextStatDefinition,
};
pub use error::DefinitionError;
pub use modifier::{ModifierKind, ModifierRecord};
pub use policy::{
    AllowTable, EffectPhase, PolicyInput, PreventTable, RefreshTable, StackTable, Step,
    Transition, TransitionTable, Verdict, table_for,
};
pub use source::SourceId;
pub use state::StatState;
