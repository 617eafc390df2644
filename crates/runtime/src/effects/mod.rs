//! Effect lifecycle: duplicate handling, timed waits and tick loops.
mod applier;
mod instance;
mod tick;

pub use applier::EffectApplier;
