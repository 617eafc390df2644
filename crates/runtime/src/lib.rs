//! Async stat engine: live stats, timed modifiers and effect lifecycles.
//!
//! This crate wraps the pure rules from `stat-core` in shared, lock-protected
//! handles and drives timed waits and tick loops on tokio. Consumers build a
//! [`StatSheet`] per subject, hold one [`EffectApplier`], and subscribe to
//! stat changes or effect events as needed.
//!
//! Modules are organized by responsibility:
//! - [`stat`] hosts the live numeric and text stat handles
//! - [`effects`] applies effects under their duplicate-handling policy
//! - [`registry`] maps stat ids and effect names to live objects
//! - [`events`] provides topic-based event bus for effect events
//! - [`api`] exposes the outcome and error types downstream clients match on
//! - [`cancel`] and [`config`] are shared infrastructure
pub mod api;
pub mod cancel;
pub mod config;
pub mod effects;
pub mod events;
pub mod registry;
pub mod stat;

pub use api::{ApplyOutcome, NotApplicable, RegistryError};
pub use cancel::CancelToken;
pub use config::RuntimeConfig;
pub use effects::EffectApplier;
pub use events::{Event, EventBus, LifecycleEvent, LoopEnd, TickEvent, Topic};
pub use registry::{EffectCatalog, RegistrationReport, Stat, StatSheet};
pub use stat::{StatKey, StatValue, SubscriptionId, TextStat, TimedOutcome, TimedWait};
