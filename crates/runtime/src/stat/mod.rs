//! Live stat handles.
//!
//! [`StatValue`] wraps the pure `StatState` engine from `stat-core` with a
//! lock, a registry of timed modifiers and value-changed subscriptions so it
//! can be shared between callers and running effects. [`TextStat`] is the
//! string-valued counterpart.
mod subscription;
mod text;
mod timed;
mod value;

pub use subscription::SubscriptionId;
pub use text::TextStat;
pub use value::{StatKey, StatValue, TimedOutcome, TimedWait};
