//! Topic-based event bus for effect events.
//!
//! Effects publish lifecycle outcomes and tick progress to separate topics so
//! consumers interested only in apply/remove traffic do not see every tick.

mod bus;
mod types;

pub use bus::{Event, EventBus, Topic};
pub use types::{LifecycleEvent, LoopEnd, TickEvent};
