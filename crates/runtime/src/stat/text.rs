//! Non-numeric stats: a string value with change notification.

use std::fmt;

use parking_lot::RwLock;
use stat_core::TextStatDefinition;

use super::subscription::{SubscriptionId, Subscribers};

/// A string-valued stat such as a title or class name.
///
/// Text stats take no modifiers and are never targeted by effects.
pub struct TextStat {
    id: String,
    value: RwLock<String>,
    subscribers: Subscribers<String>,
}

impl TextStat {
    pub fn new(id: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            value: RwLock::new(value.into()),
            subscribers: Subscribers::new(),
        }
    }

    pub fn from_definition(definition: &TextStatDefinition) -> Self {
        Self::new(definition.id.clone(), definition.value.clone())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn value(&self) -> String {
        self.value.read().clone()
    }

    /// Replaces the value. Subscribers hear about it only if it changed.
    pub fn set(&self, value: impl Into<String>) -> bool {
        let value = value.into();
        {
            let mut current = self.value.write();
            if *current == value {
                return false;
            }
            current.clone_from(&value);
        }
        self.subscribers.notify(value);
        true
    }

    pub fn subscribe(&self, handler: impl Fn(String) + Send + Sync + 'static) -> SubscriptionId {
        self.subscribers.subscribe(handler)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }
}

impl fmt::Debug for TextStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextStat")
            .field("id", &self.id)
            .field("value", &*self.value.read())
            .finish()
    }
}
