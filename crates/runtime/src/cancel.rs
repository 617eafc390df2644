//! Cooperative cancellation threaded through every suspension point.
//!
//! A [`CancelToken`] is a one-way flag: once cancelled it stays cancelled.
//! Tokens form a tree; cancelling a parent cancels every child created from
//! it, which lets one effect-wide token reach all loops and waits it spawned.
//! Parents hold their children weakly and children hold their parent
//! strongly, so a dropped child is released and a live grandchild keeps the
//! chain above it reachable.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::watch;

#[derive(Clone)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

struct Inner {
    flag: watch::Sender<bool>,
    children: Mutex<Vec<Weak<Inner>>>,
    _parent: Option<Arc<Inner>>,
}

impl Inner {
    fn is_cancelled(&self) -> bool {
        *self.flag.borrow()
    }

    fn cancel(&self) {
        let children = {
            let mut children = self.children.lock();
            if self.flag.send_replace(true) {
                return;
            }
            std::mem::take(&mut *children)
        };
        for child in children.iter().filter_map(Weak::upgrade) {
            child.cancel();
        }
    }
}

impl CancelToken {
    pub fn new() -> Self {
        Self::with_parent(None)
    }

    fn with_parent(parent: Option<Arc<Inner>>) -> Self {
        let (flag, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                flag,
                children: Mutex::new(Vec::new()),
                _parent: parent,
            }),
        }
    }

    /// Creates a token that is cancelled whenever `self` is.
    ///
    /// Children that were dropped or cancelled are pruned here, so a parent
    /// handing out one child per tick stays bounded.
    pub fn child(&self) -> Self {
        let child = Self::with_parent(Some(Arc::clone(&self.inner)));
        let mut children = self.inner.children.lock();
        if self.is_cancelled() {
            drop(children);
            child.cancel();
        } else {
            children.retain(|c| c.upgrade().is_some_and(|c| !c.is_cancelled()));
            children.push(Arc::downgrade(&child.inner));
        }
        child
    }

    /// Cancels this token and all of its descendants. Idempotent.
    pub fn cancel(&self) {
        self.inner.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.is_cancelled()
    }

    #[cfg(test)]
    fn child_count(&self) -> usize {
        self.inner.children.lock().len()
    }

    /// Resolves once the token is cancelled.
    pub async fn cancelled(&self) {
        let mut rx = self.inner.flag.subscribe();
        // The sender lives as long as `self`, so this only returns on cancel.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }

    /// True when both handles refer to the same token.
    pub fn same(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
