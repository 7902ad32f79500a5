//! Single-assignment value with many waiters
//!
//! A `Deferred` starts empty, is resolved at most once from any task, and
//! hands a clone of the value to every waiter, whether it started waiting
//! before or after resolution. There is no rejection: a value that never
//! arrives simply keeps its waiters suspended.

use std::sync::Arc;
use tokio::sync::watch;

/// Eventual value resolved exactly once
pub struct Deferred<T> {
    inner: Arc<watch::Sender<Option<T>>>,
}

impl<T> Clone for Deferred<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone> Deferred<T> {
    /// Create an unresolved deferred value
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { inner: Arc::new(tx) }
    }

    /// Resolve with `value`
    ///
    /// Returns `false` (and drops `value`) if already resolved.
    pub fn resolve(&self, value: T) -> bool {
        self.inner.send_if_modified(|slot| {
            if slot.is_some() {
                return false;
            }
            *slot = Some(value);
            true
        })
    }

    /// Current value, if resolved
    pub fn get(&self) -> Option<T> {
        self.inner.borrow().clone()
    }

    pub fn is_resolved(&self) -> bool {
        self.inner.borrow().is_some()
    }

    /// Wait until resolved and return a clone of the value
    ///
    /// Suspends forever if the value never arrives.
    pub async fn wait(&self) -> T {
        let mut rx = self.inner.subscribe();
        loop {
            let current = rx.borrow_and_update().clone();
            if let Some(value) = current {
                return value;
            }
            // Sender lives in self, so the channel cannot close while we wait
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

impl<T: Clone> Default for Deferred<T> {
    fn default() -> Self {
        Self::new()
    }
}
