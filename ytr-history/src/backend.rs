//! Persistence backend abstraction
//!
//! A backend is a named key/value record store holding opaque strings. The
//! history store keeps its whole list under a single key, so each write is
//! one atomic `set_item`.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use ytr_common::Result;

/// Key/value persistence used by [`crate::RecencyStore`]
#[async_trait]
pub trait HistoryBackend: Send + Sync {
    /// Resolve once the backend is usable
    ///
    /// An error here means persistence is unavailable for the session.
    async fn ready(&self) -> Result<()>;

    /// Read the value stored under `key`, `None` if never written
    async fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value stored under `key`
    async fn set_item(&self, key: &str, value: &str) -> Result<()>;
}

/// Process-local backend
///
/// Clones share the same map, so a store reopened over a clone sees what
/// the previous store wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    items: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryBackend for MemoryBackend {
    async fn ready(&self) -> Result<()> {
        Ok(())
    }

    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.lock().await.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.items
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
