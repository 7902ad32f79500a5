//! Bounded recency store
//!
//! Maintains the playback history as a most-recent-first list with at most
//! one entry per video and at most `capacity` entries. Every write re-reads
//! the persisted list, removes the old entry for the same video, puts the
//! new entry first, truncates, persists the list as one record, then
//! publishes the result to subscribers.
//!
//! Persistence is best-effort. An unreadable record counts as an empty
//! list, and a failed write keeps the in-memory mirror updated while the
//! persisted copy goes stale. Neither surfaces as an error to writers.

use crate::backend::HistoryBackend;
use crate::entry::HistoryEntry;
use std::sync::Arc;
use tokio::sync::{watch, Mutex, OnceCell};
use tracing::{debug, info, warn};
use ytr_common::{Error, Result};

/// Key of the single persisted record holding the whole list
pub const ENTRIES_KEY: &str = "ENTRIES";

/// Number of entries kept when no capacity is configured
pub const DEFAULT_CAPACITY: usize = 10;

/// Persisted, deduplicated, capacity-bounded history list
pub struct RecencyStore {
    backend: Arc<dyn HistoryBackend>,
    capacity: usize,

    /// Whether the backend came up; set once by `initialize`
    persistence: OnceCell<bool>,

    /// Serializes read-modify-write cycles so concurrent writers never
    /// lose a dedup or promotion
    write_lock: Mutex<()>,

    /// In-memory mirror of the last completed write
    snapshot: watch::Sender<Vec<HistoryEntry>>,
}

impl RecencyStore {
    /// Create a store over `backend` keeping at most `capacity` entries
    ///
    /// A capacity of zero is raised to one.
    pub fn new(backend: Arc<dyn HistoryBackend>, capacity: usize) -> Self {
        let (snapshot, _) = watch::channel(Vec::new());
        Self {
            backend,
            capacity: capacity.max(1),
            persistence: OnceCell::new(),
            write_lock: Mutex::new(()),
            snapshot,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bring the backend up and load the persisted list
    ///
    /// Idempotent. Returns an error if persistence is unavailable, in which
    /// case the store keeps working in memory for the rest of the session.
    pub async fn initialize(&self) -> Result<()> {
        if self.ensure_initialized().await {
            Ok(())
        } else {
            Err(Error::Internal(
                "history persistence unavailable for this session".to_string(),
            ))
        }
    }

    async fn ensure_initialized(&self) -> bool {
        *self
            .persistence
            .get_or_init(|| async {
                if let Err(e) = self.backend.ready().await {
                    warn!("History backend unavailable, history will not persist: {}", e);
                    return false;
                }

                let entries = self.load_entries().await;
                info!("Loaded {} history entries", entries.len());
                self.snapshot.send_replace(entries);
                true
            })
            .await
    }

    /// Record that `entry` was played
    ///
    /// Removes any previous entry for the same video, puts `entry` first,
    /// drops the oldest overflow and persists. Returns the new list.
    pub async fn record_play(&self, entry: HistoryEntry) -> Vec<HistoryEntry> {
        let persistent = self.ensure_initialized().await;
        let _guard = self.write_lock.lock().await;

        let mut entries = if persistent {
            self.load_entries().await
        } else {
            self.current_entries()
        };

        debug!(video_id = %entry.video_id, "Recording play");
        promote(&mut entries, entry, self.capacity);

        self.commit(entries, persistent).await
    }

    /// Forget every entry
    pub async fn clear(&self) -> Vec<HistoryEntry> {
        let persistent = self.ensure_initialized().await;
        let _guard = self.write_lock.lock().await;

        info!("Clearing playback history");
        self.commit(Vec::new(), persistent).await
    }

    /// Latest known list, most recent first
    pub fn current_entries(&self) -> Vec<HistoryEntry> {
        self.snapshot.borrow().clone()
    }

    /// Receiver that always holds the list as of the last completed write
    pub fn subscribe(&self) -> watch::Receiver<Vec<HistoryEntry>> {
        self.snapshot.subscribe()
    }

    async fn commit(&self, entries: Vec<HistoryEntry>, persistent: bool) -> Vec<HistoryEntry> {
        if persistent {
            if let Err(e) = self.persist(&entries).await {
                warn!("Failed to persist history, keeping in-memory copy: {}", e);
            }
        }

        self.snapshot.send_replace(entries.clone());
        entries
    }

    async fn load_entries(&self) -> Vec<HistoryEntry> {
        let raw = match self.backend.get_item(ENTRIES_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("Failed to read history, treating as empty: {}", e);
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<HistoryEntry>>(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Persisted history is malformed, treating as empty: {}", e);
                Vec::new()
            }
        }
    }

    async fn persist(&self, entries: &[HistoryEntry]) -> Result<()> {
        let raw = serde_json::to_string(entries)?;
        self.backend.set_item(ENTRIES_KEY, &raw).await
    }
}

/// Dedup-by-key, promote to front, truncate to capacity
fn promote(entries: &mut Vec<HistoryEntry>, entry: HistoryEntry, capacity: usize) {
    entries.retain(|existing| existing.video_id != entry.video_id);
    entries.insert(0, entry);
    entries.truncate(capacity);
}
