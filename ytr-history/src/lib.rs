//! # YT Repeater Playback History (ytr-history)
//!
//! Capacity-bounded, deduplicated, most-recent-first list of played videos,
//! persisted across sessions.
//!
//! **Architecture:** [`RecencyStore`] keeps an in-memory mirror of the
//! persisted list and serializes every write through one async lock. The
//! persisted copy lives behind the [`HistoryBackend`] trait, with a SQLite
//! implementation for real use and an in-memory one for tests and
//! degraded sessions.

pub mod backend;
pub mod entry;
pub mod sqlite;
pub mod store;

pub use backend::{HistoryBackend, MemoryBackend};
pub use entry::HistoryEntry;
pub use sqlite::SqliteBackend;
pub use store::{RecencyStore, DEFAULT_CAPACITY, ENTRIES_KEY};
