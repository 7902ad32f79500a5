//! Integration tests for the recency store over the SQLite backend
//!
//! Uses on-disk databases in temporary directories so that reopening a
//! store exercises real persistence across sessions.

use std::collections::HashSet;
use std::sync::Arc;
use ytr_history::{HistoryEntry, RecencyStore, SqliteBackend};

async fn open_store(db_path: &std::path::Path, capacity: usize) -> RecencyStore {
    let backend = SqliteBackend::open(db_path)
        .await
        .expect("history database should open");
    let store = RecencyStore::new(Arc::new(backend), capacity);
    store.initialize().await.expect("backend should be ready");
    store
}

#[tokio::test]
async fn test_reload_yields_same_sequence() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("nested").join("ytr.db");

    let written = {
        let store = open_store(&db_path, 10).await;
        store
            .record_play(
                HistoryEntry::new("a")
                    .with_field("title", "First")
                    .with_field("startSeconds", 30),
            )
            .await;
        store.record_play(HistoryEntry::new("b")).await;
        store
            .record_play(HistoryEntry::new("c").with_field("endSeconds", 95.5))
            .await
    };

    let reopened = open_store(&db_path, 10).await;
    assert_eq!(reopened.current_entries(), written);
}

#[tokio::test]
async fn test_capacity_example_across_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("ytr.db");

    {
        let store = open_store(&db_path, 3).await;
        store.record_play(HistoryEntry::new("a")).await;
        store.record_play(HistoryEntry::new("b")).await;
    }

    // A new session keeps deduplicating against what the old one wrote
    let store = open_store(&db_path, 3).await;
    store
        .record_play(HistoryEntry::new("a").with_field("title", "A2"))
        .await;
    let entries = store.record_play(HistoryEntry::new("c")).await;

    let ids: Vec<_> = entries.iter().map(|e| e.video_id.as_str()).collect();
    assert_eq!(ids, vec!["c", "a", "b"]);
    assert_eq!(entries[1].field("title"), Some(&serde_json::json!("A2")));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_writers_never_lose_updates() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("ytr.db");
    let store = Arc::new(open_store(&db_path, 50).await);

    let writers: Vec<_> = (0..20)
        .map(|i| {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                store
                    .record_play(HistoryEntry::new(format!("video-{}", i % 10)))
                    .await
            })
        })
        .collect();

    for writer in writers {
        writer.await.unwrap();
    }

    let entries = store.current_entries();
    let unique: HashSet<_> = entries.iter().map(|e| e.video_id.clone()).collect();
    assert_eq!(entries.len(), 10);
    assert_eq!(unique.len(), 10);

    // Persisted copy agrees with the mirror
    let reopened = open_store(&db_path, 50).await;
    assert_eq!(reopened.current_entries(), entries);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_writers_respect_capacity() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(open_store(&dir.path().join("ytr.db"), 5).await);

    let writers: Vec<_> = (0..30)
        .map(|i| {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.record_play(HistoryEntry::new(format!("v{}", i))).await })
        })
        .collect();

    for writer in writers {
        let snapshot = writer.await.unwrap();
        assert!(snapshot.len() <= 5);
    }

    assert_eq!(store.current_entries().len(), 5);
}

#[tokio::test]
async fn test_clear_survives_reload() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("ytr.db");

    {
        let store = open_store(&db_path, 10).await;
        store.record_play(HistoryEntry::new("a")).await;
        store.clear().await;
    }

    let reopened = open_store(&db_path, 10).await;
    assert!(reopened.current_entries().is_empty());
}
