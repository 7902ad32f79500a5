//! End-to-end looping over the simulated player, feeding a history store

use std::sync::Arc;
use std::time::Duration;
use ytr_common::config::EmbedConfig;
use ytr_common::{EmbedEvent, EventBus};
use ytr_embed::player::{SimulatedPlayerFactory, SimulatedVideo};
use ytr_embed::{EmbedPhase, LoopEmbed};
use ytr_history::{HistoryEntry, MemoryBackend, RecencyStore};

const VIDEO: &str = "dQw4w9WgXcQ";

fn factory() -> SimulatedPlayerFactory {
    SimulatedPlayerFactory::new()
        .with_video(
            VIDEO,
            SimulatedVideo {
                title: Some("Never Gonna Give You Up".to_string()),
                duration: 212.0,
            },
        )
        .with_init_delay(Duration::from_millis(250))
}

#[tokio::test(start_paused = true)]
async fn test_segment_loops_until_unmounted() {
    let bus = EventBus::new(100);
    let mut events = bus.subscribe();
    let embed = LoopEmbed::new(bus, &EmbedConfig::default());

    embed.set_input("v", VIDEO);
    embed.set_input("start", "43");
    embed.set_input("end", "51");
    embed.mount(Arc::new(factory()));

    let started = tokio::time::Instant::now();
    let mut status = embed.watch_status();
    tokio::time::timeout(Duration::from_secs(60), status.wait_for(|s| s.loops >= 3))
        .await
        .expect("segment should loop")
        .unwrap();

    // Three 8 second passes after the first load
    assert!(started.elapsed() >= Duration::from_secs(24));

    let mut ready = 0;
    let mut meta = Vec::new();
    while let Ok(event) = events.try_recv() {
        match event {
            EmbedEvent::Ready { .. } => ready += 1,
            EmbedEvent::Meta {
                video_id,
                duration,
                title,
                ..
            } => meta.push((video_id, duration, title)),
        }
    }
    assert_eq!(ready, 1);
    assert_eq!(
        meta,
        vec![(
            VIDEO.to_string(),
            212.0,
            Some("Never Gonna Give You Up".to_string())
        )]
    );

    embed.unmount();
    let loops = embed.status().loops;
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(embed.status().loops, loops);
}

#[tokio::test(start_paused = true)]
async fn test_meta_events_feed_history() {
    let bus = EventBus::new(100);
    let mut events = bus.subscribe();
    let embed = LoopEmbed::new(bus, &EmbedConfig::default());
    let store = RecencyStore::new(Arc::new(MemoryBackend::new()), 2);
    store.initialize().await.unwrap();

    embed.mount(Arc::new(factory().with_speed(4.0)));
    for video in [VIDEO, "9bZkp7q19f0", "kJQP7kiw5Fk", VIDEO] {
        embed.set_input("v", video);

        loop {
            let event = tokio::time::timeout(Duration::from_secs(10), events.recv())
                .await
                .expect("meta should arrive")
                .unwrap();
            if let EmbedEvent::Meta {
                video_id, title, ..
            } = event
            {
                assert_eq!(video_id, video);
                let mut entry = HistoryEntry::new(video_id);
                if let Some(title) = title {
                    entry = entry.with_field("title", title);
                }
                store.record_play(entry).await;
                break;
            }
        }
    }

    let ids: Vec<_> = store
        .current_entries()
        .into_iter()
        .map(|e| e.video_id)
        .collect();
    assert_eq!(ids, vec![VIDEO.to_string(), "kJQP7kiw5Fk".to_string()]);
    assert_eq!(
        store.current_entries()[0]
            .field("title")
            .and_then(|t| t.as_str()),
        Some("Never Gonna Give You Up")
    );
}

#[tokio::test(start_paused = true)]
async fn test_failed_player_never_ready() {
    let bus = EventBus::new(100);
    let mut events = bus.subscribe();
    let embed = LoopEmbed::new(bus, &EmbedConfig::default());

    embed.set_input("v", VIDEO);
    embed.mount(Arc::new(factory().failing(150)));

    let mut status = embed.watch_status();
    status
        .wait_for(|s| s.phase == EmbedPhase::Failed)
        .await
        .unwrap();

    assert!(events.try_recv().is_err());
    assert!(!embed.is_ready());
}
