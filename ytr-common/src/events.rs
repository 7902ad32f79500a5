//! Host-facing event types and the EventBus that carries them
//!
//! Embeds publish upward through a shared bus. Every event carries the id of
//! the embed it came from, so one host can observe many embeds on one bus.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Events an embed dispatches to its host
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EmbedEvent {
    /// Underlying player finished initializing
    ///
    /// Fired at most once per embed. Never fired if player acquisition fails.
    Ready {
        embed_id: Uuid,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Playback began for a freshly loaded video
    ///
    /// Fired once per load on the first `Playing` transition.
    Meta {
        embed_id: Uuid,
        /// Video the metadata belongs to
        video_id: String,
        /// Total video duration in seconds, as reported by the player
        duration: f64,
        /// Video title, when the player exposes one
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl EmbedEvent {
    /// Get event type as string (host-facing event name)
    pub fn event_type(&self) -> &str {
        match self {
            EmbedEvent::Ready { .. } => "ready",
            EmbedEvent::Meta { .. } => "meta",
        }
    }

    /// Embed that dispatched this event
    pub fn embed_id(&self) -> Uuid {
        match self {
            EmbedEvent::Ready { embed_id, .. } | EmbedEvent::Meta { embed_id, .. } => *embed_id,
        }
    }
}

/// Central event distribution bus for embed events
///
/// Uses tokio::broadcast internally:
/// - Non-blocking publish (slow subscribers don't block embeds)
/// - Multiple concurrent subscribers
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use ytr_common::events::{EmbedEvent, EventBus};
///
/// let bus = EventBus::new(100);
/// let mut rx = bus.subscribe();
///
/// bus.emit_lossy(EmbedEvent::Ready {
///     embed_id: uuid::Uuid::new_v4(),
///     timestamp: chrono::Utc::now(),
/// });
///
/// assert_eq!(rx.try_recv().unwrap().event_type(), "ready");
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<EmbedEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<EmbedEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: EmbedEvent,
    ) -> Result<usize, broadcast::error::SendError<EmbedEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    ///
    /// Hosts are free to not listen; an unobserved embed still plays.
    pub fn emit_lossy(&self, event: EmbedEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(100)
    }
}
