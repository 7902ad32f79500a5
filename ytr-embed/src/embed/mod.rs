//! Loop embed component
//!
//! [`LoopEmbed`] is the host-facing handle. The host sets declarative
//! inputs, mounts the embed once with a player factory, and listens for
//! [`EmbedEvent`](ytr_common::EmbedEvent)s on the bus it supplied.
//!
//! Lifecycle: `Unmounted → Mounting → Ready`, or `Mounting → Failed` when
//! the player cannot be acquired. A failed embed keeps accepting inputs but
//! never plays anything and never fires `Ready`.
//!
//! Within `Ready` the playback sub-state cycles
//! `Idle → Loading → Playing → (Ended) → Loading → …` until inputs change.

mod session;

use crate::player::{Player, PlayerFactory, PlayerOptions};
use crate::spec::PlaybackSpec;
use serde::Serialize;
use session::{EmbedCommand, EmbedSession};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;
use ytr_common::config::EmbedConfig;
use ytr_common::{Deferred, EventBus};

/// Embed lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EmbedPhase {
    Unmounted,
    Mounting,
    Ready,
    /// Player acquisition failed; the embed stays inert
    Failed,
}

/// Player playback sub-state, meaningful once `Ready`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlaybackPhase {
    /// Nothing issued to the player yet
    Idle,
    /// Load issued, waiting for the player to start
    Loading,
    Playing,
}

/// Snapshot of an embed's session state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedStatus {
    pub phase: EmbedPhase,
    pub playback: PlaybackPhase,
    /// Latest merged spec from the inputs
    pub desired: PlaybackSpec,
    /// Spec last issued to the player
    pub playing: Option<PlaybackSpec>,
    /// Whether `Meta` already fired for the current load
    pub meta_sent: bool,
    /// Number of times the segment was restarted after ending
    pub loops: u64,
}

impl Default for EmbedStatus {
    fn default() -> Self {
        Self {
            phase: EmbedPhase::Unmounted,
            playback: PlaybackPhase::Idle,
            desired: PlaybackSpec::default(),
            playing: None,
            meta_sent: false,
            loops: 0,
        }
    }
}

/// Embeddable loop player
///
/// Creating an embed spawns its session task, so it must happen inside a
/// tokio runtime. Dropping the embed unmounts it.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use ytr_common::{config::EmbedConfig, EventBus};
/// use ytr_embed::{player::SimulatedPlayerFactory, LoopEmbed};
///
/// # async fn demo() {
/// let bus = EventBus::new(100);
/// let embed = LoopEmbed::new(bus.clone(), &EmbedConfig::default());
///
/// embed.set_input("v", "dQw4w9WgXcQ");
/// embed.set_input("start", "43");
/// embed.set_input("end", "51");
/// embed.mount(Arc::new(SimulatedPlayerFactory::new()));
///
/// embed.ready().await;
/// # }
/// ```
pub struct LoopEmbed {
    id: Uuid,
    commands: mpsc::UnboundedSender<EmbedCommand>,
    player: Deferred<Arc<dyn Player>>,
    status: watch::Receiver<EmbedStatus>,
    shutdown: CancellationToken,
}

impl LoopEmbed {
    /// Create an unmounted embed publishing to `bus`
    pub fn new(bus: EventBus, config: &EmbedConfig) -> Self {
        let id = Uuid::new_v4();
        let (commands, inbox) = mpsc::unbounded_channel();
        let player = Deferred::new();
        let (status_tx, status) = watch::channel(EmbedStatus::default());
        let shutdown = CancellationToken::new();

        let session = EmbedSession::new(
            id,
            bus,
            config.debounce_window(),
            PlayerOptions::from(config),
            player.clone(),
            commands.clone(),
            status_tx,
        );
        tokio::spawn(session.run(inbox, shutdown.clone()));

        debug!(embed_id = %id, "Created loop embed");

        Self {
            id,
            commands,
            player,
            status,
            shutdown,
        }
    }

    /// Identifier carried by every event this embed publishes
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Acquire the player and start reacting to it
    ///
    /// Only the first call has an effect.
    pub fn mount(&self, factory: Arc<dyn PlayerFactory>) {
        self.send(EmbedCommand::Mount(factory));
    }

    /// Set a declarative input (`v`, `start`, `end` or `range`)
    ///
    /// Empty values, unknown names and malformed numbers are ignored.
    pub fn set_input(&self, name: &str, value: impl Into<String>) {
        self.send(EmbedCommand::Input {
            name: name.to_string(),
            value: value.into(),
        });
    }

    /// Wait for the player; never returns if acquisition fails
    pub async fn ready(&self) -> Arc<dyn Player> {
        self.player.wait().await
    }

    pub fn is_ready(&self) -> bool {
        self.player.is_resolved()
    }

    pub fn phase(&self) -> EmbedPhase {
        self.status.borrow().phase
    }

    /// Current session state
    pub fn status(&self) -> EmbedStatus {
        self.status.borrow().clone()
    }

    /// Receiver updated after every handled input, apply and state change
    pub fn watch_status(&self) -> watch::Receiver<EmbedStatus> {
        self.status.clone()
    }

    /// Stop reacting to inputs and player state
    ///
    /// Tears down the state subscription and any pending apply. Idempotent.
    pub fn unmount(&self) {
        if !self.shutdown.is_cancelled() {
            debug!(embed_id = %self.id, "Unmounting loop embed");
            self.shutdown.cancel();
        }
    }

    fn send(&self, command: EmbedCommand) {
        // Session gone means the embed was unmounted; inputs are moot
        if self.commands.send(command).is_err() {
            debug!(embed_id = %self.id, "Ignoring command for unmounted embed");
        }
    }
}

impl Drop for LoopEmbed {
    fn drop(&mut self) {
        self.unmount();
    }
}
