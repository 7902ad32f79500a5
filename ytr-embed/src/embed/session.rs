//! Embed session actor
//!
//! Owns all per-embed state and handles one message at a time: input
//! changes, debounce firings, player acquisition results and player state
//! transitions. Every player command of the embed is issued from here, so a
//! restart after `Ended` can never race a fresh load.

use super::{EmbedPhase, EmbedStatus, PlaybackPhase};
use crate::player::{Player, PlayerError, PlayerFactory, PlayerOptions, PlayerSession, PlayerState};
use crate::spec::{InputChange, LoadRequest, PlaybackSpec};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;
use ytr_common::{Debouncer, Deferred, EmbedEvent, EventBus};

/// Messages handled by the session actor
pub(super) enum EmbedCommand {
    Mount(Arc<dyn PlayerFactory>),
    Input { name: String, value: String },
    /// Debounce window elapsed for the input change numbered `generation`
    Apply { generation: u64 },
    PlayerReady(PlayerSession),
    PlayerFailed(PlayerError),
}

pub(super) struct EmbedSession {
    id: Uuid,
    bus: EventBus,
    options: PlayerOptions,
    inbox_tx: mpsc::UnboundedSender<EmbedCommand>,
    status_tx: watch::Sender<EmbedStatus>,

    /// Resolved once, from the mount task's result
    player_deferred: Deferred<Arc<dyn Player>>,
    player: Option<Arc<dyn Player>>,
    phase: EmbedPhase,
    playback: PlaybackPhase,

    debouncer: Debouncer,
    /// Bumped on every accepted input change; stale applies are dropped
    generation: u64,
    /// An apply fired before the player was ready
    apply_on_ready: bool,

    desired: PlaybackSpec,
    playing: Option<PlaybackSpec>,
    meta_sent: bool,
    /// A `v` change happened since the last apply
    video_changed: bool,
    loops: u64,
}

impl EmbedSession {
    pub(super) fn new(
        id: Uuid,
        bus: EventBus,
        debounce: Duration,
        options: PlayerOptions,
        player_deferred: Deferred<Arc<dyn Player>>,
        inbox_tx: mpsc::UnboundedSender<EmbedCommand>,
        status_tx: watch::Sender<EmbedStatus>,
    ) -> Self {
        Self {
            id,
            bus,
            options,
            inbox_tx,
            status_tx,
            player_deferred,
            player: None,
            phase: EmbedPhase::Unmounted,
            playback: PlaybackPhase::Idle,
            debouncer: Debouncer::new(debounce),
            generation: 0,
            apply_on_ready: false,
            desired: PlaybackSpec::default(),
            playing: None,
            meta_sent: false,
            video_changed: false,
            loops: 0,
        }
    }

    /// Actor loop; returns on shutdown
    pub(super) async fn run(
        mut self,
        mut inbox: mpsc::UnboundedReceiver<EmbedCommand>,
        shutdown: CancellationToken,
    ) {
        let mut states: Option<mpsc::UnboundedReceiver<PlayerState>> = None;

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                command = inbox.recv() => match command {
                    Some(command) => self.handle(command, &mut states).await,
                    None => break,
                },
                state = next_state(&mut states) => match state {
                    Some(state) => self.on_state_change(state).await,
                    None => {
                        warn!(embed_id = %self.id, "Player state stream closed");
                        states = None;
                    }
                },
            }

            self.publish_status();
        }

        self.debouncer.cancel();
        info!(embed_id = %self.id, "Loop embed unmounted");
    }

    async fn handle(
        &mut self,
        command: EmbedCommand,
        states: &mut Option<mpsc::UnboundedReceiver<PlayerState>>,
    ) {
        match command {
            EmbedCommand::Mount(factory) => self.mount(factory),
            EmbedCommand::Input { name, value } => self.on_input_change(&name, &value),
            EmbedCommand::Apply { generation } => self.apply(generation).await,
            EmbedCommand::PlayerReady(session) => {
                // Subscribed exactly once; dropped when the session ends
                *states = Some(session.states);
                self.on_player_ready(session.player).await;
            }
            EmbedCommand::PlayerFailed(e) => {
                warn!(embed_id = %self.id, "Player acquisition failed, embed inert: {}", e);
                self.phase = EmbedPhase::Failed;
            }
        }
    }

    fn mount(&mut self, factory: Arc<dyn PlayerFactory>) {
        if self.phase != EmbedPhase::Unmounted {
            debug!(embed_id = %self.id, phase = ?self.phase, "Already mounted");
            return;
        }

        info!(embed_id = %self.id, "Mounting loop embed");
        self.phase = EmbedPhase::Mounting;

        let options = self.options.clone();
        let inbox = self.inbox_tx.clone();
        tokio::spawn(async move {
            let command = match factory.init_player(&options).await {
                Ok(session) => EmbedCommand::PlayerReady(session),
                Err(e) => EmbedCommand::PlayerFailed(e),
            };
            let _ = inbox.send(command);
        });
    }

    async fn on_player_ready(&mut self, player: Arc<dyn Player>) {
        self.player_deferred.resolve(Arc::clone(&player));
        self.player = Some(player);
        self.phase = EmbedPhase::Ready;

        info!(embed_id = %self.id, "Player ready");
        self.bus.emit_lossy(EmbedEvent::Ready {
            embed_id: self.id,
            timestamp: ytr_common::time::now(),
        });

        if std::mem::take(&mut self.apply_on_ready) {
            self.apply(self.generation).await;
        }
    }

    fn on_input_change(&mut self, name: &str, value: &str) {
        let change = match InputChange::parse(name, value) {
            Ok(change) => change,
            Err(e) => {
                debug!(embed_id = %self.id, "Ignoring input: {}", e);
                return;
            }
        };

        // meta_sent still describes the current load until the apply replaces it
        if change.is_video() {
            self.video_changed = true;
        }

        self.desired = self.desired.merge(&change);
        self.generation += 1;
        trace!(embed_id = %self.id, generation = self.generation, desired = ?self.desired, "Input merged");

        let generation = self.generation;
        let inbox = self.inbox_tx.clone();
        self.debouncer.schedule(async move {
            let _ = inbox.send(EmbedCommand::Apply { generation });
        });
    }

    /// Issue the latest merged spec to the player
    async fn apply(&mut self, generation: u64) {
        if generation != self.generation {
            trace!(embed_id = %self.id, generation, "Apply superseded");
            return;
        }

        let Some(player) = self.player.clone() else {
            debug!(embed_id = %self.id, "Player not ready, apply deferred");
            self.apply_on_ready = true;
            return;
        };

        let Some(request) = self.desired.to_load_request() else {
            debug!(embed_id = %self.id, "No video id yet, nothing to load");
            return;
        };

        let previous_id = self.playing.as_ref().and_then(|p| p.video_id.as_deref());
        if self.video_changed || previous_id != Some(request.video_id.as_str()) {
            self.meta_sent = false;
        }
        self.video_changed = false;
        self.playing = Some(self.desired.clone());

        info!(
            embed_id = %self.id,
            video_id = %request.video_id,
            start = request.start_seconds,
            end = ?request.end_seconds,
            "Loading video"
        );
        self.load(&player, &request).await;
    }

    async fn on_state_change(&mut self, state: PlayerState) {
        let Some(player) = self.player.clone() else {
            return;
        };

        match state {
            PlayerState::Playing => {
                let Some(video_id) = self.playing.as_ref().and_then(|p| p.video_id.clone()) else {
                    return;
                };
                self.playback = PlaybackPhase::Playing;
                if self.meta_sent {
                    return;
                }

                let duration = player.duration().await;
                let data = player.video_data().await;
                let title = data.title.filter(|t| !t.is_empty());

                debug!(embed_id = %self.id, %video_id, duration, "Publishing video metadata");
                self.bus.emit_lossy(EmbedEvent::Meta {
                    embed_id: self.id,
                    video_id,
                    duration,
                    title,
                    timestamp: ytr_common::time::now(),
                });
                self.meta_sent = true;
            }
            PlayerState::Ended => {
                let Some(request) = self.playing.as_ref().and_then(PlaybackSpec::to_load_request)
                else {
                    return;
                };

                self.loops += 1;
                debug!(
                    embed_id = %self.id,
                    video_id = %request.video_id,
                    loops = self.loops,
                    "Segment ended, restarting"
                );
                self.load(&player, &request).await;
            }
            other => trace!(embed_id = %self.id, state = %other, "Ignoring player state"),
        }
    }

    async fn load(&mut self, player: &Arc<dyn Player>, request: &LoadRequest) {
        self.playback = PlaybackPhase::Loading;
        if let Err(e) = player.load_video(request).await {
            // Player reports its own errors; nothing to recover here
            warn!(embed_id = %self.id, video_id = %request.video_id, "Load rejected by player: {}", e);
        }
    }

    fn publish_status(&self) {
        let status = EmbedStatus {
            phase: self.phase,
            playback: self.playback,
            desired: self.desired.clone(),
            playing: self.playing.clone(),
            meta_sent: self.meta_sent,
            loops: self.loops,
        };

        self.status_tx.send_if_modified(|current| {
            if *current == status {
                return false;
            }
            *current = status;
            true
        });
    }
}

/// Next state transition, or pending forever before the player exists
async fn next_state(
    states: &mut Option<mpsc::UnboundedReceiver<PlayerState>>,
) -> Option<PlayerState> {
    match states {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
