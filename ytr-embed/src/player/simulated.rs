//! In-process simulated player
//!
//! Plays nothing, but keeps time like a player would: every load emits
//! `Buffering` then `Playing`, and once the requested segment has elapsed
//! (scaled by `speed`) emits `Ended`. Used by the CLI host and for manual
//! testing without a real player.

use super::{Player, PlayerError, PlayerFactory, PlayerOptions, PlayerSession, PlayerState, VideoData};
use crate::spec::LoadRequest;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Duration assumed for videos missing from the catalogue
pub const DEFAULT_DURATION_SECS: f64 = 60.0;

/// Shortest time a load plays before `Ended`, one frame at 25 fps
pub const MIN_SEGMENT: Duration = Duration::from_millis(40);

/// Catalogue entry of the simulated player
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedVideo {
    pub title: Option<String>,
    pub duration: f64,
}

impl Default for SimulatedVideo {
    fn default() -> Self {
        Self {
            title: None,
            duration: DEFAULT_DURATION_SECS,
        }
    }
}

/// Factory for [`SimulatedPlayer`]s
#[derive(Debug, Clone)]
pub struct SimulatedPlayerFactory {
    catalogue: HashMap<String, SimulatedVideo>,
    speed: f64,
    init_delay: Duration,
    fail_with: Option<i32>,
}

impl SimulatedPlayerFactory {
    pub fn new() -> Self {
        Self {
            catalogue: HashMap::new(),
            speed: 1.0,
            init_delay: Duration::ZERO,
            fail_with: None,
        }
    }

    /// Register a known video
    pub fn with_video(mut self, video_id: impl Into<String>, video: SimulatedVideo) -> Self {
        self.catalogue.insert(video_id.into(), video);
        self
    }

    /// Playback speed multiplier; non-positive values mean real time
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = if speed > 0.0 { speed } else { 1.0 };
        self
    }

    pub fn with_init_delay(mut self, delay: Duration) -> Self {
        self.init_delay = delay;
        self
    }

    /// Make initialization fail with the given player error code
    pub fn failing(mut self, code: i32) -> Self {
        self.fail_with = Some(code);
        self
    }
}

impl Default for SimulatedPlayerFactory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlayerFactory for SimulatedPlayerFactory {
    async fn init_player(&self, options: &PlayerOptions) -> Result<PlayerSession, PlayerError> {
        if !self.init_delay.is_zero() {
            tokio::time::sleep(self.init_delay).await;
        }

        if let Some(code) = self.fail_with {
            return Err(PlayerError::Init { code });
        }

        info!(
            width = options.width,
            height = options.height,
            speed = self.speed,
            "Simulated player ready"
        );

        let (states_tx, states) = mpsc::unbounded_channel();
        let player = SimulatedPlayer {
            catalogue: self.catalogue.clone(),
            speed: self.speed,
            states: states_tx,
            current: Mutex::new(None),
        };

        Ok(PlayerSession {
            player: Arc::new(player),
            states,
        })
    }
}

struct Current {
    request: LoadRequest,
    video: SimulatedVideo,
    playback: CancellationToken,
}

/// Player created by [`SimulatedPlayerFactory`]
pub struct SimulatedPlayer {
    catalogue: HashMap<String, SimulatedVideo>,
    speed: f64,
    states: mpsc::UnboundedSender<PlayerState>,
    current: Mutex<Option<Current>>,
}

impl SimulatedPlayer {
    fn lock_current(&self) -> std::sync::MutexGuard<'_, Option<Current>> {
        // A poisoned lock only means a panicking test; the data is still usable
        self.current.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// (Re)start the simulated clock for `request` at `from` seconds
    fn start_playback(&self, request: LoadRequest, video: SimulatedVideo, from: f64) {
        let playback = CancellationToken::new();

        let end = request
            .end_seconds
            .map_or(video.duration, |end| end.min(video.duration));
        let remaining = ytr_common::time::seconds_to_duration((end - from) / self.speed)
            .max(MIN_SEGMENT);

        if let Some(previous) = self.lock_current().replace(Current {
            request,
            video,
            playback: playback.clone(),
        }) {
            previous.playback.cancel();
        }

        let states = self.states.clone();
        tokio::spawn(async move {
            let _ = states.send(PlayerState::Buffering);
            let _ = states.send(PlayerState::Playing);

            tokio::select! {
                biased;
                _ = playback.cancelled() => {}
                _ = tokio::time::sleep(remaining) => {
                    let _ = states.send(PlayerState::Ended);
                }
            }
        });
    }
}

/// Whether `video_id` has the shape of an iframe player video id
fn is_valid_video_id(video_id: &str) -> bool {
    video_id.len() == 11
        && video_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[async_trait]
impl Player for SimulatedPlayer {
    async fn load_video(&self, request: &LoadRequest) -> Result<(), PlayerError> {
        if !is_valid_video_id(&request.video_id) {
            return Err(PlayerError::Command(format!(
                "invalid video id {:?} (code 2)",
                request.video_id
            )));
        }

        let video = self
            .catalogue
            .get(&request.video_id)
            .cloned()
            .unwrap_or_default();

        debug!(
            video_id = %request.video_id,
            start = request.start_seconds,
            end = ?request.end_seconds,
            "Simulated load"
        );

        self.start_playback(request.clone(), video, request.start_seconds);
        Ok(())
    }

    async fn seek_to(&self, seconds: f64) -> Result<(), PlayerError> {
        let (request, video) = {
            let current = self.lock_current();
            let current = current.as_ref().ok_or(PlayerError::Unavailable)?;
            (current.request.clone(), current.video.clone())
        };

        self.start_playback(request, video, seconds);
        Ok(())
    }

    async fn duration(&self) -> f64 {
        self.lock_current()
            .as_ref()
            .map_or(0.0, |current| current.video.duration)
    }

    async fn video_data(&self) -> VideoData {
        self.lock_current()
            .as_ref()
            .map(|current| VideoData {
                video_id: current.request.video_id.clone(),
                title: current.video.title.clone(),
            })
            .unwrap_or_default()
    }
}

impl Drop for SimulatedPlayer {
    fn drop(&mut self) {
        if let Some(current) = self.lock_current().take() {
            current.playback.cancel();
        }
    }
}
