//! Player collaborator contract
//!
//! The embed never talks to a concrete player. It asks a [`PlayerFactory`]
//! for a [`PlayerSession`] once at mount time, then issues commands through
//! the [`Player`] trait and consumes the session's state-transition stream.

mod simulated;

pub use simulated::{SimulatedPlayer, SimulatedPlayerFactory, SimulatedVideo};

use crate::spec::LoadRequest;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use ytr_common::config::EmbedConfig;

/// Player error types
#[derive(Debug, Clone, Error)]
pub enum PlayerError {
    /// Player failed to initialize; `code` is the player's own error code
    #[error("Player initialization failed with code {code}")]
    Init { code: i32 },

    /// A command was rejected by the player
    #[error("Player command failed: {0}")]
    Command(String),

    /// Player is gone (torn down or never created)
    #[error("Player unavailable")]
    Unavailable,
}

/// Player state transitions, numbered as the iframe player numbers them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerState {
    Unstarted,
    Ended,
    Playing,
    Paused,
    Buffering,
    Cued,
}

impl PlayerState {
    pub fn code(&self) -> i32 {
        match self {
            PlayerState::Unstarted => -1,
            PlayerState::Ended => 0,
            PlayerState::Playing => 1,
            PlayerState::Paused => 2,
            PlayerState::Buffering => 3,
            PlayerState::Cued => 5,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            -1 => Some(PlayerState::Unstarted),
            0 => Some(PlayerState::Ended),
            1 => Some(PlayerState::Playing),
            2 => Some(PlayerState::Paused),
            3 => Some(PlayerState::Buffering),
            5 => Some(PlayerState::Cued),
            _ => None,
        }
    }
}

impl fmt::Display for PlayerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerState::Unstarted => write!(f, "UNSTARTED"),
            PlayerState::Ended => write!(f, "ENDED"),
            PlayerState::Playing => write!(f, "PLAYING"),
            PlayerState::Paused => write!(f, "PAUSED"),
            PlayerState::Buffering => write!(f, "BUFFERING"),
            PlayerState::Cued => write!(f, "CUED"),
        }
    }
}

/// Video information reported by the player
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoData {
    pub video_id: String,
    pub title: Option<String>,
}

/// Size and behaviour options for player creation
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerOptions {
    pub width: u32,
    pub height: u32,
    pub autoplay: bool,
    pub controls: bool,
}

impl Default for PlayerOptions {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            autoplay: true,
            controls: true,
        }
    }
}

impl From<&EmbedConfig> for PlayerOptions {
    fn from(config: &EmbedConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
            autoplay: config.autoplay,
            controls: config.controls,
        }
    }
}

/// Live player commands
#[async_trait]
pub trait Player: Send + Sync {
    /// Load and start a video, honouring the requested bounds
    async fn load_video(&self, request: &LoadRequest) -> Result<(), PlayerError>;

    /// Jump to `seconds` within the current video
    async fn seek_to(&self, seconds: f64) -> Result<(), PlayerError>;

    /// Duration of the current video in seconds (0 if unknown)
    async fn duration(&self) -> f64;

    async fn video_data(&self) -> VideoData;
}

/// A player together with its state-transition stream
pub struct PlayerSession {
    pub player: Arc<dyn Player>,
    pub states: mpsc::UnboundedReceiver<PlayerState>,
}

impl fmt::Debug for PlayerSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayerSession").finish_non_exhaustive()
    }
}

/// Creates players on demand
#[async_trait]
pub trait PlayerFactory: Send + Sync {
    /// Initialize a player; may take arbitrarily long or never finish
    async fn init_player(&self, options: &PlayerOptions) -> Result<PlayerSession, PlayerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_codes_roundtrip() {
        for state in [
            PlayerState::Unstarted,
            PlayerState::Ended,
            PlayerState::Playing,
            PlayerState::Paused,
            PlayerState::Buffering,
            PlayerState::Cued,
        ] {
            assert_eq!(PlayerState::from_code(state.code()), Some(state));
        }
        assert_eq!(PlayerState::from_code(4), None);
    }

    #[test]
    fn test_options_from_config() {
        let config = EmbedConfig {
            width: 1280,
            height: 720,
            controls: false,
            ..Default::default()
        };
        let options = PlayerOptions::from(&config);
        assert_eq!(options.width, 1280);
        assert_eq!(options.height, 720);
        assert!(options.autoplay);
        assert!(!options.controls);
        assert_eq!(PlayerOptions::default().width, 640);
    }
}
