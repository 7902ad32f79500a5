//! # YT Repeater Loop Embed (ytr-embed)
//!
//! Embeddable loop player driven by declarative inputs.
//!
//! **Purpose:** Turn `v`/`start`/`end`/`range` input changes into player
//! load commands, restart the selected segment whenever the player reports
//! that playback ended, and publish `Ready`/`Meta` events to the host.
//!
//! **Architecture:** Each [`LoopEmbed`] is a handle onto one actor task that
//! owns the embed's session state. Input changes, debounce firings and player
//! state transitions all arrive as messages on the actor's channel and are
//! handled one at a time, so player commands of one embed never interleave.
//! The third-party player is reached through the [`player::PlayerFactory`]
//! and [`player::Player`] traits.

pub mod embed;
pub mod player;
pub mod spec;

pub use embed::{EmbedPhase, EmbedStatus, LoopEmbed, PlaybackPhase};
pub use spec::{InputChange, InputError, LoadRequest, PlaybackSpec};
