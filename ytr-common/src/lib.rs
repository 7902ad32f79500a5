//! # YT Repeater Common Library
//!
//! Shared code for the YT Repeater crates including:
//! - Error type and Result alias
//! - Host-facing embed events and the EventBus that carries them
//! - Configuration loading and root folder resolution
//! - Async hand-off primitives (Deferred, Debouncer)
//! - Timestamp helpers

pub mod config;
pub mod debounce;
pub mod deferred;
pub mod error;
pub mod events;
pub mod time;

pub use debounce::Debouncer;
pub use deferred::Deferred;
pub use error::{Error, Result};
pub use events::{EmbedEvent, EventBus};
