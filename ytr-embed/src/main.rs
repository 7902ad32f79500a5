//! Loop embed host (ytr-embed) - Main entry point
//!
//! Drives a [`LoopEmbed`] over the simulated player from the command line
//! and keeps the play history in the local database.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::signal;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ytr_common::config::{RootFolderResolver, TomlConfig};
use ytr_common::{EmbedEvent, EventBus};
use ytr_embed::player::SimulatedPlayerFactory;
use ytr_embed::LoopEmbed;
use ytr_history::{HistoryBackend, HistoryEntry, MemoryBackend, RecencyStore, SqliteBackend};

/// Command-line arguments for ytr-embed
#[derive(Parser, Debug)]
#[command(name = "ytr-embed")]
#[command(about = "Loop a video segment and keep a play history")]
#[command(version)]
struct Args {
    /// Configuration file (defaults to the platform config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Root folder holding the history database
    #[arg(short, long, global = true)]
    root_folder: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Loop a segment of a video
    Play {
        /// Video identifier
        #[arg(short, long)]
        video: String,

        /// Loop start in seconds
        #[arg(short, long)]
        start: Option<String>,

        /// Loop end in seconds
        #[arg(short, long)]
        end: Option<String>,

        /// Loop bounds as `start-end`
        #[arg(long, conflicts_with_all = ["start", "end"])]
        range: Option<String>,

        /// Stop after this many restarts
        #[arg(short, long, default_value_t = 3)]
        loops: u64,

        /// Simulated playback speed
        #[arg(long, default_value_t = 1.0)]
        speed: f64,
    },

    /// Inspect or reset the play history
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
}

#[derive(Subcommand, Debug)]
enum HistoryAction {
    /// Print the history, most recent first
    List,
    /// Remove every entry
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = TomlConfig::load_or_default(args.config.as_deref())
        .context("Failed to load configuration")?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let root_folder = RootFolderResolver::new(args.root_folder.clone(), &config).resolve();
    info!("Root folder: {}", root_folder.display());

    let store = open_history(&config, &root_folder).await;

    match args.command {
        Command::Play {
            video,
            start,
            end,
            range,
            loops,
            speed,
        } => {
            let inputs = [
                ("v", Some(video)),
                ("start", start),
                ("end", end),
                ("range", range),
            ];
            play(&config, &store, &inputs, loops, speed).await?;
        }
        Command::History { action } => match action {
            HistoryAction::List => {
                let entries = store.current_entries();
                let json = serde_json::to_string_pretty(&entries)
                    .context("Failed to serialize history")?;
                println!("{}", json);
            }
            HistoryAction::Clear => {
                store.clear().await;
                info!("History cleared");
            }
        },
    }

    Ok(())
}

/// Open the history store, degrading to memory when the database is unusable
async fn open_history(config: &TomlConfig, root_folder: &std::path::Path) -> RecencyStore {
    let db_path = config.database_path(root_folder);

    let backend: Arc<dyn HistoryBackend> = match SqliteBackend::open(&db_path).await {
        Ok(backend) => Arc::new(backend),
        Err(e) => {
            warn!("History database {} unavailable, keeping history in memory: {}", db_path.display(), e);
            Arc::new(MemoryBackend::new())
        }
    };

    let store = RecencyStore::new(backend, config.history.capacity);
    if let Err(e) = store.initialize().await {
        warn!("History persistence disabled: {}", e);
    }
    store
}

async fn play(
    config: &TomlConfig,
    store: &RecencyStore,
    inputs: &[(&str, Option<String>)],
    loops: u64,
    speed: f64,
) -> Result<()> {
    let bus = EventBus::default();
    let mut events = bus.subscribe();

    let embed = LoopEmbed::new(bus.clone(), &config.embed);
    for (name, value) in inputs {
        if let Some(value) = value {
            embed.set_input(name, value.as_str());
        }
    }
    embed.mount(Arc::new(SimulatedPlayerFactory::new().with_speed(speed)));

    let mut status = embed.watch_status();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(EmbedEvent::Ready { .. }) => info!("Player ready"),
                Ok(EmbedEvent::Meta { video_id, duration, title, timestamp, .. }) => {
                    info!(%video_id, duration, title = ?title, "Now looping");
                    let playing = embed.status().playing;
                    let mut entry = HistoryEntry::new(video_id)
                        .with_field("duration", duration)
                        .with_field("timestamp", timestamp.to_rfc3339());
                    if let Some(title) = title {
                        entry = entry.with_field("title", title);
                    }
                    if let Some(spec) = playing {
                        if let Some(start) = spec.start_seconds {
                            entry = entry.with_field("startSeconds", start);
                        }
                        if let Some(end) = spec.end_seconds {
                            entry = entry.with_field("endSeconds", end);
                        }
                    }
                    let entries = store.record_play(entry).await;
                    info!("History holds {} entries", entries.len());
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Event stream lagged, skipped {} events", skipped);
                }
                Err(RecvError::Closed) => break,
            },
            changed = status.changed() => {
                if changed.is_err() {
                    warn!("Embed session stopped");
                    break;
                }
                let current = status.borrow_and_update().clone();
                if current.phase == ytr_embed::EmbedPhase::Failed {
                    anyhow::bail!("Player could not be initialized");
                }
                if current.loops >= loops {
                    info!("Completed {} loops", current.loops);
                    break;
                }
            },
            _ = &mut shutdown => break,
        }
    }

    embed.unmount();
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install terminate handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
