//! Configuration loading and root folder resolution
//!
//! Bootstrap configuration lives in an optional TOML file. A missing file is
//! not an error: every setting has a built-in default, and the caller gets a
//! warning instead of a failed startup.
//!
//! Root folder priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`YTR_ROOT_FOLDER`)
//! 3. TOML config file (`root_folder`)
//! 4. OS-dependent compiled default (fallback)

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable that overrides the root folder
pub const ROOT_FOLDER_ENV: &str = "YTR_ROOT_FOLDER";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Folder holding the history database (optional)
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub embed: EmbedConfig,

    #[serde(default)]
    pub history: HistoryConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Filter directives: a bare level (`info`) or per-crate (`ytr_embed=debug`)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Embed and player bootstrap settings
#[derive(Debug, Clone, Deserialize)]
pub struct EmbedConfig {
    /// Quiescence window before input changes are applied to the player
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Player width in pixels
    #[serde(default = "default_width")]
    pub width: u32,

    /// Player height in pixels
    #[serde(default = "default_height")]
    pub height: u32,

    #[serde(default = "default_true")]
    pub autoplay: bool,

    #[serde(default = "default_true")]
    pub controls: bool,
}

impl EmbedConfig {
    pub fn debounce_window(&self) -> Duration {
        crate::time::millis_to_duration(self.debounce_ms)
    }
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            width: default_width(),
            height: default_height(),
            autoplay: true,
            controls: true,
        }
    }
}

/// Playback history settings
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryConfig {
    /// Maximum number of remembered videos
    #[serde(default = "default_history_capacity")]
    pub capacity: usize,

    /// Database file name, relative to the root folder unless absolute
    #[serde(default = "default_database_file")]
    pub database_file: PathBuf,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: default_history_capacity(),
            database_file: default_database_file(),
        }
    }
}

fn default_log_level() -> String {
    "ytr_embed=debug,ytr_history=debug,ytr_common=info".to_string()
}

fn default_debounce_ms() -> u64 {
    100
}

fn default_width() -> u32 {
    640
}

fn default_height() -> u32 {
    480
}

fn default_true() -> bool {
    true
}

fn default_history_capacity() -> usize {
    10
}

fn default_database_file() -> PathBuf {
    PathBuf::from("ytr.db")
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn parse(toml_str: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(toml_str)
            .map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from an explicit path
    pub fn load(path: &Path) -> Result<Self> {
        let toml_str = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;
        let config = Self::parse(&toml_str)?;
        info!("Loaded TOML configuration from {:?}", path);
        Ok(config)
    }

    /// Load configuration, falling back to defaults when no file exists
    ///
    /// An explicit path that cannot be read or parsed is still an error.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        match default_config_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => {
                warn!("No config file found, using built-in defaults");
                Ok(Self::default())
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if self.history.capacity == 0 {
            return Err(Error::Config(
                "history.capacity must be at least 1".to_string(),
            ));
        }
        if self.embed.width == 0 || self.embed.height == 0 {
            return Err(Error::Config(
                "embed.width and embed.height must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Absolute path of the history database under `root_folder`
    pub fn database_path(&self, root_folder: &Path) -> PathBuf {
        if self.history.database_file.is_absolute() {
            self.history.database_file.clone()
        } else {
            root_folder.join(&self.history.database_file)
        }
    }
}

/// Resolves the root folder following the documented priority order
#[derive(Debug, Clone)]
pub struct RootFolderResolver {
    cli_arg: Option<PathBuf>,
    toml_value: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(cli_arg: Option<PathBuf>, config: &TomlConfig) -> Self {
        Self {
            cli_arg,
            toml_value: config.root_folder.clone(),
        }
    }

    pub fn resolve(&self) -> PathBuf {
        // Priority 1: Command-line argument
        if let Some(path) = &self.cli_arg {
            return path.clone();
        }

        // Priority 2: Environment variable
        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
            if !path.is_empty() {
                return PathBuf::from(path);
            }
        }

        // Priority 3: TOML config file
        if let Some(path) = &self.toml_value {
            return path.clone();
        }

        // Priority 4: OS-dependent compiled default
        get_default_root_folder()
    }
}

/// Default configuration file path for the platform
///
/// `<config_dir>/ytr/config.toml`, if the platform has a config directory.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("ytr").join("config.toml"))
}

/// Get OS-dependent default root folder path
pub fn get_default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("ytr"))
        .unwrap_or_else(|| PathBuf::from("./ytr_data"))
}
