//! Bootstrap configuration loading and config file resolution
//!
//! Settings sources, highest priority first:
//! 1. Command-line arguments (handled by the binary)
//! 2. Environment variables (`VOLFADE_CONFIG` for the file location)
//! 3. TOML configuration file
//! 4. Built-in defaults (code constants)
//!
//! A missing config file is not fatal: the service starts with defaults and
//! no configured players.

use crate::params::{self, DEFAULT_DURATION_SECS, DEFAULT_VOLUME};
use crate::{Error, FadeCurve, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "VOLFADE_CONFIG";

/// Default HTTP port for the fade service
pub const DEFAULT_PORT: u16 = 5760;

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Values used when a fade request omits a parameter
    #[serde(default)]
    pub defaults: FadeDefaults,

    /// Outbound HTTP settings for remote players
    #[serde(default)]
    pub http: HttpConfig,

    /// Players the service may fade
    #[serde(default)]
    pub players: Vec<PlayerConfig>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Defaults applied to fade requests with omitted fields
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct FadeDefaults {
    #[serde(default = "default_volume")]
    pub volume: f32,

    /// Seconds
    #[serde(default = "default_duration")]
    pub duration: f64,

    #[serde(default)]
    pub curve: FadeCurve,
}

/// Outbound HTTP client settings
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout for remote player reads and writes
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

/// How a configured player is reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerKind {
    /// Remote audio player exposing `/audio/volume`
    Http,
    /// In-process simulated player
    Memory,
}

/// A player entry from `[[players]]`
#[derive(Debug, Clone, Deserialize)]
pub struct PlayerConfig {
    pub name: String,
    pub kind: PlayerKind,

    /// Base URL (required for `http` players)
    #[serde(default)]
    pub url: Option<String>,

    /// Starting volume (`memory` players only)
    #[serde(default)]
    pub initial_volume: Option<f32>,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_volume() -> f32 {
    DEFAULT_VOLUME
}

fn default_duration() -> f64 {
    DEFAULT_DURATION_SECS
}

fn default_request_timeout_ms() -> u64 {
    2000
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for FadeDefaults {
    fn default() -> Self {
        Self {
            volume: DEFAULT_VOLUME,
            duration: DEFAULT_DURATION_SECS,
            curve: FadeCurve::default(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            logging: LoggingConfig::default(),
            defaults: FadeDefaults::default(),
            http: HttpConfig::default(),
            players: Vec::new(),
        }
    }
}

impl TomlConfig {
    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Resolve the config file location and load it, falling back to defaults
    ///
    /// An explicitly named file (CLI or environment) must exist. When only
    /// the platform locations are searched and none exists, defaults are used.
    ///
    /// Returns the configuration and the path it was loaded from, if any.
    pub fn load_or_default(cli_arg: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        let explicit = cli_arg
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from));

        if let Some(path) = explicit {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            let config = Self::load(&path)?;
            info!("Loaded configuration from {}", path.display());
            return Ok((config, Some(path)));
        }

        match find_platform_config_file() {
            Some(path) => {
                let config = Self::load(&path)?;
                info!("Loaded configuration from {}", path.display());
                Ok((config, Some(path)))
            }
            None => {
                warn!("No config file found, using built-in defaults");
                Ok((Self::default(), None))
            }
        }
    }

    /// Validate ranges and player entries
    pub fn validate(&self) -> Result<()> {
        params::validate_volume(self.defaults.volume)
            .map_err(|e| Error::Config(format!("[defaults] {}", e)))?;
        params::validate_duration_secs(self.defaults.duration)
            .map_err(|e| Error::Config(format!("[defaults] {}", e)))?;

        if self.http.request_timeout_ms == 0 {
            return Err(Error::Config(
                "[http] request_timeout_ms must be greater than zero".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for player in &self.players {
            if player.name.trim().is_empty() {
                return Err(Error::Config("Player name must not be empty".to_string()));
            }
            if !seen.insert(player.name.as_str()) {
                return Err(Error::Config(format!("Duplicate player name: {}", player.name)));
            }

            match player.kind {
                PlayerKind::Http => {
                    let url = player.url.as_deref().unwrap_or_default();
                    if !(url.starts_with("http://") || url.starts_with("https://")) {
                        return Err(Error::Config(format!(
                            "Player {}: http players need an http(s) url",
                            player.name
                        )));
                    }
                }
                PlayerKind::Memory => {
                    if let Some(volume) = player.initial_volume {
                        params::validate_volume(volume).map_err(|e| {
                            Error::Config(format!("Player {}: {}", player.name, e))
                        })?;
                    }
                }
            }
        }

        Ok(())
    }
}

/// Search the platform config locations
///
/// Linux: `~/.config/volfade/config.toml`, then `/etc/volfade/config.toml`.
/// Other platforms: the user config directory only.
fn find_platform_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("volfade").join("config.toml"));
    if let Some(path) = user_config {
        debug!("Checking config file {}", path.display());
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/volfade/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}
