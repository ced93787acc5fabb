//! Player volume collaborators
//!
//! The fade controller only needs two operations from a player: read the
//! current volume and write a new setpoint. Everything about discovery and
//! transport lives behind [`VolumeDevice`].

pub mod http;
pub mod memory;

pub use http::HttpVolumeDevice;
pub use memory::MemoryDevice;

use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use volfade_common::config::{HttpConfig, PlayerConfig, PlayerKind};

/// Opaque player identifier
///
/// Also the key for "which fade currently owns this player".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerRef(String);

impl PlayerRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PlayerRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerRef {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for PlayerRef {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// A player whose volume can be read and set
///
/// Volumes are on the `[0.0, 1.0]` scale. Implementations report any
/// transport failure as [`Error::DeviceUnavailable`].
#[async_trait]
pub trait VolumeDevice: Send + Sync + std::fmt::Debug {
    /// Read the live volume
    ///
    /// `Ok(None)` means the player answered but reported no volume.
    async fn read_volume(&self) -> Result<Option<f32>>;

    /// Apply a volume setpoint
    async fn write_volume(&self, volume: f32) -> Result<()>;
}

/// Lookup table from player name to its device
#[derive(Debug, Clone, Default)]
pub struct PlayerDirectory {
    players: HashMap<PlayerRef, Arc<dyn VolumeDevice>>,
}

impl PlayerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the directory from `[[players]]` config entries
    pub fn from_config(players: &[PlayerConfig], http: &HttpConfig) -> Result<Self> {
        let timeout = Duration::from_millis(http.request_timeout_ms);
        let mut directory = Self::new();

        for player in players {
            let device: Arc<dyn VolumeDevice> = match player.kind {
                PlayerKind::Http => {
                    let url = player.url.as_deref().ok_or_else(|| {
                        Error::Config(format!("Player {} has no url", player.name))
                    })?;
                    Arc::new(HttpVolumeDevice::new(&player.name, url, timeout)?)
                }
                PlayerKind::Memory => Arc::new(MemoryDevice::new(
                    &player.name,
                    player.initial_volume.unwrap_or(0.0),
                )),
            };

            info!(player = %player.name, kind = ?player.kind, "Registered player");
            directory.insert(PlayerRef::new(player.name.clone()), device);
        }

        Ok(directory)
    }

    /// Add or replace a player
    pub fn insert(&mut self, player: PlayerRef, device: Arc<dyn VolumeDevice>) {
        self.players.insert(player, device);
    }

    /// Resolve a player reference
    pub fn get(&self, player: &PlayerRef) -> Result<Arc<dyn VolumeDevice>> {
        self.players
            .get(player)
            .cloned()
            .ok_or_else(|| Error::InvalidInput(format!("Unknown player: {}", player)))
    }

    /// All configured players, sorted by name
    pub fn players(&self) -> Vec<PlayerRef> {
        let mut names: Vec<PlayerRef> = self.players.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}
