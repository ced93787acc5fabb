//! In-process simulated player
//!
//! Holds a volume behind an async RwLock and records every setpoint written
//! through [`VolumeDevice`]. Faults can be injected to exercise the error
//! paths, and [`MemoryDevice::set_external`] simulates another controller
//! (a user turning the knob) changing the volume mid-fade.

use super::VolumeDevice;
use crate::error::{Error, Result};
use async_trait::async_trait;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct MemoryState {
    volume: Option<f32>,
    writes: Vec<f32>,
    fail_reads: bool,
    /// Writes succeed until this many have been recorded
    write_budget: Option<usize>,
}

/// Simulated player volume
#[derive(Debug)]
pub struct MemoryDevice {
    name: String,
    state: RwLock<MemoryState>,
}

impl MemoryDevice {
    pub fn new(name: impl Into<String>, initial_volume: f32) -> Self {
        Self {
            name: name.into(),
            state: RwLock::new(MemoryState {
                volume: Some(initial_volume),
                ..MemoryState::default()
            }),
        }
    }

    /// Player that answers reads but reports no volume
    pub fn without_volume(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: RwLock::new(MemoryState::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current volume, if any
    pub async fn volume(&self) -> Option<f32> {
        self.state.read().await.volume
    }

    /// Change the volume without recording a write
    pub async fn set_external(&self, volume: f32) {
        self.state.write().await.volume = Some(volume);
    }

    /// Every setpoint written through the device interface, in order
    pub async fn writes(&self) -> Vec<f32> {
        self.state.read().await.writes.clone()
    }

    /// Make subsequent reads fail
    pub async fn fail_reads(&self, fail: bool) {
        self.state.write().await.fail_reads = fail;
    }

    /// Let `count` more writes succeed, then fail every write after that
    pub async fn fail_writes_after(&self, count: usize) {
        let mut state = self.state.write().await;
        state.write_budget = Some(state.writes.len() + count);
    }
}

#[async_trait]
impl VolumeDevice for MemoryDevice {
    async fn read_volume(&self) -> Result<Option<f32>> {
        let state = self.state.read().await;
        if state.fail_reads {
            return Err(Error::device_unavailable(&self.name, "simulated read failure"));
        }
        Ok(state.volume)
    }

    async fn write_volume(&self, volume: f32) -> Result<()> {
        let mut state = self.state.write().await;
        if let Some(budget) = state.write_budget {
            if state.writes.len() >= budget {
                return Err(Error::device_unavailable(&self.name, "simulated write failure"));
            }
        }
        state.volume = Some(volume);
        state.writes.push(volume);
        Ok(())
    }
}
