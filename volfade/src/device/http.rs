//! Remote audio player reached over HTTP
//!
//! Speaks the audio player volume API:
//! - `GET {base}/audio/volume` returns `{"volume": 0..=100}`
//! - `POST {base}/audio/volume` with the same body sets it
//!
//! The wire scale is whole percent, so setpoints are quantized to 0.01.

use super::VolumeDevice;
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::trace;

#[derive(Debug, Serialize, Deserialize)]
struct VolumeBody {
    /// 0-100 user-facing scale
    volume: Option<f64>,
}

/// Volume device backed by a remote player's HTTP API
#[derive(Debug, Clone)]
pub struct HttpVolumeDevice {
    name: String,
    volume_url: String,
    client: reqwest::Client,
}

impl HttpVolumeDevice {
    pub fn new(name: impl Into<String>, base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            name: name.into(),
            volume_url: format!("{}/audio/volume", base_url.trim_end_matches('/')),
            client,
        })
    }

    pub fn volume_url(&self) -> &str {
        &self.volume_url
    }
}

/// Convert a 0.0-1.0 volume to the wire's whole-percent scale
pub(crate) fn to_percent(volume: f32) -> u8 {
    (volume.clamp(0.0, 1.0) * 100.0).round() as u8
}

/// Convert a wire percent value to the 0.0-1.0 scale
pub(crate) fn from_percent(percent: f64) -> f32 {
    (percent / 100.0).clamp(0.0, 1.0) as f32
}

#[async_trait]
impl VolumeDevice for HttpVolumeDevice {
    async fn read_volume(&self) -> Result<Option<f32>> {
        let response = self
            .client
            .get(&self.volume_url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::device_unavailable(&self.name, e))?;

        let body: VolumeBody = response
            .json()
            .await
            .map_err(|e| Error::device_unavailable(&self.name, e))?;

        trace!(player = %self.name, volume = ?body.volume, "Read remote volume");
        Ok(body.volume.filter(|v| v.is_finite()).map(from_percent))
    }

    async fn write_volume(&self, volume: f32) -> Result<()> {
        let percent = to_percent(volume);
        self.client
            .post(&self.volume_url)
            .json(&serde_json::json!({ "volume": percent }))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::device_unavailable(&self.name, e))?;

        trace!(player = %self.name, percent, "Wrote remote volume");
        Ok(())
    }
}
