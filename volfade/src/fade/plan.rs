//! Fade planning
//!
//! A [`FadePlan`] is computed once per fade from the player's starting
//! volume and the validated [`FadeRequest`]. The step count is fixed at plan
//! time and never recomputed from elapsed wall time, so scheduler jitter
//! stretches the fade instead of shortening its step budget.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use volfade_common::config::FadeDefaults;
use volfade_common::params::{self, DEFAULT_DURATION_SECS, DEFAULT_VOLUME};
use volfade_common::FadeCurve;

/// Fixed controller tick rate
pub const TICK_RATE_HZ: u32 = 10;

/// Delay between setpoints (1 / TICK_RATE_HZ)
pub const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Device and target volumes closer than this are treated as equal
pub const CONVERGENCE_TOLERANCE: f32 = 0.001;

/// Caller-supplied fade parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FadeRequest {
    /// Target volume, 0.0-1.0
    pub target_volume: f32,
    /// Fade length in seconds, 0.1-60.0
    pub duration_secs: f64,
    pub curve: FadeCurve,
}

impl FadeRequest {
    pub fn new(target_volume: f32, duration_secs: f64, curve: FadeCurve) -> Self {
        Self {
            target_volume,
            duration_secs,
            curve,
        }
    }

    /// Build a request from optional caller inputs
    ///
    /// Omitted fields come from `defaults`; `curve` accepts any name or
    /// alias known to [`FadeCurve::from_str`]. The result is not validated.
    pub fn from_parts(
        target_volume: Option<f32>,
        duration_secs: Option<f64>,
        curve: Option<&str>,
        defaults: &FadeDefaults,
    ) -> Result<Self> {
        let curve = match curve {
            Some(name) => FadeCurve::from_str(name)
                .ok_or_else(|| Error::InvalidInput(format!("Unknown curve: {}", name)))?,
            None => defaults.curve,
        };

        Ok(Self::new(
            target_volume.unwrap_or(defaults.volume),
            duration_secs.unwrap_or(defaults.duration),
            curve,
        ))
    }

    /// Reject out-of-range inputs before any device I/O
    pub fn validate(&self) -> Result<()> {
        params::validate_volume(self.target_volume)?;
        params::validate_duration_secs(self.duration_secs)?;
        Ok(())
    }
}

impl Default for FadeRequest {
    fn default() -> Self {
        Self {
            target_volume: DEFAULT_VOLUME,
            duration_secs: DEFAULT_DURATION_SECS,
            curve: FadeCurve::default(),
        }
    }
}

/// Step count for a fade of `duration_secs` at [`TICK_RATE_HZ`]
///
/// Rounded rather than truncated so that durations like 2.3 s, which are
/// slightly below their decimal value in binary, still get 23 steps.
pub fn total_steps_for(duration_secs: f64) -> u32 {
    let steps = (TICK_RATE_HZ as f64 * duration_secs).round();
    if steps.is_finite() && steps > 0.0 {
        steps.min(u32::MAX as f64) as u32
    } else {
        0
    }
}

/// Immutable plan for one fade
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FadePlan {
    pub start_volume: f32,
    pub target_volume: f32,
    /// target_volume - start_volume
    pub delta: f32,
    pub total_steps: u32,
    pub curve: FadeCurve,
}

/// One computed setpoint
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadeStep {
    /// 1-based, always below `total_steps`
    pub index: u32,
    /// index / total_steps
    pub t: f32,
    /// curve(t)
    pub shaped_t: f32,
    /// start + shaped_t * delta, clamped to [0, 1]
    pub setpoint: f32,
}

impl FadePlan {
    /// Plan a fade from the player's reading
    ///
    /// A missing or non-finite reading is treated as 0.0.
    pub fn new(start_reading: Option<f32>, request: &FadeRequest) -> Self {
        let start_volume = start_reading.filter(|v| v.is_finite()).unwrap_or(0.0);
        Self {
            start_volume,
            target_volume: request.target_volume,
            delta: request.target_volume - start_volume,
            total_steps: total_steps_for(request.duration_secs),
            curve: request.curve,
        }
    }

    /// Compute the setpoint for a 1-based step index
    pub fn step(&self, index: u32) -> FadeStep {
        let t = if self.total_steps == 0 {
            1.0
        } else {
            index as f32 / self.total_steps as f32
        };
        let shaped_t = self.curve.apply(t);
        let setpoint = (self.start_volume + shaped_t * self.delta).clamp(0.0, 1.0);

        FadeStep {
            index,
            t,
            shaped_t,
            setpoint,
        }
    }

    /// Whether a device reading is within tolerance of the target
    pub fn is_converged(&self, reading: f32) -> bool {
        (reading - self.target_volume).abs() <= CONVERGENCE_TOLERANCE
    }

    /// Duration the fade would take with perfectly timed ticks
    pub fn nominal_duration(&self) -> Duration {
        TICK_INTERVAL * self.total_steps
    }
}
