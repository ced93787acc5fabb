//! Discrete-time fade controller
//!
//! Drives one player from its current volume to a target volume in fixed
//! 100 ms ticks:
//!
//! 1. **Plan**: read the start volume and fix the step count.
//! 2. **Iterate**: at the top of every tick check cancellation, step
//!    exhaustion (`index >= total_steps`) and convergence (a fresh device
//!    reading within tolerance of the target). Otherwise write the shaped
//!    setpoint and wait one tick.
//! 3. **Finalize**: write the exact target once, whichever stop condition
//!    ended the loop.
//!
//! Device I/O latency adds to the tick wait instead of overlapping it, so
//! scheduler and network jitter stretch a fade but never shorten it. A
//! failed read or write ends the fade with `DeviceUnavailable`; nothing is
//! retried or rolled back. Cancellation ends the fade without the finalize
//! write.

use super::plan::{FadePlan, FadeRequest, TICK_INTERVAL};
use crate::device::{PlayerRef, VolumeDevice};
use crate::error::Result;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use volfade_common::events::StopReason;

/// How a fade ended
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FadeOutcome {
    /// Loop ended on a stop condition and the exact target was written
    Completed {
        stop: StopReason,
        plan: FadePlan,
        /// Intermediate setpoints, not counting the finalize write
        setpoints_written: u32,
    },

    /// Cancelled or superseded; no finalize write was issued
    Cancelled {
        plan: FadePlan,
        setpoints_written: u32,
    },
}

impl FadeOutcome {
    pub fn plan(&self) -> &FadePlan {
        match self {
            FadeOutcome::Completed { plan, .. } | FadeOutcome::Cancelled { plan, .. } => plan,
        }
    }

    pub fn setpoints_written(&self) -> u32 {
        match self {
            FadeOutcome::Completed {
                setpoints_written, ..
            }
            | FadeOutcome::Cancelled {
                setpoints_written, ..
            } => *setpoints_written,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, FadeOutcome::Cancelled { .. })
    }
}

/// Validate the request and plan the fade from the player's current volume
pub async fn plan_fade(
    player: &PlayerRef,
    device: &dyn VolumeDevice,
    request: &FadeRequest,
) -> Result<FadePlan> {
    request.validate()?;

    let reading = device.read_volume().await?;
    let plan = FadePlan::new(reading, request);

    debug!(
        player = %player,
        start_volume = plan.start_volume,
        target_volume = plan.target_volume,
        total_steps = plan.total_steps,
        curve = %plan.curve,
        "Fade planned"
    );
    Ok(plan)
}

/// Run a planned fade to completion or cancellation
pub async fn execute_plan(
    player: &PlayerRef,
    device: &dyn VolumeDevice,
    plan: FadePlan,
    cancel: &CancellationToken,
) -> Result<FadeOutcome> {
    let mut index: u32 = 1;
    let mut setpoints_written: u32 = 0;

    let stop = loop {
        if cancel.is_cancelled() {
            return Ok(cancelled(player, plan, setpoints_written));
        }

        if index >= plan.total_steps {
            break StopReason::StepsExhausted;
        }

        let reading = device.read_volume().await?.unwrap_or(0.0);

        // A supersede may land while the read is in flight
        if cancel.is_cancelled() {
            return Ok(cancelled(player, plan, setpoints_written));
        }

        if plan.is_converged(reading) {
            break StopReason::ConvergedEarly;
        }

        let step = plan.step(index);
        device.write_volume(step.setpoint).await?;
        setpoints_written += 1;

        debug!(
            player = %player,
            index = step.index,
            t = step.t,
            shaped_t = step.shaped_t,
            setpoint = step.setpoint,
            "Fade step"
        );

        tokio::select! {
            _ = cancel.cancelled() => {}
            _ = tokio::time::sleep(TICK_INTERVAL) => {}
        }

        index += 1;
    };

    // The superseding fade owns finalization
    if cancel.is_cancelled() {
        return Ok(cancelled(player, plan, setpoints_written));
    }

    device.write_volume(plan.target_volume).await?;

    info!(
        player = %player,
        target_volume = plan.target_volume,
        reason = %stop,
        setpoints_written,
        "Fade complete"
    );

    Ok(FadeOutcome::Completed {
        stop,
        plan,
        setpoints_written,
    })
}

fn cancelled(player: &PlayerRef, plan: FadePlan, setpoints_written: u32) -> FadeOutcome {
    info!(player = %player, setpoints_written, "Fade cancelled");
    FadeOutcome::Cancelled {
        plan,
        setpoints_written,
    }
}

/// Fade a player's volume: plan, iterate, finalize
///
/// Returns `InvalidInput` without touching the device when the request is
/// out of range.
pub async fn run_fade(
    player: &PlayerRef,
    device: &dyn VolumeDevice,
    request: &FadeRequest,
    cancel: &CancellationToken,
) -> Result<FadeOutcome> {
    let plan = plan_fade(player, device, request).await?;
    execute_plan(player, device, plan, cancel).await
}
