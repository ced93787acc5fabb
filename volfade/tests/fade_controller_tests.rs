//! Fade controller behaviour against a simulated player
//!
//! All tests run with a paused Tokio clock, so 100 ms ticks advance
//! instantly and elapsed time is exact.

use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use volfade::device::{MemoryDevice, PlayerRef, VolumeDevice};
use volfade::fade::{
    run_fade, FadeOutcome, FadePlan, FadeRequest, StopReason, TICK_INTERVAL,
};
use volfade::Error;
use volfade_common::FadeCurve;

fn sim() -> PlayerRef {
    PlayerRef::from("sim")
}

async fn fade(device: &MemoryDevice, request: FadeRequest) -> Result<FadeOutcome, Error> {
    run_fade(&sim(), device, &request, &CancellationToken::new()).await
}

// ============================================================================
// Final value
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_final_volume_is_exact_target_for_all_curves() {
    for curve in FadeCurve::all_variants() {
        for (start, target) in [(0.0, 1.0), (1.0, 0.0), (0.35, 0.6), (0.9, 0.15)] {
            let device = MemoryDevice::new("sim", start);
            fade(&device, FadeRequest::new(target, 2.0, *curve))
                .await
                .unwrap();

            assert_eq!(
                device.volume().await,
                Some(target),
                "{:?} {} -> {}",
                curve,
                start,
                target
            );
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_intermediate_setpoints_follow_curve() {
    let device = MemoryDevice::new("sim", 0.0);
    let request = FadeRequest::new(1.0, 1.0, FadeCurve::Bezier);
    fade(&device, request).await.unwrap();

    let writes = device.writes().await;
    let plan = FadePlan::new(Some(0.0), &request);
    for (i, written) in writes.iter().take(9).enumerate() {
        let expected = plan.step(i as u32 + 1).setpoint;
        assert!((written - expected).abs() < 1e-6, "step {}", i + 1);
    }

    // Bezier at t = 0.5 gives 1/3 of the way
    assert!((writes[4] - 1.0 / 3.0).abs() < 1e-6, "got {}", writes[4]);
}

#[tokio::test(start_paused = true)]
async fn test_setpoints_stay_in_range() {
    let device = MemoryDevice::new("sim", 0.0);
    fade(&device, FadeRequest::new(1.0, 3.0, FadeCurve::Bezier))
        .await
        .unwrap();

    for setpoint in device.writes().await {
        assert!((0.0..=1.0).contains(&setpoint));
    }
}

// ============================================================================
// Stop conditions
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_steps_exhausted_writes_n_minus_one_setpoints() {
    let device = MemoryDevice::new("sim", 0.1);
    let outcome = fade(&device, FadeRequest::new(0.9, 5.0, FadeCurve::Logarithmic))
        .await
        .unwrap();

    match outcome {
        FadeOutcome::Completed {
            stop,
            plan,
            setpoints_written,
        } => {
            assert_eq!(stop, StopReason::StepsExhausted);
            assert_eq!(plan.total_steps, 50);
            assert_eq!(setpoints_written, 49);
        }
        other => panic!("Expected completion, got {:?}", other),
    }
    assert_eq!(device.writes().await.len(), 50);
}

#[tokio::test(start_paused = true)]
async fn test_external_change_to_target_converges_early() {
    let device = std::sync::Arc::new(MemoryDevice::new("sim", 0.0));

    let fader = {
        let device = device.clone();
        tokio::spawn(async move {
            run_fade(
                &sim(),
                device.as_ref(),
                &FadeRequest::new(0.7, 10.0, FadeCurve::Linear),
                &CancellationToken::new(),
            )
            .await
        })
    };

    // Someone else sets the volume to the target mid-fade
    tokio::time::sleep(Duration::from_millis(450)).await;
    device.set_external(0.7).await;

    let outcome = fader.await.unwrap().unwrap();
    match outcome {
        FadeOutcome::Completed {
            stop,
            setpoints_written,
            ..
        } => {
            assert_eq!(stop, StopReason::ConvergedEarly);
            assert!(setpoints_written < 10, "wrote {}", setpoints_written);
        }
        other => panic!("Expected completion, got {:?}", other),
    }
    assert_eq!(device.volume().await, Some(0.7));
}

#[tokio::test(start_paused = true)]
async fn test_unreported_start_volume_fades_from_zero() {
    let device = MemoryDevice::without_volume("sim");
    let outcome = fade(&device, FadeRequest::new(0.5, 1.0, FadeCurve::Linear))
        .await
        .unwrap();

    assert_eq!(outcome.plan().start_volume, 0.0);
    let writes = device.writes().await;
    assert!((writes[0] - 0.05).abs() < 1e-6);
    assert_eq!(*writes.last().unwrap(), 0.5);
}

// ============================================================================
// Timing
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_one_tick_between_setpoints() {
    let device = MemoryDevice::new("sim", 0.0);
    let started = Instant::now();

    fade(&device, FadeRequest::new(1.0, 2.0, FadeCurve::Linear))
        .await
        .unwrap();

    // 20 steps: 19 setpoints, each followed by one tick
    assert_eq!(started.elapsed(), TICK_INTERVAL * 19);
}

// ============================================================================
// Errors
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_invalid_duration_rejected_without_io() {
    let device = MemoryDevice::new("sim", 0.3);
    device.fail_reads(true).await;

    let err = fade(&device, FadeRequest::new(0.5, 0.05, FadeCurve::Linear))
        .await
        .unwrap_err();

    // Validation happens before the start read
    assert!(matches!(err, Error::InvalidInput(_)));
    assert!(device.writes().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_unreadable_player_fails_before_writing() {
    let device = MemoryDevice::new("sim", 0.3);
    device.fail_reads(true).await;

    let err = fade(&device, FadeRequest::new(0.5, 1.0, FadeCurve::Linear))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::DeviceUnavailable { .. }));
    assert!(device.writes().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_failed_write_is_not_retried() {
    let device = MemoryDevice::new("sim", 0.0);
    device.fail_writes_after(3).await;

    let err = fade(&device, FadeRequest::new(1.0, 2.0, FadeCurve::Linear))
        .await
        .unwrap_err();

    match err {
        Error::DeviceUnavailable { player, .. } => assert_eq!(player, "sim"),
        other => panic!("Expected DeviceUnavailable, got {:?}", other),
    }

    // Three successful steps, no rollback and no finalize
    let writes = device.writes().await;
    assert_eq!(writes.len(), 3);
    assert_eq!(device.volume().await, Some(writes[2]));
}

#[tokio::test(start_paused = true)]
async fn test_cancel_mid_fade_leaves_last_setpoint() {
    let device = std::sync::Arc::new(MemoryDevice::new("sim", 0.0));
    let cancel = CancellationToken::new();

    let fader = {
        let device = device.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            run_fade(
                &sim(),
                device.as_ref(),
                &FadeRequest::new(1.0, 5.0, FadeCurve::Linear),
                &cancel,
            )
            .await
        })
    };

    tokio::time::sleep(Duration::from_millis(250)).await;
    cancel.cancel();

    let outcome = fader.await.unwrap().unwrap();
    assert!(outcome.is_cancelled());

    let writes = device.writes().await;
    assert!(!writes.is_empty());
    assert!(writes.iter().all(|v| *v < 1.0), "no finalize write after cancel");
    assert_eq!(device.volume().await, writes.last().copied());
}

// ============================================================================
// Cancellation during device I/O
// ============================================================================

/// Player that cancels the fade from inside its own I/O
///
/// Reads and writes are counted from 1; the plan read is read 1.
#[derive(Debug)]
struct CancellingPlayer {
    inner: MemoryDevice,
    cancel: CancellationToken,
    cancel_on_read: Option<usize>,
    cancel_on_write: Option<usize>,
    /// Reading reported by the cancelling read
    reading_on_cancel: Option<f32>,
    reads: std::sync::atomic::AtomicUsize,
}

impl CancellingPlayer {
    fn new(initial: f32, cancel: &CancellationToken) -> Self {
        Self {
            inner: MemoryDevice::new("sim", initial),
            cancel: cancel.clone(),
            cancel_on_read: None,
            cancel_on_write: None,
            reading_on_cancel: None,
            reads: std::sync::atomic::AtomicUsize::new(0),
        }
    }
}

#[async_trait::async_trait]
impl VolumeDevice for CancellingPlayer {
    async fn read_volume(&self) -> volfade::Result<Option<f32>> {
        let n = self.reads.fetch_add(1, std::sync::atomic::Ordering::SeqCst) + 1;
        let reading = self.inner.read_volume().await?;
        if self.cancel_on_read == Some(n) {
            self.cancel.cancel();
            if let Some(forced) = self.reading_on_cancel {
                return Ok(Some(forced));
            }
        }
        Ok(reading)
    }

    async fn write_volume(&self, volume: f32) -> volfade::Result<()> {
        self.inner.write_volume(volume).await?;
        if self.cancel_on_write == Some(self.inner.writes().await.len()) {
            self.cancel.cancel();
        }
        Ok(())
    }
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_converging_read_skips_finalize() {
    let cancel = CancellationToken::new();
    let player = CancellingPlayer {
        cancel_on_read: Some(2),
        reading_on_cancel: Some(0.8),
        ..CancellingPlayer::new(0.2, &cancel)
    };

    let outcome = run_fade(
        &sim(),
        &player,
        &FadeRequest::new(0.8, 1.0, FadeCurve::Linear),
        &cancel,
    )
    .await
    .unwrap();

    assert!(outcome.is_cancelled(), "got {:?}", outcome);
    assert_eq!(outcome.setpoints_written(), 0);
    assert!(player.inner.writes().await.is_empty());
    assert_eq!(player.inner.volume().await, Some(0.2));
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_read_stops_before_next_setpoint() {
    let cancel = CancellationToken::new();
    let player = CancellingPlayer {
        cancel_on_read: Some(4),
        ..CancellingPlayer::new(0.0, &cancel)
    };

    let outcome = run_fade(
        &sim(),
        &player,
        &FadeRequest::new(1.0, 2.0, FadeCurve::Linear),
        &cancel,
    )
    .await
    .unwrap();

    // Reads 2 and 3 each led to a setpoint; read 4 was cancelled
    assert!(outcome.is_cancelled());
    assert_eq!(outcome.setpoints_written(), 2);
    assert_eq!(player.inner.writes().await.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_write_issues_no_further_writes() {
    let cancel = CancellationToken::new();
    let player = CancellingPlayer {
        cancel_on_write: Some(3),
        ..CancellingPlayer::new(0.0, &cancel)
    };
    let started = Instant::now();

    let outcome = run_fade(
        &sim(),
        &player,
        &FadeRequest::new(1.0, 2.0, FadeCurve::Linear),
        &cancel,
    )
    .await
    .unwrap();

    assert!(outcome.is_cancelled());
    assert_eq!(outcome.setpoints_written(), 3);

    let writes = player.inner.writes().await;
    assert_eq!(writes.len(), 3);
    assert!(!writes.contains(&1.0));

    // The tick after the cancelled write is not waited out
    assert_eq!(started.elapsed(), TICK_INTERVAL * 2);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_last_setpoint_skips_finalize() {
    let cancel = CancellationToken::new();
    let player = CancellingPlayer {
        cancel_on_write: Some(2),
        ..CancellingPlayer::new(0.0, &cancel)
    };

    // 3 steps: setpoints 1 and 2, then exhaustion
    let outcome = run_fade(
        &sim(),
        &player,
        &FadeRequest::new(0.9, 0.3, FadeCurve::Linear),
        &cancel,
    )
    .await
    .unwrap();

    assert!(outcome.is_cancelled());
    let writes = player.inner.writes().await;
    assert_eq!(writes.len(), 2);
    assert_ne!(*writes.last().unwrap(), 0.9);
}
