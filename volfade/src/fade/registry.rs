//! Per-player fade ownership
//!
//! At most one fade drives a player at a time. Starting a fade on a player
//! that already has one installs the new fade as owner, cancels the old one
//! and waits for it to exit before the new fade reads its start volume.
//! The superseded fade stops without its finalize write; the new fade owns
//! finalization.
//!
//! Lifecycle events for every fade are emitted on the [`EventBus`].

use super::controller::{execute_plan, plan_fade, FadeOutcome};
use super::plan::FadeRequest;
use crate::device::{PlayerDirectory, PlayerRef, VolumeDevice};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;
use volfade_common::events::{EventBus, FadeEvent};
use volfade_common::FadeCurve;

type ActiveMap = Arc<Mutex<HashMap<PlayerRef, ActiveFade>>>;

/// Registry entry for the fade that currently owns a player
#[derive(Debug)]
struct ActiveFade {
    fade_id: Uuid,
    request: FadeRequest,
    started_at: DateTime<Utc>,
    cancel: CancellationToken,
    exited: watch::Receiver<bool>,
}

/// Snapshot of an active fade
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveFadeInfo {
    pub fade_id: Uuid,
    pub player: PlayerRef,
    pub target_volume: f32,
    pub duration_secs: f64,
    pub curve: FadeCurve,
    pub started_at: DateTime<Utc>,
}

/// Handle to a started fade
#[derive(Debug)]
pub struct FadeHandle {
    fade_id: Uuid,
    player: PlayerRef,
    superseded: Option<Uuid>,
    cancel: CancellationToken,
    task: JoinHandle<Result<FadeOutcome>>,
}

impl FadeHandle {
    pub fn fade_id(&self) -> Uuid {
        self.fade_id
    }

    pub fn player(&self) -> &PlayerRef {
        &self.player
    }

    /// Fade this one replaced, if the player had one
    pub fn superseded(&self) -> Option<Uuid> {
        self.superseded
    }

    /// Cancel this fade; it stops without the finalize write
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the fade to finish
    pub async fn wait(self) -> Result<FadeOutcome> {
        self.task
            .await
            .map_err(|e| Error::Internal(format!("Fade task failed: {}", e)))?
    }
}

/// Releases ownership and signals exit when the fade task ends, however it ends
struct ExitGuard {
    active: ActiveMap,
    player: PlayerRef,
    fade_id: Uuid,
    exit_tx: watch::Sender<bool>,
}

impl Drop for ExitGuard {
    fn drop(&mut self) {
        {
            let mut active = lock(&self.active);
            if active.get(&self.player).map(|a| a.fade_id) == Some(self.fade_id) {
                active.remove(&self.player);
            }
        }
        self.exit_tx.send_replace(true);
    }
}

fn lock(active: &ActiveMap) -> MutexGuard<'_, HashMap<PlayerRef, ActiveFade>> {
    active.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Single-owner-per-player fade scheduler
#[derive(Debug, Clone)]
pub struct FadeRegistry {
    directory: Arc<PlayerDirectory>,
    event_bus: EventBus,
    active: ActiveMap,
}

impl FadeRegistry {
    pub fn new(directory: PlayerDirectory, event_bus: EventBus) -> Self {
        Self {
            directory: Arc::new(directory),
            event_bus,
            active: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn directory(&self) -> &PlayerDirectory {
        &self.directory
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Start a fade, superseding any fade already running on the player
    ///
    /// Validation and player lookup happen here, so `InvalidInput` is
    /// returned before anything is cancelled or written. Outside a Tokio
    /// runtime this fails with `Internal`, also before any side effect.
    pub fn start(&self, player: PlayerRef, request: FadeRequest) -> Result<FadeHandle> {
        request.validate()?;
        let device = self.directory.get(&player)?;
        let runtime = Handle::try_current()
            .map_err(|e| Error::Internal(format!("No runtime to run fade on: {}", e)))?;

        let fade_id = Uuid::new_v4();
        let cancel = CancellationToken::new();
        let (exit_tx, exited) = watch::channel(false);

        let previous = lock(&self.active).insert(
            player.clone(),
            ActiveFade {
                fade_id,
                request,
                started_at: Utc::now(),
                cancel: cancel.clone(),
                exited,
            },
        );

        if let Some(prev) = &previous {
            info!(
                player = %player,
                superseded = %prev.fade_id,
                fade_id = %fade_id,
                "Superseding active fade"
            );
            prev.cancel.cancel();
        }

        let guard = ExitGuard {
            active: Arc::clone(&self.active),
            player: player.clone(),
            fade_id,
            exit_tx,
        };

        let registry = self.clone();
        let task_player = player.clone();
        let task_cancel = cancel.clone();
        let superseded = previous.as_ref().map(|prev| prev.fade_id);
        let task = runtime.spawn(async move {
            let _guard = guard;
            if let Some(prev) = previous {
                wait_for_exit(prev.exited).await;
            }
            registry
                .drive(fade_id, &task_player, device.as_ref(), request, &task_cancel)
                .await
        });

        Ok(FadeHandle {
            fade_id,
            player,
            superseded,
            cancel,
            task,
        })
    }

    /// Start a fade and wait for it to finish
    pub async fn fade(&self, player: PlayerRef, request: FadeRequest) -> Result<FadeOutcome> {
        self.start(player, request)?.wait().await
    }

    /// Cancel the fade that owns `player`
    ///
    /// Returns false if the player had no active fade.
    pub fn cancel(&self, player: &PlayerRef) -> bool {
        match lock(&self.active).get(player) {
            Some(active) => {
                info!(player = %player, fade_id = %active.fade_id, "Cancelling fade");
                active.cancel.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancel every active fade
    pub fn cancel_all(&self) -> usize {
        let active = lock(&self.active);
        for fade in active.values() {
            fade.cancel.cancel();
        }
        active.len()
    }

    /// Active fade on a player, if any
    pub fn active_on(&self, player: &PlayerRef) -> Option<ActiveFadeInfo> {
        lock(&self.active)
            .get(player)
            .map(|active| info_for(player, active))
    }

    /// All active fades, sorted by player
    pub fn active(&self) -> Vec<ActiveFadeInfo> {
        let mut fades: Vec<ActiveFadeInfo> = lock(&self.active)
            .iter()
            .map(|(player, active)| info_for(player, active))
            .collect();
        fades.sort_by(|a, b| a.player.cmp(&b.player));
        fades
    }

    /// Plan and execute one fade, reporting its lifecycle
    async fn drive(
        &self,
        fade_id: Uuid,
        player: &PlayerRef,
        device: &dyn VolumeDevice,
        request: FadeRequest,
        cancel: &CancellationToken,
    ) -> Result<FadeOutcome> {
        let result = match plan_fade(player, device, &request).await {
            Ok(plan) => {
                self.event_bus.emit_lossy(FadeEvent::FadeStarted {
                    fade_id,
                    player: player.to_string(),
                    start_volume: plan.start_volume,
                    target_volume: plan.target_volume,
                    total_steps: plan.total_steps,
                    curve: plan.curve,
                    timestamp: Utc::now(),
                });
                execute_plan(player, device, plan, cancel).await
            }
            Err(e) => Err(e),
        };

        let event = match &result {
            Ok(FadeOutcome::Completed {
                stop,
                plan,
                setpoints_written,
            }) => FadeEvent::FadeCompleted {
                fade_id,
                player: player.to_string(),
                target_volume: plan.target_volume,
                reason: *stop,
                setpoints_written: *setpoints_written,
                timestamp: Utc::now(),
            },
            Ok(FadeOutcome::Cancelled {
                setpoints_written, ..
            }) => FadeEvent::FadeCancelled {
                fade_id,
                player: player.to_string(),
                setpoints_written: *setpoints_written,
                timestamp: Utc::now(),
            },
            Err(e) => {
                warn!(player = %player, fade_id = %fade_id, error = %e, "Fade failed");
                FadeEvent::FadeFailed {
                    fade_id,
                    player: player.to_string(),
                    error: e.to_string(),
                    timestamp: Utc::now(),
                }
            }
        };
        self.event_bus.emit_lossy(event);

        result
    }
}

fn info_for(player: &PlayerRef, active: &ActiveFade) -> ActiveFadeInfo {
    ActiveFadeInfo {
        fade_id: active.fade_id,
        player: player.clone(),
        target_volume: active.request.target_volume,
        duration_secs: active.request.duration_secs,
        curve: active.request.curve,
        started_at: active.started_at,
    }
}

/// Wait until a superseded fade has stopped issuing writes
async fn wait_for_exit(mut exited: watch::Receiver<bool>) {
    // A dropped sender also means the task is gone
    let _ = exited.wait_for(|done| *done).await;
}
