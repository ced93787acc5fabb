//! Fade event types and the event bus
//!
//! Every fade started through the registry reports its lifecycle on the
//! [`EventBus`]; the HTTP layer forwards these to SSE clients.

use crate::FadeCurve;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Why a completed fade left its loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Device reading came within tolerance of the target before the last step
    ConvergedEarly,
    /// All planned steps were issued
    StepsExhausted,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            StopReason::ConvergedEarly => "converged_early",
            StopReason::StepsExhausted => "steps_exhausted",
        }
    }
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fade lifecycle events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FadeEvent {
    /// Fade planned and about to issue its first setpoint
    FadeStarted {
        fade_id: Uuid,
        player: String,
        start_volume: f32,
        target_volume: f32,
        total_steps: u32,
        curve: FadeCurve,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Fade finished and the exact target was written
    FadeCompleted {
        fade_id: Uuid,
        player: String,
        target_volume: f32,
        reason: StopReason,
        setpoints_written: u32,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Fade was superseded or cancelled by request (no finalize write)
    FadeCancelled {
        fade_id: Uuid,
        player: String,
        setpoints_written: u32,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Fade stopped on a device error
    FadeFailed {
        fade_id: Uuid,
        player: String,
        error: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl FadeEvent {
    /// Event type name (matches the serde `type` tag)
    pub fn event_type(&self) -> &'static str {
        match self {
            FadeEvent::FadeStarted { .. } => "FadeStarted",
            FadeEvent::FadeCompleted { .. } => "FadeCompleted",
            FadeEvent::FadeCancelled { .. } => "FadeCancelled",
            FadeEvent::FadeFailed { .. } => "FadeFailed",
        }
    }

    pub fn fade_id(&self) -> Uuid {
        match self {
            FadeEvent::FadeStarted { fade_id, .. }
            | FadeEvent::FadeCompleted { fade_id, .. }
            | FadeEvent::FadeCancelled { fade_id, .. }
            | FadeEvent::FadeFailed { fade_id, .. } => *fade_id,
        }
    }

    pub fn player(&self) -> &str {
        match self {
            FadeEvent::FadeStarted { player, .. }
            | FadeEvent::FadeCompleted { player, .. }
            | FadeEvent::FadeCancelled { player, .. }
            | FadeEvent::FadeFailed { player, .. } => player,
        }
    }
}

/// Broadcast bus for fade events
///
/// Cloning is cheap; all clones share the same channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<FadeEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of events to buffer before lagging receivers drop old events
    ///
    /// # Examples
    ///
    /// ```
    /// use volfade_common::events::EventBus;
    ///
    /// let event_bus = EventBus::new(100);
    /// assert_eq!(event_bus.capacity(), 100);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<FadeEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: FadeEvent,
    ) -> Result<usize, broadcast::error::SendError<FadeEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: FadeEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(100)
    }
}
