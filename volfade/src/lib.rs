//! # volfade
//!
//! Fades a media player's volume from its current value to a target value
//! over a requested duration, shaped by an easing curve.
//!
//! **Architecture:** a fixed-rate (10 Hz) closed-loop controller reads the
//! player, writes one setpoint per tick and finishes with an exact write of
//! the target. A registry keeps at most one fade per player; a new request
//! supersedes the running one. An axum HTTP/SSE API exposes the registry.

pub mod api;
pub mod device;
pub mod error;
pub mod fade;

pub use error::{Error, Result};
