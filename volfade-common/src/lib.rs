//! # volfade Common Library
//!
//! Shared code for the volfade service including:
//! - Fade curve definitions and calculations
//! - Fade event types and the event bus
//! - Fade parameter ranges
//! - Bootstrap configuration loading

pub mod config;
pub mod error;
pub mod events;
pub mod fade_curves;
pub mod params;

pub use error::{Error, Result};
pub use fade_curves::FadeCurve;
