//! Volume fade engine
//!
//! - [`plan`]: validated requests, step counts, per-step setpoints
//! - [`controller`]: the tick loop that drives one player
//! - [`registry`]: one active fade per player, with supersede semantics

pub mod controller;
pub mod plan;
pub mod registry;

pub use controller::{execute_plan, plan_fade, run_fade, FadeOutcome};
pub use plan::{
    total_steps_for, FadePlan, FadeRequest, FadeStep, CONVERGENCE_TOLERANCE, TICK_INTERVAL,
    TICK_RATE_HZ,
};
pub use registry::{ActiveFadeInfo, FadeHandle, FadeRegistry};
pub use volfade_common::events::StopReason;
