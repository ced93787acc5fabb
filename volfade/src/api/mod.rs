//! REST API for the fade service
//!
//! Routes:
//! - `GET /health`
//! - `GET /players`, `GET /players/:player/volume`
//! - `POST /players/:player/fade`, `DELETE /players/:player/fade`
//! - `GET /fades`
//! - `GET /events` (SSE)

pub mod handlers;
pub mod sse;

use crate::fade::FadeRegistry;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use volfade_common::config::FadeDefaults;

/// Application state shared across handlers
#[derive(Debug, Clone)]
pub struct AppState {
    /// Fade scheduler (also owns the player directory and event bus)
    pub registry: FadeRegistry,
    /// Values for fade request fields the caller omits
    pub defaults: FadeDefaults,
    /// Server port
    pub port: u16,
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/players", get(handlers::list_players))
        .route("/players/:player/volume", get(handlers::get_volume))
        .route(
            "/players/:player/fade",
            post(handlers::start_fade).delete(handlers::cancel_fade),
        )
        .route("/fades", get(handlers::list_fades))
        .route("/events", get(sse::event_stream))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
