//! HTTP request handlers

use crate::api::AppState;
use crate::device::PlayerRef;
use crate::error::Result;
use crate::fade::{ActiveFadeInfo, FadeRequest};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use volfade_common::config::FadeDefaults;
use volfade_common::FadeCurve;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
    port: u16,
    players: usize,
    active_fades: usize,
}

#[derive(Debug, Serialize)]
pub struct PlayerInfo {
    player: PlayerRef,
    active_fade: Option<ActiveFadeInfo>,
}

#[derive(Debug, Serialize)]
pub struct PlayerListResponse {
    players: Vec<PlayerInfo>,
}

#[derive(Debug, Serialize)]
pub struct VolumeResponse {
    player: PlayerRef,
    /// 0.0-1.0, null if the player reports no volume
    volume: Option<f32>,
}

/// POST /players/:player/fade body; omitted fields use configured defaults
#[derive(Debug, Default, Deserialize)]
pub struct FadeBody {
    volume: Option<f32>,
    /// Seconds
    duration: Option<f64>,
    curve: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FadeStartedResponse {
    fade_id: Uuid,
    player: PlayerRef,
    target_volume: f32,
    duration_secs: f64,
    curve: FadeCurve,
    /// Fade that this one replaced, if any
    superseded: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct CancelResponse {
    player: PlayerRef,
    cancelled: bool,
}

#[derive(Debug, Serialize)]
pub struct FadeListResponse {
    fades: Vec<ActiveFadeInfo>,
}

impl FadeBody {
    /// Fill omitted fields from defaults and parse the curve name
    pub fn into_request(self, defaults: &FadeDefaults) -> Result<FadeRequest> {
        FadeRequest::from_parts(self.volume, self.duration, self.curve.as_deref(), defaults)
    }
}

// ============================================================================
// Health Endpoint
// ============================================================================

/// GET /health - Health check endpoint
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "volfade".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        port: state.port,
        players: state.registry.directory().len(),
        active_fades: state.registry.active().len(),
    })
}

// ============================================================================
// Player Endpoints
// ============================================================================

/// GET /players - Configured players and their active fades
pub async fn list_players(State(state): State<AppState>) -> Json<PlayerListResponse> {
    let players = state
        .registry
        .directory()
        .players()
        .into_iter()
        .map(|player| PlayerInfo {
            active_fade: state.registry.active_on(&player),
            player,
        })
        .collect();

    Json(PlayerListResponse { players })
}

/// GET /players/:player/volume - Live volume reading
pub async fn get_volume(
    State(state): State<AppState>,
    Path(player): Path<String>,
) -> Result<Json<VolumeResponse>> {
    let player = PlayerRef::from(player);
    let device = state.registry.directory().get(&player)?;
    let volume = device.read_volume().await?;

    Ok(Json(VolumeResponse { player, volume }))
}

// ============================================================================
// Fade Endpoints
// ============================================================================

/// POST /players/:player/fade - Start (or restart) a fade
pub async fn start_fade(
    State(state): State<AppState>,
    Path(player): Path<String>,
    Json(body): Json<FadeBody>,
) -> Result<(StatusCode, Json<FadeStartedResponse>)> {
    let player = PlayerRef::from(player);
    let request = body.into_request(&state.defaults)?;

    let handle = state.registry.start(player.clone(), request)?;
    info!(
        player = %player,
        fade_id = %handle.fade_id(),
        target_volume = request.target_volume,
        duration_secs = request.duration_secs,
        curve = %request.curve,
        "Fade requested"
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(FadeStartedResponse {
            fade_id: handle.fade_id(),
            player,
            target_volume: request.target_volume,
            duration_secs: request.duration_secs,
            curve: request.curve,
            superseded: handle.superseded(),
        }),
    ))
}

/// DELETE /players/:player/fade - Cancel the player's active fade
pub async fn cancel_fade(
    State(state): State<AppState>,
    Path(player): Path<String>,
) -> Result<Json<CancelResponse>> {
    let player = PlayerRef::from(player);
    state.registry.directory().get(&player)?;
    let cancelled = state.registry.cancel(&player);

    Ok(Json(CancelResponse { player, cancelled }))
}

/// GET /fades - All active fades
pub async fn list_fades(State(state): State<AppState>) -> Json<FadeListResponse> {
    Json(FadeListResponse {
        fades: state.registry.active(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_body_defaults_fill_missing_fields() {
        let request = FadeBody::default()
            .into_request(&FadeDefaults::default())
            .unwrap();
        assert_eq!(request, FadeRequest::new(0.5, 5.0, FadeCurve::Logarithmic));
    }

    #[test]
    fn test_body_curve_alias() {
        let body = FadeBody {
            curve: Some("smoothstep".to_string()),
            ..FadeBody::default()
        };
        let request = body.into_request(&FadeDefaults::default()).unwrap();
        assert_eq!(request.curve, FadeCurve::Logarithmic);
    }

    #[test]
    fn test_body_unknown_curve() {
        let body = FadeBody {
            curve: Some("cubic".to_string()),
            ..FadeBody::default()
        };
        assert!(matches!(
            body.into_request(&FadeDefaults::default()),
            Err(Error::InvalidInput(_))
        ));
    }
}
