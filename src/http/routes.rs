//! HTTP route definitions

use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use uuid::Uuid;

use crate::app::AppState;
use crate::game::weapons::{self, Weapon, WeaponId};
use crate::game::MatchSummary;
use crate::util::time::uptime_secs;
use crate::ws::handler::ws_handler;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS]);

    Router::new()
        .route("/health", get(health_handler))
        .route("/weapons", get(weapons_handler))
        .route("/matches/:id", get(match_handler))
        .route("/ws", get(ws_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(Duration::from_secs(10)))
                .layer(CompressionLayer::new())
                .layer(cors),
        )
        .with_state(state)
}

// ============================================================================
// Health endpoint
// ============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    active_matches: usize,
    playing_matches: usize,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: uptime_secs(),
        active_matches: state.match_registry.active_matches(),
        playing_matches: state.match_registry.playing_matches(),
    })
}

// ============================================================================
// Weapon registry
// ============================================================================

#[derive(Serialize)]
struct WeaponsResponse {
    weapons: Vec<Weapon>,
}

async fn weapons_handler() -> Json<WeaponsResponse> {
    Json(WeaponsResponse {
        weapons: WeaponId::ALL.iter().map(|id| *weapons::lookup(*id)).collect(),
    })
}

// ============================================================================
// Match inspection
// ============================================================================

async fn match_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MatchSummary>, AppError> {
    let id: Uuid = id
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid match id: {}", id)))?;

    state
        .match_registry
        .get(&id)
        .map(|handle| Json(handle.summary()))
        .ok_or_else(|| AppError::NotFound(format!("Match {}", id)))
}

// ============================================================================
// Error handling
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, Json(body)).into_response()
    }
}
