//! REST handlers for players, matches and the ranking

use crate::error::RankerError;
use crate::http::error::ApiError;
use crate::service::health::{HealthCheck, HealthStatus};
use crate::service::AppState;
use crate::types::{MatchOutcome, MatchRecord, Player};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error};

/// Body of `POST /api/player`
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreatePlayerRequest {
    /// Desired unique player id
    #[serde(default)]
    pub id: Option<String>,
}

/// Body of `POST /api/match`
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateMatchRequest {
    /// Winner id, or first player of a draw
    #[serde(default)]
    pub winner: Option<String>,
    /// Loser id, or second player of a draw
    #[serde(default)]
    pub loser: Option<String>,
    #[serde(default)]
    pub draw: Option<bool>,
}

/// Response of `GET /api/match`
#[derive(Debug, Serialize, Deserialize)]
pub struct MatchHistoryResponse {
    pub count: usize,
    pub matches: Vec<MatchRecord>,
}

/// Missing and empty fields are rejected here; id semantics belong to the store
fn required_field(value: Option<String>, field: &str) -> Result<String, ApiError> {
    match value {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(RankerError::InvalidInput {
            reason: format!("'{}' must be a non-empty string", field),
        }
        .into()),
    }
}

/// Root endpoint handler - shows service information
pub async fn root_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "service": state.config().service.name,
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "POST /api/player": "Register a new player",
            "GET /api/player/{id}": "Get a single player",
            "POST /api/match": "Report a match result",
            "GET /api/match": "Match history",
            "GET /api/ranking": "Current ranking, highest rating first",
            "GET /api/ranking/events": "Server-sent stream of ranking updates",
            "GET /health": "Service health",
            "GET /metrics": "Prometheus metrics"
        }
    }))
}

pub async fn create_player(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreatePlayerRequest>, JsonRejection>,
) -> Result<Json<Player>, ApiError> {
    let Json(request) = payload?;
    let id = required_field(request.id, "id")?;

    let player = state.store().create_player(&id)?;
    Ok(Json(player))
}

pub async fn get_player(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Player>, ApiError> {
    state
        .store()
        .get_player(&id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Player '{}' does not exist", id)))
}

pub async fn get_ranking(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Player>>, ApiError> {
    let players = state.store().list_players()?;
    if players.is_empty() {
        return Err(ApiError::NotFound(
            "The ranking is not available because no player exists yet".to_string(),
        ));
    }

    state.store().broadcaster().update_cache(&players)?;
    Ok(Json(players))
}

pub async fn create_match(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateMatchRequest>, JsonRejection>,
) -> Result<Json<MatchOutcome>, ApiError> {
    let Json(request) = payload?;
    let winner = required_field(request.winner, "winner")?;
    let loser = required_field(request.loser, "loser")?;

    let outcome =
        state
            .store()
            .process_match(&winner, &loser, request.draw.unwrap_or(false))?;
    Ok(Json(outcome))
}

pub async fn match_history(
    State(state): State<Arc<AppState>>,
) -> Result<Json<MatchHistoryResponse>, ApiError> {
    let matches = state.store().match_history()?;
    Ok(Json(MatchHistoryResponse {
        count: matches.len(),
        matches,
    }))
}

/// Health endpoint handler
pub async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    debug!("Health check requested");

    match HealthCheck::check(&state).await {
        Ok(health) => {
            let status = match health.status {
                HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
                HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
            };
            (status, Json(health)).into_response()
        }
        Err(e) => {
            error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unhealthy",
                    "service": state.config().service.name,
                    "version": env!("CARGO_PKG_VERSION")
                })),
            )
                .into_response()
        }
    }
}

/// Prometheus metrics endpoint handler
pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    debug!("Metrics endpoint requested");

    let store = state.store();
    state.metrics().update_gauges(
        store.player_count().unwrap_or(0),
        store.broadcaster().subscriber_count(),
    );

    let metric_families = state.metrics().registry().gather();
    let encoder = TextEncoder::new();

    match encoder.encode_to_string(&metric_families) {
        Ok(metrics_output) => {
            debug!("Serving {} metric families", metric_families.len());
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, encoder.format_type().to_string())],
                metrics_output,
            )
        }
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "text/plain".to_string())],
                "Failed to encode metrics".to_string(),
            )
        }
    }
}
