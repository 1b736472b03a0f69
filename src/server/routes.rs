//! Route tables and handlers.
//!
//! Handlers are thin: read the body leniently, call the service, shape the
//! status code. All behaviour lives in `CarbonTwinService`.

use super::error::ApiError;
use super::AppState;
use crate::service::SimulationOutcome;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tracing::debug;

/// Parse a request body as JSON. Absent or unparsable bodies become `{}`.
pub fn lenient_json(body: &[u8]) -> Value {
    if body.is_empty() {
        return json!({});
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Null) => json!({}),
        Ok(value) => value,
        Err(e) => {
            debug!(error = %e, "request body is not JSON, treating as empty");
            json!({})
        }
    }
}

// ============================================================================
// Service Routes
// ============================================================================

pub fn service_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/config", get(api_config))
}

async fn index(State(state): State<AppState>) -> Json<Value> {
    Json(state.descriptor())
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(state.health().await)
}

async fn api_config(State(state): State<AppState>) -> Json<Value> {
    Json(state.config_view())
}

// ============================================================================
// Verification, Twin and Reporting Routes
// ============================================================================

pub fn twin_routes() -> Router<AppState> {
    Router::new()
        .route("/api/verify-emission", post(verify_emission))
        .route("/api/create-twin", post(create_twin))
        .route("/api/simulate/:twin_id", post(simulate))
        .route("/api/dashboard/:twin_id", get(dashboard))
        .route("/api/reports/summary", get(summary))
}

async fn verify_emission(State(state): State<AppState>, body: Bytes) -> Json<Value> {
    Json(state.verify_emission(lenient_json(&body)).await)
}

async fn create_twin(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.create_twin(lenient_json(&body)).await?))
}

async fn simulate(
    State(state): State<AppState>,
    Path(twin_id): Path<String>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    // An unknown twin is reported in-band with a success status.
    match state.simulate(&twin_id, &lenient_json(&body)).await? {
        SimulationOutcome::Completed(doc) => Ok(Json(doc)),
        SimulationOutcome::TwinNotFound => Ok(Json(json!({"error": "Digital twin not found"}))),
    }
}

async fn dashboard(
    State(state): State<AppState>,
    Path(twin_id): Path<String>,
) -> Result<Response, ApiError> {
    match state.dashboard(&twin_id).await? {
        Some(doc) => Ok(Json(doc).into_response()),
        None => Ok((StatusCode::NOT_FOUND, Json(json!({"error": "Twin not found"}))).into_response()),
    }
}

async fn summary(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.summary().await?))
}

// ============================================================================
// Marketplace Routes
// ============================================================================

pub fn marketplace_routes() -> Router<AppState> {
    Router::new()
        .route("/api/marketplace/credits", get(credits))
        .route("/api/marketplace/stats", get(stats))
        .route("/api/marketplace/purchase", post(purchase))
        .route("/api/marketplace/verify-project", post(verify_project))
        .route("/api/marketplace/my-credits/:address", get(my_credits))
}

async fn credits(State(state): State<AppState>) -> Json<Value> {
    Json(state.credit_listings())
}

async fn stats(State(state): State<AppState>) -> Json<Value> {
    Json(state.market_stats())
}

async fn purchase(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.purchase(&lenient_json(&body)).await?))
}

async fn verify_project(State(state): State<AppState>, body: Bytes) -> Json<Value> {
    Json(state.verify_project(lenient_json(&body)).await)
}

async fn my_credits(State(state): State<AppState>, Path(address): Path<String>) -> Json<Value> {
    Json(state.holdings(&address))
}
