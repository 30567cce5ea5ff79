//! Health check endpoint.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    database: bool,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/health", get(health))
}

/// GET /api/health - liveness plus a database ping
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = state.db.health_check().await;
    Json(HealthResponse {
        status: if database { "ok" } else { "degraded" },
        database,
    })
}
