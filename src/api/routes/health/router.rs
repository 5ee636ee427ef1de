//! Router for the health check

use std::sync::{Arc, RwLock};

use axum::{Json, Router};
use chrono::{SecondsFormat, Utc};

use super::public::HealthResponse;
use crate::api::state::AppState;

type SharedState = Arc<RwLock<AppState>>;

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

/// Create the health router
pub fn router() -> Router<SharedState> {
    Router::new().route("/health", axum::routing::get(health))
}
