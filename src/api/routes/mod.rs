//! API routes module

pub mod health;
pub mod push;

use std::sync::{Arc, RwLock};

use crate::api::state::AppState;
use axum::Router;

type SharedState = Arc<RwLock<AppState>>;

/// Create the combined API router, mounted under `/api`
pub fn router() -> Router<SharedState> {
    // Push subscription and notification routes live at the top of
    // `/api` to match the paths the web client already calls.
    Router::new().merge(push::router())
}
