//! Router for the push API

use std::sync::{Arc, RwLock};

use axum::{Json, Router, extract::State};

use super::public;
use crate::api::public::ApiError;
use crate::api::state::AppState;
use crate::notify::PushService;

type SharedState = Arc<RwLock<AppState>>;

fn push_service(state: &SharedState) -> PushService {
    state
        .read()
        .expect("Unable to read shared state")
        .service
        .clone()
}

async fn vapid_public_key(State(state): State<SharedState>) -> Json<public::PublicKeyResponse> {
    let service = push_service(&state);
    tracing::debug!("VAPID public key requested");
    Json(public::PublicKeyResponse {
        public_key: service.public_key().to_string(),
    })
}

// Register a client for push notifications
async fn subscribe(
    State(state): State<SharedState>,
    Json(subscription): Json<public::PushSubscription>,
) -> Result<Json<public::StatusResponse>, ApiError> {
    push_service(&state).subscribe(subscription).await?;

    Ok(Json(public::StatusResponse {
        success: true,
        message: "Subscription saved successfully".to_string(),
    }))
}

async fn unsubscribe(
    State(state): State<SharedState>,
    Json(request): Json<public::UnsubscribeRequest>,
) -> Result<Json<public::StatusResponse>, ApiError> {
    push_service(&state).unsubscribe(&request.endpoint).await?;

    Ok(Json(public::StatusResponse {
        success: true,
        message: "Unsubscribed successfully".to_string(),
    }))
}

// Send a push notification to all subscriptions
async fn send_notification(
    State(state): State<SharedState>,
    Json(request): Json<public::NotificationRequest>,
) -> Result<Json<public::SendNotificationResponse>, ApiError> {
    let report = push_service(&state).send_notification(request).await?;

    Ok(Json(public::SendNotificationResponse {
        success: true,
        message: format!("Notification sent to {} subscribers", report.attempted),
        attempted: report.attempted,
        delivered: report.delivered,
        failed: report.failed,
        pruned: report.pruned,
    }))
}

async fn subscription_count(
    State(state): State<SharedState>,
) -> Result<Json<public::CountResponse>, ApiError> {
    let count = push_service(&state).subscriber_count().await?;
    Ok(Json(public::CountResponse { count }))
}

/// Create the push router
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/vapid-public-key", axum::routing::get(vapid_public_key))
        .route("/subscribe", axum::routing::post(subscribe))
        .route("/unsubscribe", axum::routing::post(unsubscribe))
        .route("/send-notification", axum::routing::post(send_notification))
        .route("/subscription-count", axum::routing::get(subscription_count))
}
