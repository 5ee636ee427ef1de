//! Public types for the push API
use serde::{Deserialize, Serialize};

pub use crate::notify::{NotificationRequest, PushSubscription};

#[derive(Deserialize)]
pub struct UnsubscribeRequest {
    pub endpoint: String,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyResponse {
    pub public_key: String,
}

#[derive(Serialize, Deserialize)]
pub struct StatusResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Serialize, Deserialize)]
pub struct SendNotificationResponse {
    pub success: bool,
    pub message: String,
    pub attempted: usize,
    pub delivered: usize,
    pub failed: usize,
    pub pruned: usize,
}

#[derive(Serialize, Deserialize)]
pub struct CountResponse {
    pub count: usize,
}
