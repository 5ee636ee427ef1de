//! Test utilities for integration tests
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use axum::{Router, body::Body};
use tempfile::TempDir;

use beacon::api::AppState;
use beacon::api::app;
use beacon::core::AppConfig;
use beacon::notify::{DeliveryError, PushSender, PushService, PushSubscription};
use beacon::store::{JsonFileStore, SubscriptionStore};

// 0x04 followed by 64 bytes of 0x01, a well formed uncompressed point
pub const TEST_PUBLIC_KEY: &str =
    "BAEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQE";

/// Push sender that records every delivery instead of talking to a
/// push service. Endpoints listed in `responses` fail with the given
/// error.
#[derive(Default)]
pub struct RecordingSender {
    pub responses: HashMap<String, DeliveryError>,
    pub sent: Mutex<Vec<(String, Vec<u8>)>>,
}

#[async_trait]
impl PushSender for RecordingSender {
    async fn send(
        &self,
        subscription: &PushSubscription,
        payload: &[u8],
    ) -> Result<(), DeliveryError> {
        self.sent
            .lock()
            .unwrap()
            .push((subscription.endpoint.clone(), payload.to_vec()));
        match self.responses.get(&subscription.endpoint) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<JsonFileStore>,
    pub sender: Arc<RecordingSender>,
    // Held so the directory outlives the test
    pub dir: TempDir,
}

/// Creates a test application backed by a JSON store in a fresh
/// temporary directory.
pub async fn test_app_with_sender(sender: RecordingSender) -> TestApp {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let static_dir = dir.path().join("public");
    std::fs::create_dir_all(&static_dir).expect("Failed to create static dir");
    std::fs::write(static_dir.join("admin.html"), "<h1>Push admin</h1>")
        .expect("Failed to write admin page");

    let subscriptions_path = dir.path().join("subscriptions.json");
    let store = Arc::new(
        JsonFileStore::open(&subscriptions_path)
            .await
            .expect("Failed to open store"),
    );
    let sender = Arc::new(sender);

    let config = AppConfig {
        subscriptions_path: subscriptions_path.display().to_string(),
        static_dir: static_dir.display().to_string(),
        ..Default::default()
    };
    let service = PushService::new(
        store.clone() as Arc<dyn SubscriptionStore>,
        sender.clone(),
        TEST_PUBLIC_KEY,
        config.payload_defaults(),
    );
    let app_state = AppState::new(service, config);

    TestApp {
        router: app(Arc::new(RwLock::new(app_state))),
        store,
        sender,
        dir,
    }
}

pub async fn test_app() -> TestApp {
    test_app_with_sender(RecordingSender::default()).await
}

pub async fn body_to_string(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Failed to read body");
    String::from_utf8(bytes.to_vec()).expect("Body is not utf8")
}

pub async fn body_to_json(body: Body) -> serde_json::Value {
    serde_json::from_str(&body_to_string(body).await).expect("Body is not json")
}

pub fn json_request(uri: &str, body: serde_json::Value) -> axum::http::Request<Body> {
    axum::http::Request::builder()
        .uri(uri)
        .method("POST")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn subscription_json(endpoint: &str) -> serde_json::Value {
    serde_json::json!({
        "endpoint": endpoint,
        "expirationTime": null,
        "keys": {
            "p256dh": "test-p256dh-key",
            "auth": "test-auth-key"
        }
    })
}
