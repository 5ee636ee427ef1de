//! Browser side of the push pipeline.
//!
//! Browser globals (`Notification`, `navigator.serviceWorker`,
//! `PushManager`) are modelled as capability traits so the subscription
//! flow can be driven by a real host binding or by test doubles.

pub mod http;
pub mod manager;

pub use http::HttpSubscriptionApi;
pub use manager::{
    ClientState, ManagerConfig, SubscribeOutcome, SubscriptionManager, UnsubscribeOutcome,
};

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use crate::notify::PushSubscription;

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ClientError {
    #[error("Notification permission denied")]
    PermissionDenied,
    #[error("invalid application server key: {0}")]
    InvalidKey(String),
    #[error("service worker registration failed: {0}")]
    Registration(String),
    #[error("push manager error: {0}")]
    PushManager(String),
    #[error("request failed: {0}")]
    Transport(String),
    #[error("server responded with {status}: {message}")]
    Server { status: u16, message: String },
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Default,
    Granted,
    Denied,
}

/// Which browser APIs the host exposes. All three are needed for push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub notifications: bool,
    pub service_worker: bool,
    pub push_manager: bool,
}

impl Capabilities {
    pub fn all() -> Self {
        Self {
            notifications: true,
            service_worker: true,
            push_manager: true,
        }
    }

    pub fn supports_push(&self) -> bool {
        self.notifications && self.service_worker && self.push_manager
    }
}

#[async_trait]
pub trait NotificationPermission: Send + Sync {
    fn current(&self) -> Permission;

    /// Prompt the user. Resolves once they answer.
    async fn request(&self) -> Permission;
}

#[async_trait]
pub trait PushRegistration: Send + Sync {
    async fn get_subscription(&self) -> Result<Option<PushSubscription>, ClientError>;

    async fn subscribe(
        &self,
        application_server_key: &[u8],
    ) -> Result<PushSubscription, ClientError>;

    /// Cancel the current subscription. Returns `false` if there was
    /// none.
    async fn unsubscribe(&self) -> Result<bool, ClientError>;
}

#[async_trait]
pub trait ServiceWorkerContainer: Send + Sync {
    type Registration: PushRegistration;

    /// Resolves once a worker for this origin is active. May never
    /// resolve if no worker has been registered.
    async fn ready(&self) -> Result<Self::Registration, ClientError>;

    async fn register(&self, script_url: &str) -> Result<Self::Registration, ClientError>;

    /// Ask the controlling worker, if any, to stop waiting and
    /// activate.
    fn post_skip_waiting(&self);
}

/// Calls the push server makes available to the client.
#[async_trait]
pub trait SubscriptionApi: Send + Sync {
    async fn public_key(&self) -> Result<String, ClientError>;

    async fn subscribe(&self, subscription: &PushSubscription) -> Result<(), ClientError>;

    async fn unsubscribe(&self, endpoint: &str) -> Result<(), ClientError>;
}

/// Decode a VAPID public key as served by the push server into the raw
/// bytes `PushManager.subscribe` expects. Accepts padded and unpadded
/// input in either base64 alphabet.
pub fn decode_application_server_key(key: &str) -> Result<Vec<u8>, ClientError> {
    let normalized: String = key
        .trim()
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            c => c,
        })
        .collect();

    let bytes = URL_SAFE_NO_PAD
        .decode(normalized.as_bytes())
        .map_err(|e| ClientError::InvalidKey(e.to_string()))?;

    // Uncompressed P-256 point
    if bytes.len() != 65 || bytes[0] != 0x04 {
        return Err(ClientError::InvalidKey(format!(
            "expected 65 byte uncompressed point, got {} bytes",
            bytes.len()
        )));
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_key() -> Vec<u8> {
        let mut key = vec![0x04];
        key.extend((0..64).map(|i| i as u8));
        key
    }

    #[test]
    fn it_decodes_unpadded_url_safe_key() {
        let encoded = URL_SAFE_NO_PAD.encode(sample_key());
        assert_eq!(decode_application_server_key(&encoded).unwrap(), sample_key());
    }

    #[test]
    fn it_decodes_standard_padded_key() {
        let encoded = base64::engine::general_purpose::STANDARD.encode(sample_key());
        assert_eq!(decode_application_server_key(&encoded).unwrap(), sample_key());
    }

    #[test]
    fn it_rejects_wrong_length_key() {
        let encoded = URL_SAFE_NO_PAD.encode([0x04, 1, 2, 3]);
        assert!(matches!(
            decode_application_server_key(&encoded),
            Err(ClientError::InvalidKey(_))
        ));
    }

    #[test]
    fn it_rejects_non_base64_key() {
        assert!(decode_application_server_key("not base64!").is_err());
    }
}
