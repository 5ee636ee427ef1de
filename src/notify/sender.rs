use std::time::Duration;

use async_trait::async_trait;
use web_push::{
    ContentEncoding, HyperWebPushClient, SubscriptionInfo, VapidSignatureBuilder, WebPushClient,
    WebPushError, WebPushMessageBuilder,
};

use super::models::PushSubscription;
use super::vapid::VapidKeys;

/// How long a push service should hold an undelivered message.
const MESSAGE_TTL: Duration = Duration::from_secs(60 * 60 * 24);

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum DeliveryError {
    /// The push service answered 410 Gone. The subscription will never
    /// accept messages again and should be dropped.
    #[error("subscription is gone")]
    Gone,
    #[error("push service rejected the message: {0}")]
    Rejected(String),
    #[error("push transport failed: {0}")]
    Transport(String),
}

/// Delivers one encrypted message to one subscription.
#[async_trait]
pub trait PushSender: Send + Sync {
    async fn send(&self, subscription: &PushSubscription, payload: &[u8])
    -> Result<(), DeliveryError>;
}

/// Sends messages with VAPID authentication over the web push protocol.
pub struct WebPushSender {
    keys: VapidKeys,
    client: HyperWebPushClient,
}

impl WebPushSender {
    pub fn new(keys: VapidKeys) -> Self {
        Self {
            keys,
            client: HyperWebPushClient::new(),
        }
    }
}

#[async_trait]
impl PushSender for WebPushSender {
    async fn send(
        &self,
        subscription: &PushSubscription,
        payload: &[u8],
    ) -> Result<(), DeliveryError> {
        let subscription_info = SubscriptionInfo::new(
            subscription.endpoint.clone(),
            subscription.keys.p256dh.clone(),
            subscription.keys.auth.clone(),
        );

        let mut sig_builder = VapidSignatureBuilder::from_base64(
            &self.keys.private_key,
            web_push::URL_SAFE_NO_PAD,
            &subscription_info,
        )
        .map_err(classify)?;
        sig_builder.add_claim("sub", self.keys.subject.clone());
        let signature = sig_builder.build().map_err(classify)?;

        let mut builder = WebPushMessageBuilder::new(&subscription_info);
        builder.set_payload(ContentEncoding::Aes128Gcm, payload);
        builder.set_vapid_signature(signature);
        builder.set_ttl(MESSAGE_TTL.as_secs() as u32);
        let message = builder.build().map_err(classify)?;

        self.client.send(message).await.map_err(classify)
    }
}

fn classify(error: WebPushError) -> DeliveryError {
    match error {
        WebPushError::EndpointNotValid { .. } => DeliveryError::Gone,
        WebPushError::Unauthorized { .. }
        | WebPushError::BadRequest { .. }
        | WebPushError::EndpointNotFound { .. }
        | WebPushError::PayloadTooLarge { .. } => DeliveryError::Rejected(error.to_string()),
        other => DeliveryError::Transport(other.to_string()),
    }
}
