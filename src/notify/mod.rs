pub mod models;
pub mod sender;
pub mod vapid;
pub use models::*;
pub use sender::*;
pub use vapid::*;

use std::sync::Arc;

use crate::store::{StoreError, SubscriptionStore};

#[derive(Debug, thiserror::Error)]
pub enum PushError {
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Storage(#[from] StoreError),
    #[error("failed to encode notification payload: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Server side of the push pipeline: owns the subscription store and
/// fans notifications out to every subscriber.
#[derive(Clone)]
pub struct PushService {
    store: Arc<dyn SubscriptionStore>,
    sender: Arc<dyn PushSender>,
    public_key: String,
    defaults: PayloadDefaults,
}

impl PushService {
    pub fn new(
        store: Arc<dyn SubscriptionStore>,
        sender: Arc<dyn PushSender>,
        public_key: &str,
        defaults: PayloadDefaults,
    ) -> Self {
        Self {
            store,
            sender,
            public_key: public_key.to_string(),
            defaults,
        }
    }

    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    pub async fn subscriber_count(&self) -> Result<usize, PushError> {
        Ok(self.store.count().await?)
    }

    pub async fn subscribe(&self, subscription: PushSubscription) -> Result<(), PushError> {
        if subscription.endpoint.trim().is_empty() {
            return Err(PushError::Validation("Endpoint is required".to_string()));
        }
        let endpoint = subscription.endpoint.clone();
        self.store.add(subscription).await?;
        tracing::info!("Subscription saved: {}", endpoint);
        Ok(())
    }

    pub async fn unsubscribe(&self, endpoint: &str) -> Result<bool, PushError> {
        if endpoint.trim().is_empty() {
            return Err(PushError::Validation("Endpoint is required".to_string()));
        }
        let removed = self.store.remove(endpoint).await?;
        tracing::info!("Subscription removed: {} (existed: {})", endpoint, removed);
        Ok(removed)
    }

    /// Send a notification to every stored subscription.
    ///
    /// Deliveries run concurrently and independently. A 410 response
    /// prunes that subscription from the store; any other failure is
    /// logged and counted. The fan-out always runs to completion.
    pub async fn send_notification(
        &self,
        request: NotificationRequest,
    ) -> Result<DeliveryReport, PushError> {
        let title = request.title.trim();
        let body = request.body.trim();
        if title.is_empty() || body.is_empty() {
            return Err(PushError::Validation(
                "Title and body are required".to_string(),
            ));
        }

        let payload = PushNotificationPayload::new(
            title,
            body,
            request.url.as_deref(),
            request.icon.as_deref(),
            request.kind,
            &self.defaults,
        );
        let content: Arc<[u8]> = serde_json::to_vec(&payload)?.into();

        let subscriptions = self.store.list().await?;
        let mut report = DeliveryReport {
            attempted: subscriptions.len(),
            ..Default::default()
        };

        let mut tasks = tokio::task::JoinSet::new();
        for sub in subscriptions {
            let sender = Arc::clone(&self.sender);
            let store = Arc::clone(&self.store);
            let content = Arc::clone(&content);
            tasks.spawn(async move { deliver(sender, store, sub, content).await });
        }

        while let Some(res) = tasks.join_next().await {
            match res {
                Ok(Outcome::Delivered) => report.delivered += 1,
                Ok(Outcome::Failed) => report.failed += 1,
                Ok(Outcome::Pruned) => {
                    report.failed += 1;
                    report.pruned += 1;
                }
                Err(err) => {
                    tracing::error!("Delivery task failed: {}", err);
                    report.failed += 1;
                }
            }
        }

        tracing::info!(
            "Notification sent to {} subscribers ({} delivered, {} failed, {} pruned)",
            report.attempted,
            report.delivered,
            report.failed,
            report.pruned
        );
        Ok(report)
    }
}

enum Outcome {
    Delivered,
    Failed,
    Pruned,
}

async fn deliver(
    sender: Arc<dyn PushSender>,
    store: Arc<dyn SubscriptionStore>,
    sub: PushSubscription,
    content: Arc<[u8]>,
) -> Outcome {
    match sender.send(&sub, &content).await {
        Ok(()) => Outcome::Delivered,
        Err(DeliveryError::Gone) => {
            tracing::warn!("Subscription gone, removing: {}", sub.endpoint);
            // Removing an already removed endpoint is a no-op, so
            // overlapping sends can prune the same endpoint safely.
            if let Err(err) = store.remove(&sub.endpoint).await {
                tracing::error!("Failed to prune {}: {}", sub.endpoint, err);
            }
            Outcome::Pruned
        }
        Err(err) => {
            tracing::error!("Error sending notification to {}: {}", sub.endpoint, err);
            Outcome::Failed
        }
    }
}
