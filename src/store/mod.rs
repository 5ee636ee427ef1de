//! Persistent collection of push subscriptions keyed by endpoint

mod file;
mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;

use crate::notify::PushSubscription;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("subscription store io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("subscription store is not valid json: {0}")]
    Serde(#[from] serde_json::Error),
}

/// At most one record is kept per endpoint. Implementations must make
/// every mutation durable before it becomes visible to `list`.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Insert the subscription or replace the record with the same
    /// endpoint in place.
    async fn add(&self, subscription: PushSubscription) -> Result<(), StoreError>;

    /// Returns `true` if a record was removed.
    async fn remove(&self, endpoint: &str) -> Result<bool, StoreError>;

    async fn list(&self) -> Result<Vec<PushSubscription>, StoreError>;

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.list().await?.len())
    }
}

/// Upsert by endpoint equality on a plain vector.
pub(crate) fn upsert(subscriptions: &mut Vec<PushSubscription>, subscription: PushSubscription) {
    match subscriptions
        .iter()
        .position(|s| s.endpoint == subscription.endpoint)
    {
        Some(idx) => subscriptions[idx] = subscription,
        None => subscriptions.push(subscription),
    }
}
