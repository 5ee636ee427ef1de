use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{StoreError, SubscriptionStore, upsert};
use crate::notify::PushSubscription;

/// Non-persistent store
#[derive(Debug, Default)]
pub struct MemoryStore {
    subscriptions: Mutex<Vec<PushSubscription>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SubscriptionStore for MemoryStore {
    async fn add(&self, subscription: PushSubscription) -> Result<(), StoreError> {
        upsert(&mut *self.subscriptions.lock().await, subscription);
        Ok(())
    }

    async fn remove(&self, endpoint: &str) -> Result<bool, StoreError> {
        let mut subscriptions = self.subscriptions.lock().await;
        let before = subscriptions.len();
        subscriptions.retain(|s| s.endpoint != endpoint);
        Ok(subscriptions.len() != before)
    }

    async fn list(&self) -> Result<Vec<PushSubscription>, StoreError> {
        Ok(self.subscriptions.lock().await.clone())
    }
}
