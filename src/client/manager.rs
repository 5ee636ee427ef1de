use std::sync::Mutex;
use std::time::Duration;

use super::{
    Capabilities, ClientError, NotificationPermission, Permission, PushRegistration,
    ServiceWorkerContainer, SubscriptionApi, decode_application_server_key,
};
use crate::notify::PushSubscription;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    /// The host lacks push support. Terminal.
    Unsupported,
    Default,
    Subscribed,
    Unsubscribed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscribeOutcome {
    Subscribed(PushSubscription),
    Unsupported,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsubscribeOutcome {
    Unsubscribed,
    AlreadyUnsubscribed,
    Unsupported,
}

#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Worker script registered when no worker becomes ready in time
    pub script_url: String,
    pub ready_timeout: Duration,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            script_url: "/sw.js".to_string(),
            ready_timeout: Duration::from_secs(10),
        }
    }
}

/// Drives the permission prompt, worker registration and key exchange
/// needed to create or cancel a push subscription.
pub struct SubscriptionManager<P, C, A> {
    permission: P,
    container: C,
    api: A,
    config: ManagerConfig,
    state: Mutex<ClientState>,
}

impl<P, C, A> SubscriptionManager<P, C, A>
where
    P: NotificationPermission,
    C: ServiceWorkerContainer,
    A: SubscriptionApi,
{
    pub fn new(
        capabilities: Capabilities,
        permission: P,
        container: C,
        api: A,
        config: ManagerConfig,
    ) -> Self {
        let state = if capabilities.supports_push() {
            ClientState::Default
        } else {
            tracing::info!("Push notifications are not supported");
            ClientState::Unsupported
        };
        Self {
            permission,
            container,
            api,
            config,
            state: Mutex::new(state),
        }
    }

    pub fn state(&self) -> ClientState {
        *self.state.lock().expect("client state lock poisoned")
    }

    fn set_state(&self, next: ClientState) {
        *self.state.lock().expect("client state lock poisoned") = next;
    }

    fn is_unsupported(&self) -> bool {
        self.state() == ClientState::Unsupported
    }

    async fn ensure_permission(&self) -> Result<(), ClientError> {
        if self.permission.current() == Permission::Granted {
            return Ok(());
        }
        match self.permission.request().await {
            Permission::Granted => Ok(()),
            _ => Err(ClientError::PermissionDenied),
        }
    }

    /// Wait a bounded time for an active worker, then fall back to
    /// registering the script ourselves.
    async fn registration(&self) -> Result<C::Registration, ClientError> {
        match tokio::time::timeout(self.config.ready_timeout, self.container.ready()).await {
            Ok(registration) => registration,
            Err(_) => {
                tracing::warn!(
                    "Service worker not ready after {:?}, registering {}",
                    self.config.ready_timeout,
                    self.config.script_url
                );
                self.container.register(&self.config.script_url).await
            }
        }
    }

    /// Create a push subscription and register it with the server.
    ///
    /// If the server call fails after the browser created the
    /// subscription, the local subscription is left in place and the
    /// error is returned.
    pub async fn subscribe(&self) -> Result<SubscribeOutcome, ClientError> {
        if self.is_unsupported() {
            return Ok(SubscribeOutcome::Unsupported);
        }

        self.ensure_permission().await?;

        let public_key = self.api.public_key().await?;
        let application_server_key = decode_application_server_key(&public_key)?;

        self.container.post_skip_waiting();
        let registration = self.registration().await?;

        let subscription = registration.subscribe(&application_server_key).await?;
        tracing::debug!("Push subscription created: {}", subscription.endpoint);

        self.api.subscribe(&subscription).await?;
        self.set_state(ClientState::Subscribed);
        Ok(SubscribeOutcome::Subscribed(subscription))
    }

    /// Cancel the local subscription, then tell the server. A failed
    /// server call is logged and not retried.
    pub async fn unsubscribe(&self) -> Result<UnsubscribeOutcome, ClientError> {
        if self.is_unsupported() {
            return Ok(UnsubscribeOutcome::Unsupported);
        }

        let registration = self.registration().await?;
        let Some(subscription) = registration.get_subscription().await? else {
            self.set_state(ClientState::Unsubscribed);
            return Ok(UnsubscribeOutcome::AlreadyUnsubscribed);
        };

        registration.unsubscribe().await?;
        self.set_state(ClientState::Unsubscribed);

        if let Err(err) = self.api.unsubscribe(&subscription.endpoint).await {
            tracing::warn!(
                "Failed to notify server of unsubscribe for {}: {}",
                subscription.endpoint,
                err
            );
        }
        Ok(UnsubscribeOutcome::Unsubscribed)
    }

    /// Whether the active registration holds a subscription. Errors are
    /// logged and reported as `false`. Never registers a worker.
    pub async fn is_subscribed(&self) -> bool {
        if self.is_unsupported() {
            return false;
        }
        let ready =
            match tokio::time::timeout(self.config.ready_timeout, self.container.ready()).await {
                Ok(ready) => ready,
                Err(_) => {
                    tracing::warn!(
                        "Service worker not ready after {:?}",
                        self.config.ready_timeout
                    );
                    return false;
                }
            };
        let result = match ready {
            Ok(registration) => registration.get_subscription().await,
            Err(err) => Err(err),
        };
        match result {
            Ok(subscription) => subscription.is_some(),
            Err(err) => {
                tracing::error!("Error checking subscription status: {}", err);
                false
            }
        }
    }
}
