//! Service worker runtime: offline caching, push rendering and
//! notification click routing.
//!
//! The browser facilities a worker script reaches through globals
//! (`caches`, `fetch`, `registration.showNotification`, `clients`,
//! IndexedDB) are injected as traits, see [`WorkerCapabilities`].

pub mod click;
pub mod fetch;
pub mod lifecycle;
pub mod log;
pub mod push;

pub use click::{ClickOutcome, resolve_target};
pub use fetch::{Destination, FetchRequest, FetchResponse, ResponseType};
pub use lifecycle::WorkerState;
pub use log::{LogEntry, NewLogEntry, NotificationLog, RetentionPolicy, SqliteNotificationLog};
pub use push::{DisplayedNotification, NotificationDefaults, NotificationOptions};

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use http::Method;
use tokio::sync::broadcast;

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("invalid worker state transition from {from} to {to}")]
    InvalidTransition { from: WorkerState, to: WorkerState },
    #[error("cache error: {0}")]
    Cache(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("notification error: {0}")]
    Notification(String),
    #[error("clients error: {0}")]
    Clients(String),
    #[error("notification log error: {0}")]
    Log(#[from] tokio_rusqlite::Error),
}

/// `CacheStorage` and the `Cache` objects it holds, keyed by request
/// url.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Look the url up across every cache.
    async fn match_url(&self, url: &str) -> Result<Option<FetchResponse>, WorkerError>;

    /// Store a response, creating the named cache if needed.
    async fn put(&self, cache: &str, url: &str, response: FetchResponse)
    -> Result<(), WorkerError>;

    async fn keys(&self) -> Result<Vec<String>, WorkerError>;

    async fn delete(&self, cache: &str) -> Result<bool, WorkerError>;
}

#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, WorkerError>;
}

#[async_trait]
pub trait NotificationSurface: Send + Sync {
    async fn show(&self, notification: &DisplayedNotification) -> Result<(), WorkerError>;

    async fn close(&self, notification: &DisplayedNotification);
}

/// An open window controlled by (or visible to) the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowClient {
    pub id: String,
    pub url: String,
}

#[async_trait]
pub trait Clients: Send + Sync {
    /// All window clients, including uncontrolled ones
    async fn match_all(&self) -> Result<Vec<WindowClient>, WorkerError>;

    async fn focus(&self, id: &str) -> Result<(), WorkerError>;

    async fn navigate(&self, id: &str, url: &str) -> Result<(), WorkerError>;

    async fn open_window(&self, url: &str) -> Result<(), WorkerError>;

    /// Take control of every open page in scope.
    async fn claim(&self) -> Result<(), WorkerError>;
}

#[derive(Clone)]
pub struct WorkerCapabilities {
    pub caches: Arc<dyn CacheStorage>,
    pub network: Arc<dyn Network>,
    pub notifications: Arc<dyn NotificationSurface>,
    pub clients: Arc<dyn Clients>,
    pub log: Arc<dyn NotificationLog>,
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Name of the current cache. Any other cache is deleted on
    /// activation.
    pub cache_name: String,
    pub precache: Vec<String>,
    /// Origin the worker is registered for, e.g. `https://example.com`
    pub origin: String,
    pub notification_defaults: NotificationDefaults,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            cache_name: "kiatech-software-v1.0.0".to_string(),
            precache: [
                "/",
                "/manifest.json",
                "/sw.js",
                "/icons/icon-192x192.svg",
                "/icons/icon-512x512.svg",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            origin: "https://kiatechsoftware.com".to_string(),
            notification_defaults: NotificationDefaults::default(),
        }
    }
}

/// Messages posted from the worker to open pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageMessage {
    NotificationReceived(LogEntry),
}

pub struct ServiceWorker {
    config: WorkerConfig,
    caps: WorkerCapabilities,
    state: Mutex<WorkerState>,
    pages: broadcast::Sender<PageMessage>,
}

impl ServiceWorker {
    pub fn new(config: WorkerConfig, caps: WorkerCapabilities) -> Self {
        let (pages, _) = broadcast::channel(16);
        Self {
            config,
            caps,
            state: Mutex::new(WorkerState::Parsed),
            pages,
        }
    }

    pub fn state(&self) -> WorkerState {
        *self.state.lock().expect("worker state lock poisoned")
    }

    fn transition(&self, next: WorkerState) -> Result<(), WorkerError> {
        let mut state = self.state.lock().expect("worker state lock poisoned");
        if !state.can_transition_to(next) {
            return Err(WorkerError::InvalidTransition {
                from: *state,
                to: next,
            });
        }
        tracing::debug!("Service worker {} -> {}", *state, next);
        *state = next;
        Ok(())
    }

    /// Receive live updates for open pages.
    pub fn subscribe_pages(&self) -> broadcast::Receiver<PageMessage> {
        self.pages.subscribe()
    }

    /// Pre-cache the configured assets. Each asset is fetched on its
    /// own and a failure only skips that asset. Returns the urls that
    /// were cached.
    pub async fn install(&self) -> Result<Vec<String>, WorkerError> {
        self.transition(WorkerState::Installing)?;

        let cache_name = &self.config.cache_name;
        let results = futures::future::join_all(self.config.precache.iter().map(|url| async move {
            let response = self
                .caps
                .network
                .fetch(&FetchRequest::get(url, Destination::Other))
                .await?;
            if !response.status.is_success() {
                return Err(WorkerError::Network(format!(
                    "unexpected status {}",
                    response.status
                )));
            }
            self.caps.caches.put(cache_name, url, response).await
        }))
        .await;

        let mut cached = Vec::new();
        for (url, result) in self.config.precache.iter().zip(results) {
            match result {
                Ok(()) => cached.push(url.clone()),
                Err(err) => tracing::warn!("Failed to cache {}: {}", url, err),
            }
        }

        // Skip waiting, the new worker activates as soon as it's
        // installed
        self.transition(WorkerState::Installed)?;
        tracing::info!(
            "Service worker installed, cached {}/{} assets",
            cached.len(),
            self.config.precache.len()
        );
        Ok(cached)
    }

    /// Delete caches from previous versions and claim open pages.
    /// Returns the names of deleted caches.
    pub async fn activate(&self) -> Result<Vec<String>, WorkerError> {
        self.transition(WorkerState::Activating)?;

        let mut deleted = Vec::new();
        match self.caps.caches.keys().await {
            Ok(names) => {
                for name in names.into_iter().filter(|n| *n != self.config.cache_name) {
                    match self.caps.caches.delete(&name).await {
                        Ok(_) => {
                            tracing::info!("Deleted old cache: {}", name);
                            deleted.push(name);
                        }
                        Err(err) => tracing::warn!("Failed to delete cache {}: {}", name, err),
                    }
                }
            }
            Err(err) => tracing::warn!("Failed to list caches: {}", err),
        }

        if let Err(err) = self.caps.clients.claim().await {
            tracing::warn!("Failed to claim clients: {}", err);
        }

        self.transition(WorkerState::Activated)?;
        Ok(deleted)
    }

    /// Answer a page request, cache first.
    pub async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, WorkerError> {
        if !self.state().can_intercept_fetch() || request.method != Method::GET {
            return self.caps.network.fetch(request).await;
        }

        match self.caps.caches.match_url(&request.url).await {
            Ok(Some(cached)) => return Ok(cached),
            Ok(None) => {}
            Err(err) => tracing::warn!("Cache lookup failed for {}: {}", request.url, err),
        }

        match self.caps.network.fetch(request).await {
            Ok(response) => {
                if response.is_cacheable() {
                    if let Err(err) = self
                        .caps
                        .caches
                        .put(&self.config.cache_name, &request.url, response.clone())
                        .await
                    {
                        tracing::warn!("Failed to cache {}: {}", request.url, err);
                    }
                }
                Ok(response)
            }
            Err(err) if request.destination == Destination::Document => {
                tracing::debug!("Offline navigation to {}, serving cached root", request.url);
                match self.caps.caches.match_url("/").await {
                    Ok(Some(root)) => Ok(root),
                    _ => Err(err),
                }
            }
            Err(err) => Err(err),
        }
    }

    /// Handle a push event: show the notification, record it in the
    /// log and tell any open pages about it.
    pub async fn push(&self, payload: Option<&[u8]>) -> DisplayedNotification {
        let now = Utc::now();
        let notification = push::build_notification(
            payload,
            &self.config.notification_defaults,
            now.timestamp_millis(),
        );

        if let Err(err) = self.caps.notifications.show(&notification).await {
            tracing::error!("Error showing notification: {}", err);
        }

        let entry = NewLogEntry {
            title: notification.title.clone(),
            body: notification.options.body.clone(),
            url: resolve_target(&notification.options.data),
            timestamp: now,
        };
        match self.caps.log.append(entry).await {
            Ok(stored) => {
                // No open pages is not an error
                let _ = self.pages.send(PageMessage::NotificationReceived(stored));
            }
            Err(err) => tracing::error!("Failed to store notification: {}", err),
        }

        notification
    }

    /// Handle a click on a notification or one of its action buttons.
    pub async fn notification_click(
        &self,
        notification: &DisplayedNotification,
        action: Option<&str>,
    ) -> Result<ClickOutcome, WorkerError> {
        self.caps.notifications.close(notification).await;

        if action == Some(click::CLOSE_ACTION) {
            return Ok(ClickOutcome::Dismissed);
        }

        let url = resolve_target(&notification.options.data);
        tracing::debug!("Notification click routing to {}", url);

        let clients = self.caps.clients.match_all().await?;
        if let Some(client) = clients
            .into_iter()
            .find(|c| click::same_origin(&c.url, &self.config.origin))
        {
            self.caps.clients.focus(&client.id).await?;
            self.caps.clients.navigate(&client.id, &url).await?;
            return Ok(ClickOutcome::Focused {
                client_id: client.id,
                url,
            });
        }

        self.caps.clients.open_window(&url).await?;
        Ok(ClickOutcome::Opened { url })
    }
}
