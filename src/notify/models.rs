use serde::{Deserialize, Serialize};

pub const DEFAULT_ICON: &str = "/icons/icon-192x192.svg";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SubscriptionKeys {
    pub p256dh: String,
    pub auth: String,
}

/// A browser push subscription in the shape produced by
/// `PushSubscription.toJSON()`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PushSubscription {
    pub endpoint: String,
    pub keys: SubscriptionKeys,
    #[serde(default)]
    pub expiration_time: Option<i64>,
}

impl PushSubscription {
    pub fn new(endpoint: &str, p256dh: &str, auth: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            keys: SubscriptionKeys {
                p256dh: p256dh.to_string(),
                auth: auth.to_string(),
            },
            expiration_time: None,
        }
    }
}

/// Semantic category of a notification. The service worker routes
/// clicks to a fixed page for every kind except `General`.
/// Unknown kinds read from JSON fall back to `General`.
#[derive(
    Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
#[value(rename_all = "lowercase")]
pub enum NotificationKind {
    Service,
    Portfolio,
    Contact,
    Pricing,
    #[default]
    #[serde(other)]
    General,
}

impl NotificationKind {
    /// Path the app should open when a notification of this kind is
    /// clicked, if the kind has one.
    pub fn route(&self) -> Option<&'static str> {
        match self {
            NotificationKind::General => None,
            NotificationKind::Service => Some("/services"),
            NotificationKind::Portfolio => Some("/portfolio"),
            NotificationKind::Contact => Some("/contact"),
            NotificationKind::Pricing => Some("/pricing"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PushNotificationAction {
    pub action: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl PushNotificationAction {
    pub fn new(action: &str, title: &str, icon: Option<&str>) -> Self {
        Self {
            action: action.to_string(),
            title: title.to_string(),
            icon: icon.map(|s| s.to_string()),
        }
    }
}

/// Body of every push message sent by the server. The service worker
/// merges these fields over its own defaults before rendering.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PushNotificationPayload {
    pub title: String,
    pub body: String,
    pub url: String,
    pub icon: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub require_interaction: bool,
    pub vibrate: Vec<u32>,
    pub actions: Vec<PushNotificationAction>,
}

/// Server side defaults applied to every outgoing payload.
#[derive(Debug, Clone)]
pub struct PayloadDefaults {
    pub site_url: String,
    pub icon: String,
}

impl Default for PayloadDefaults {
    fn default() -> Self {
        Self {
            site_url: "https://kiatechsoftware.com".to_string(),
            icon: DEFAULT_ICON.to_string(),
        }
    }
}

impl PushNotificationPayload {
    pub fn new(
        title: &str,
        body: &str,
        url: Option<&str>,
        icon: Option<&str>,
        kind: Option<NotificationKind>,
        defaults: &PayloadDefaults,
    ) -> Self {
        let icon = icon
            .filter(|i| !i.is_empty())
            .unwrap_or(&defaults.icon)
            .to_string();
        Self {
            title: title.to_string(),
            body: body.to_string(),
            url: url
                .filter(|u| !u.is_empty())
                .unwrap_or(&defaults.site_url)
                .to_string(),
            kind: kind.unwrap_or_default(),
            require_interaction: true,
            vibrate: vec![100, 50, 100],
            actions: vec![
                PushNotificationAction::new("explore", "Visit Website", Some(&icon)),
                PushNotificationAction::new("close", "Close", Some(&icon)),
            ],
            icon,
        }
    }
}

/// Request accepted by `PushService::send_notification`.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct NotificationRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    pub url: Option<String>,
    pub icon: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<NotificationKind>,
}

/// Outcome of a fan-out. `attempted` is the number of subscriptions
/// present when the send started.
#[derive(Debug, Serialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub attempted: usize,
    pub delivered: usize,
    pub failed: usize,
    pub pruned: usize,
}
