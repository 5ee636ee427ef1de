//! Turning push message data into a displayable notification

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::notify::{DEFAULT_ICON, NotificationKind, PushNotificationAction};

/// Template every incoming push is merged over.
#[derive(Debug, Clone)]
pub struct NotificationDefaults {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
    pub actions: Vec<PushNotificationAction>,
}

impl Default for NotificationDefaults {
    fn default() -> Self {
        Self {
            title: "Kiatech Software".to_string(),
            body: "New update from Kiatech Software!".to_string(),
            icon: DEFAULT_ICON.to_string(),
            badge: DEFAULT_ICON.to_string(),
            vibrate: vec![100, 50, 100],
            actions: vec![
                PushNotificationAction::new("explore", "Visit Website", Some(DEFAULT_ICON)),
                PushNotificationAction::new("close", "Close", Some(DEFAULT_ICON)),
            ],
        }
    }
}

/// Data carried by a shown notification and handed back on click.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationData {
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub url: Option<String>,
    pub date_of_arrival: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationOptions {
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
    pub require_interaction: bool,
    pub actions: Vec<PushNotificationAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    pub data: NotificationData,
}

/// A notification as handed to the platform for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayedNotification {
    pub title: String,
    pub options: NotificationOptions,
}

/// Fields a push message may override. Anything absent or of the
/// wrong type keeps the default.
#[derive(Debug, Default)]
struct PushData {
    title: Option<String>,
    body: Option<String>,
    icon: Option<String>,
    badge: Option<String>,
    url: Option<String>,
    kind: Option<NotificationKind>,
    vibrate: Option<Vec<u32>>,
    require_interaction: Option<bool>,
    actions: Option<Vec<PushNotificationAction>>,
    tag: Option<String>,
}

impl PushData {
    fn from_object(object: &Map<String, Value>) -> Self {
        Self {
            title: field(object, "title"),
            body: field(object, "body"),
            icon: field(object, "icon"),
            badge: field(object, "badge"),
            url: field(object, "url"),
            kind: field(object, "type"),
            vibrate: field(object, "vibrate"),
            require_interaction: field(object, "requireInteraction"),
            actions: field(object, "actions"),
            tag: field(object, "tag"),
        }
    }

    fn text(bytes: &[u8]) -> Self {
        Self {
            body: Some(String::from_utf8_lossy(bytes).into_owned()),
            ..Default::default()
        }
    }
}

fn field<T: DeserializeOwned>(object: &Map<String, Value>, key: &str) -> Option<T> {
    let value = object.get(key)?;
    match T::deserialize(value) {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            tracing::debug!("Ignoring push field {}: {}", key, err);
            None
        }
    }
}

/// Build the notification for a push event payload.
///
/// A JSON object payload is merged field by field over `defaults`. Any
/// other payload is shown as plain text in the body under the default
/// title. No payload at all shows the defaults.
pub fn build_notification(
    payload: Option<&[u8]>,
    defaults: &NotificationDefaults,
    arrived_at: i64,
) -> DisplayedNotification {
    let data = match payload {
        None => PushData::default(),
        Some(bytes) => match serde_json::from_slice::<Value>(bytes) {
            Ok(Value::Object(object)) => PushData::from_object(&object),
            Ok(_) => PushData::text(bytes),
            Err(err) => {
                tracing::debug!("Push data is not json, using text: {}", err);
                PushData::text(bytes)
            }
        },
    };

    DisplayedNotification {
        title: data.title.unwrap_or_else(|| defaults.title.clone()),
        options: NotificationOptions {
            body: data.body.unwrap_or_else(|| defaults.body.clone()),
            icon: data.icon.unwrap_or_else(|| defaults.icon.clone()),
            badge: data.badge.unwrap_or_else(|| defaults.badge.clone()),
            vibrate: data.vibrate.unwrap_or_else(|| defaults.vibrate.clone()),
            require_interaction: data.require_interaction.unwrap_or(false),
            actions: data.actions.unwrap_or_else(|| defaults.actions.clone()),
            tag: data.tag,
            data: NotificationData {
                kind: data.kind.unwrap_or_default(),
                url: data.url.filter(|u| !u.is_empty()),
                date_of_arrival: arrived_at,
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_merges_json_over_defaults() {
        let defaults = NotificationDefaults::default();
        let n = build_notification(
            Some(br#"{"title":"Sale","body":"50% off","type":"pricing"}"#.as_slice()),
            &defaults,
            42,
        );

        assert_eq!(n.title, "Sale");
        assert_eq!(n.options.body, "50% off");
        assert_eq!(n.options.icon, defaults.icon);
        assert_eq!(n.options.vibrate, vec![100, 50, 100]);
        assert_eq!(n.options.actions.len(), 2);
        assert_eq!(n.options.data.kind, NotificationKind::Pricing);
        assert_eq!(n.options.data.date_of_arrival, 42);
    }

    #[test]
    fn it_uses_raw_text_for_unparsable_payload() {
        let defaults = NotificationDefaults::default();
        let n = build_notification(Some([0xffu8, b'h', b'i', 0x00].as_slice()), &defaults, 0);

        assert_eq!(n.title, defaults.title);
        assert_eq!(n.options.body, "\u{fffd}hi\u{0}");
    }

    #[test]
    fn it_uses_raw_text_for_non_object_json() {
        let n = build_notification(
            Some(b"\"just a string\"".as_slice()),
            &NotificationDefaults::default(),
            0,
        );
        assert_eq!(n.options.body, "\"just a string\"");
    }

    #[test]
    fn it_shows_defaults_without_payload() {
        let defaults = NotificationDefaults::default();
        let n = build_notification(None, &defaults, 0);
        assert_eq!(n.title, defaults.title);
        assert_eq!(n.options.body, defaults.body);
        assert_eq!(n.options.data.kind, NotificationKind::General);
        assert_eq!(n.options.data.url, None);
    }

    #[test]
    fn it_keeps_server_payload_fields() {
        let n = build_notification(
            Some(
                br#"{"title":"T","body":"B","url":"https://example.com/x","icon":"/i.svg","type":"newsletter","requireInteraction":true,"vibrate":[1],"actions":[]}"#
                    .as_slice(),
            ),
            &NotificationDefaults::default(),
            0,
        );
        assert_eq!(n.options.icon, "/i.svg");
        assert!(n.options.require_interaction);
        assert_eq!(n.options.vibrate, vec![1]);
        assert!(n.options.actions.is_empty());
        assert_eq!(n.options.data.kind, NotificationKind::General);
        assert_eq!(n.options.data.url.as_deref(), Some("https://example.com/x"));
    }

    #[test]
    fn it_keeps_defaults_for_mistyped_fields() {
        let defaults = NotificationDefaults::default();
        let n = build_notification(
            Some(
                br#"{"title":"Flash sale","body":"Today only","vibrate":200,"type":7,"url":null}"#
                    .as_slice(),
            ),
            &defaults,
            0,
        );

        assert_eq!(n.title, "Flash sale");
        assert_eq!(n.options.body, "Today only");
        assert_eq!(n.options.vibrate, defaults.vibrate);
        assert_eq!(n.options.data.kind, NotificationKind::General);
        assert_eq!(n.options.data.url, None);
    }
}
