use std::env;

use anyhow::{Context, Result};

use crate::notify::{DEFAULT_ICON, PayloadDefaults, VapidKeys};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub host: String,
    pub port: String,
    pub subscriptions_path: String,
    pub static_dir: String,
    pub vapid_public_key: Option<String>,
    pub vapid_private_key: Option<String>,
    pub vapid_email: String,
    pub site_url: String,
    pub default_icon: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: "3001".to_string(),
            subscriptions_path: "./subscriptions.json".to_string(),
            static_dir: "./public".to_string(),
            vapid_public_key: None,
            vapid_private_key: None,
            vapid_email: "mailto:info@kiatechsoftware.com".to_string(),
            site_url: "https://kiatechsoftware.com".to_string(),
            default_icon: DEFAULT_ICON.to_string(),
        }
    }
}

impl AppConfig {
    /// Read configuration from the environment, falling back to the
    /// defaults for anything unset.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: env::var("BEACON_HOST").unwrap_or(defaults.host),
            port: env::var("PORT").unwrap_or(defaults.port),
            subscriptions_path: env::var("BEACON_SUBSCRIPTIONS_PATH")
                .unwrap_or(defaults.subscriptions_path),
            static_dir: env::var("BEACON_STATIC_DIR").unwrap_or(defaults.static_dir),
            vapid_public_key: env::var("VAPID_PUBLIC_KEY").ok(),
            vapid_private_key: env::var("VAPID_PRIVATE_KEY").ok(),
            vapid_email: env::var("VAPID_EMAIL").unwrap_or(defaults.vapid_email),
            site_url: env::var("BEACON_SITE_URL").unwrap_or(defaults.site_url),
            default_icon: env::var("BEACON_DEFAULT_ICON").unwrap_or(defaults.default_icon),
        }
    }

    pub fn vapid_keys(&self) -> Result<VapidKeys> {
        let private_key = self
            .vapid_private_key
            .as_deref()
            .context("Missing env var VAPID_PRIVATE_KEY")?;
        VapidKeys::new(
            private_key,
            self.vapid_public_key.as_deref(),
            &self.vapid_email,
        )
    }

    pub fn payload_defaults(&self) -> PayloadDefaults {
        PayloadDefaults {
            site_url: self.site_url.clone(),
            icon: self.default_icon.clone(),
        }
    }
}
