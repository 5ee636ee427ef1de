use anyhow::Result;

use crate::api;
use crate::core::AppConfig;

pub async fn run(host: Option<String>, port: Option<String>) -> Result<()> {
    let mut config = AppConfig::from_env();
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }
    api::serve(config).await
}
