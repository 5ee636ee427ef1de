use anyhow::Result;

use crate::core::AppConfig;
use crate::store::{JsonFileStore, SubscriptionStore};

pub async fn run() -> Result<()> {
    let config = AppConfig::from_env();
    let store = JsonFileStore::open(&config.subscriptions_path).await?;
    println!("{}", store.count().await?);
    Ok(())
}
