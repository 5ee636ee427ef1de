use async_trait::async_trait;
use reqwest::Client;

use super::{ClientError, SubscriptionApi};
use crate::api::public::push::PublicKeyResponse;
use crate::notify::PushSubscription;

/// `SubscriptionApi` backed by the push server's HTTP endpoints.
#[derive(Clone)]
pub struct HttpSubscriptionApi {
    base_url: String,
    client: Client,
}

impl HttpSubscriptionApi {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }
}

async fn check(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(ClientError::Server {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl SubscriptionApi for HttpSubscriptionApi {
    async fn public_key(&self) -> Result<String, ClientError> {
        let response = self.client.get(self.url("vapid-public-key")).send().await?;
        let body: PublicKeyResponse = check(response).await?.json().await?;
        Ok(body.public_key)
    }

    async fn subscribe(&self, subscription: &PushSubscription) -> Result<(), ClientError> {
        let response = self
            .client
            .post(self.url("subscribe"))
            .json(subscription)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn unsubscribe(&self, endpoint: &str) -> Result<(), ClientError> {
        let response = self
            .client
            .post(self.url("unsubscribe"))
            .json(&serde_json::json!({ "endpoint": endpoint }))
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }
}
