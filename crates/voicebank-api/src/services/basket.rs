//! Basket/marketing sync client.
//!
//! Called fire-and-forget after every contribution; when no endpoint is
//! configured the sync is a no-op.

use async_trait::async_trait;

use voicebank_core::{AppError, MarketingSync};

pub struct BasketClient {
    client: reqwest::Client,
    url: Option<String>,
}

impl BasketClient {
    pub fn new(url: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }
}

#[async_trait]
impl MarketingSync for BasketClient {
    async fn sync(&self, client_id: &str) -> Result<(), AppError> {
        let Some(url) = &self.url else {
            return Ok(());
        };

        self.client
            .post(url)
            .json(&serde_json::json!({ "client_id": client_id }))
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| AppError::Internal(format!("basket sync failed: {}", e)))?;

        Ok(())
    }
}
