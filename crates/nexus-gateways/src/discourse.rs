//! Discourse credential-validation adapter.
//!
//! Validates an admin API key against the forum's `about.json`
//! endpoint before the integration is persisted.

use std::time::Duration;

use nexus_core::error::{NexusError, NexusResult};
use nexus_core::exchange::DiscourseExchange;
use reqwest::Client;

#[derive(Clone)]
pub struct DiscourseApi {
    client: Client,
}

impl Default for DiscourseApi {
    fn default() -> Self {
        Self::new()
    }
}

impl DiscourseApi {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .expect("reqwest client");

        Self { client }
    }
}

impl DiscourseExchange for DiscourseApi {
    async fn validate_credentials(&self, forum_hostname: &str, api_key: &str) -> NexusResult<()> {
        let url = format!("https://{forum_hostname}/about.json");
        let response = self
            .client
            .get(&url)
            .header("Api-Key", api_key)
            .header("Api-Username", "system")
            .send()
            .await
            .map_err(|e| NexusError::UpstreamRejected {
                platform: "discourse".into(),
                reason: format!("credential validation failed: {e}"),
            })?;

        if !response.status().is_success() {
            return Err(NexusError::UpstreamRejected {
                platform: "discourse".into(),
                reason: format!("credential validation returned {}", response.status()),
            });
        }

        Ok(())
    }
}
