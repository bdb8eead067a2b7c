//! HTTP client for the external recommendation service
//!
//! The service exposes two operations: a fuzzy track search returning ranked
//! `{track_id, track}` candidates, and a suggestion endpoint seeded with a
//! batch of its own track IDs.

use crate::error::{AltPlaylistError, Result};
use crate::gateway::RecommendationGateway;
use crate::models::{SearchCandidate, SuggestRequest, SuggestResponse};
use crate::DEFAULT_USER_AGENT;
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Default recommendation API base URL
pub const DEFAULT_API_BASE: &str = "https://api.reccobeats.com/v1";

/// Default timeout for recommendation requests
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Recommendation service HTTP client
#[derive(Debug, Clone)]
pub struct RecommenderClient {
    client: Client,
    api_base: String,
}

impl RecommenderClient {
    /// Create a builder for configuring the client
    pub fn builder() -> RecommenderBuilder {
        RecommenderBuilder::default()
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(Url::parse(&format!(
            "{}{}",
            self.api_base.trim_end_matches('/'),
            path
        ))?)
    }

    /// Fuzzy search, best candidate first
    pub async fn search(
        &self,
        query: &str,
        max_items: Option<u32>,
    ) -> Result<Vec<SearchCandidate>> {
        let mut url = self.endpoint("/search")?;
        url.query_pairs_mut().append_pair("query", query);
        if let Some(max) = max_items {
            url.query_pairs_mut()
                .append_pair("maxItems", &max.to_string());
        }

        debug!("Searching recommendation engine for '{}'", query);
        let response = self.client.get(url).send().await?;
        Self::parse(response).await
    }

    /// Suggestions for one batch of seed IDs
    pub async fn suggest(&self, request: &SuggestRequest) -> Result<SuggestResponse> {
        let url = self.endpoint("/suggest")?;

        debug!(
            "Requesting {} suggestions from {} seeds",
            request.size,
            request.track_ids.len()
        );
        let response = self.client.post(url).json(request).send().await?;
        Self::parse(response).await
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!("Recommendation API error ({}): {}", status.as_u16(), error_text);
            return Err(AltPlaylistError::from_status_code(
                status.as_u16(),
                error_text,
            ));
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            warn!("Failed to parse recommendation response: {}", e);
            AltPlaylistError::Json(e)
        })
    }
}

#[async_trait]
impl RecommendationGateway for RecommenderClient {
    async fn search(
        &self,
        query: &str,
        max_items: Option<u32>,
    ) -> Result<Vec<SearchCandidate>> {
        RecommenderClient::search(self, query, max_items).await
    }

    async fn suggest(&self, request: &SuggestRequest) -> Result<SuggestResponse> {
        RecommenderClient::suggest(self, request).await
    }
}

/// Builder for configuring a RecommenderClient
#[derive(Debug)]
pub struct RecommenderBuilder {
    client: Option<Client>,
    api_base: String,
    request_timeout: Duration,
    user_agent: String,
}

impl Default for RecommenderBuilder {
    fn default() -> Self {
        Self {
            client: None,
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl RecommenderBuilder {
    /// Set a custom HTTP client
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Set the API base URL
    pub fn api_base(mut self, url: impl Into<String>) -> Self {
        self.api_base = url.into();
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set a custom User-Agent header
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Build the client
    pub fn build(self) -> Result<RecommenderClient> {
        let client = match self.client {
            Some(client) => client,
            None => Client::builder()
                .user_agent(&self.user_agent)
                .timeout(self.request_timeout)
                .build()?,
        };

        Ok(RecommenderClient {
            client,
            api_base: self.api_base,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let builder = RecommenderBuilder::default();
        assert_eq!(builder.api_base, DEFAULT_API_BASE);
        assert_eq!(
            builder.request_timeout,
            Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)
        );
    }

    #[test]
    fn test_suggest_payload_shape() {
        let request = SuggestRequest {
            track_ids: vec!["a".to_string(), "b".to_string()],
            size: 2,
            creativity: 0.99,
            noise: 0.0,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["track_ids"], serde_json::json!(["a", "b"]));
        assert_eq!(json["size"], 2);
        assert_eq!(json["creativity"], 0.99);
        assert_eq!(json["noise"], 0.0);
    }
}
