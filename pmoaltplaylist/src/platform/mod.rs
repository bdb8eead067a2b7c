//! HTTP client for the streaming platform (tracks, listening history, player queue)
//!
//! The platform speaks a Web-API style JSON protocol authenticated with a
//! bearer token. Token acquisition and refresh are handled elsewhere; the
//! client only carries the token it was configured with.

mod catalog;
mod player;

use crate::error::{AltPlaylistError, Result};
use crate::gateway::MetadataGateway;
use crate::models::{QueueSnapshot, RecentlyPlayed, Track};
use crate::DEFAULT_USER_AGENT;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Default platform API base URL
pub const DEFAULT_API_BASE: &str = "https://api.spotify.com/v1";

/// Default URI scheme, track URIs look like `spotify:track:<id>`
pub const DEFAULT_URI_SCHEME: &str = "spotify";

/// Default timeout for metadata HTTP requests
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Number of history entries fetched for the "already heard" exclusion set
pub const DEFAULT_RECENTLY_PLAYED_LIMIT: u32 = 50;

/// Streaming platform HTTP client
///
/// # Example
///
/// ```no_run
/// use pmoaltplaylist::PlatformClient;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = PlatformClient::builder().access_token("token").build()?;
///     let snapshot = client.queue_snapshot().await?;
///     println!("{} tracks queued", snapshot.queue.len());
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct PlatformClient {
    client: Client,
    api_base: String,
    access_token: String,
    uri_scheme: String,
    recently_played_limit: u32,
}

impl PlatformClient {
    /// Create a builder for configuring the client
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// URI scheme of track references (`<scheme>:track:<id>`)
    pub fn uri_scheme(&self) -> &str {
        &self.uri_scheme
    }

    /// Track URI for a platform ID
    pub fn track_uri(&self, id: &str) -> String {
        format!("{}:track:{}", self.uri_scheme, id)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(Url::parse(&format!(
            "{}{}",
            self.api_base.trim_end_matches('/'),
            path
        ))?)
    }

    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        if self.access_token.is_empty() {
            return Err(AltPlaylistError::Unauthorized(
                "No access token configured".to_string(),
            ));
        }
        Ok(request.bearer_auth(&self.access_token))
    }

    /// GET a JSON document from an absolute URL
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!("GET {}", url);
        let request = self.authorized(self.client.get(url))?;
        let response = Self::check_status(request.send().await?).await?;

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            warn!("Failed to parse platform response: {}", e);
            AltPlaylistError::Json(e)
        })
    }

    /// POST without body, ignoring any response payload
    pub(crate) async fn post_empty(&self, url: Url) -> Result<()> {
        debug!("POST {}", url);
        let request = self.authorized(self.client.post(url))?;
        Self::check_status(request.send().await?).await?;
        Ok(())
    }

    async fn check_status(response: Response) -> Result<Response> {
        let status = response.status();
        debug!("Response status: {}", status);

        if status.is_success() {
            return Ok(response);
        }

        let error_text = response.text().await.unwrap_or_default();
        warn!("Platform API error ({}): {}", status.as_u16(), error_text);
        Err(AltPlaylistError::from_status_code(
            status.as_u16(),
            error_text,
        ))
    }
}

#[async_trait]
impl MetadataGateway for PlatformClient {
    async fn track_details(&self, id: &str) -> Result<Track> {
        self.get_track(id).await
    }

    async fn recently_played(&self) -> Result<RecentlyPlayed> {
        PlatformClient::recently_played(self).await
    }

    async fn queue_snapshot(&self) -> Result<QueueSnapshot> {
        PlatformClient::queue_snapshot(self).await
    }
}

/// Builder for configuring a PlatformClient
#[derive(Debug)]
pub struct ClientBuilder {
    client: Option<Client>,
    api_base: String,
    access_token: String,
    uri_scheme: String,
    request_timeout: Duration,
    user_agent: String,
    recently_played_limit: u32,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            client: None,
            api_base: DEFAULT_API_BASE.to_string(),
            access_token: String::new(),
            uri_scheme: DEFAULT_URI_SCHEME.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            recently_played_limit: DEFAULT_RECENTLY_PLAYED_LIMIT,
        }
    }
}

impl ClientBuilder {
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

    /// Set the bearer token sent with every request
    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = token.into();
        self
    }

    /// Set the URI scheme of track references
    pub fn uri_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.uri_scheme = scheme.into();
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

    /// Set how many history entries are requested (the platform caps it at 50)
    pub fn recently_played_limit(mut self, limit: u32) -> Self {
        self.recently_played_limit = limit.clamp(1, 50);
        self
    }

    /// Build the client
    pub fn build(self) -> Result<PlatformClient> {
        let client = match self.client {
            Some(client) => client,
            None => Client::builder()
                .user_agent(&self.user_agent)
                .timeout(self.request_timeout)
                .build()?,
        };

        Ok(PlatformClient {
            client,
            api_base: self.api_base,
            access_token: self.access_token,
            uri_scheme: self.uri_scheme,
            recently_played_limit: self.recently_played_limit,
        })
    }
}
