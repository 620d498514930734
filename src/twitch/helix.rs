//! Twitch API client
//!
//! Talks to the OAuth token endpoint and the Helix streams endpoint. Both calls
//! are exposed through traits so the caches can be exercised without a network.

use crate::{
    Result,
    config::Settings,
    types::{ChannelKey, StreamsResponse, TokenGrant},
};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use url::Url;

/// Longest upstream error body kept in an error message
const MAX_ERROR_BODY: usize = 512;

/// Source of app access tokens
#[async_trait::async_trait]
pub trait OAuthProvider: Send + Sync + std::fmt::Debug {
    /// Perform a client-credentials grant
    async fn request_app_token(&self) -> Result<TokenGrant>;
}

/// Source of stream listings
#[async_trait::async_trait]
pub trait StreamsProvider: Send + Sync + std::fmt::Debug {
    /// List active streams for one login
    async fn fetch_streams(&self, login: &ChannelKey, token: &str) -> Result<StreamsResponse>;
}

/// Helix API client
#[derive(Debug, Clone)]
pub struct HelixClient {
    /// HTTP client, carries the request and connect timeouts
    client: Client,
    client_id: String,
    client_secret: String,
    auth_url: Url,
    streams_url: Url,
    /// Whole-request timeout, kept for error reporting
    request_timeout: Duration,
}

impl HelixClient {
    /// Create a client from settings
    pub fn new(settings: &Settings) -> Result<Self> {
        let request_timeout = Duration::from_secs(settings.network.request_timeout);
        let client = Client::builder()
            .user_agent(&settings.network.user_agent)
            .connect_timeout(Duration::from_secs(settings.network.connect_timeout))
            .timeout(request_timeout)
            .build()?;

        Self::with_client(client, settings, request_timeout)
    }

    /// Create a client around an existing `reqwest::Client`
    pub fn with_client(
        client: Client,
        settings: &Settings,
        request_timeout: Duration,
    ) -> Result<Self> {
        let twitch = &settings.twitch;
        let auth_url = Url::parse(&twitch.auth_url)?;
        let streams_url = Url::parse(&format!(
            "{}/streams",
            twitch.api_url.trim_end_matches('/')
        ))?;

        Ok(Self {
            client,
            client_id: twitch.client_id.clone(),
            client_secret: twitch.client_secret.clone(),
            auth_url,
            streams_url,
            request_timeout,
        })
    }

    /// Streams endpoint this client queries
    pub fn streams_url(&self) -> &Url {
        &self.streams_url
    }

    // The token request URL carries the client secret, so the URL is dropped from errors.
    fn map_send_error(&self, operation: &str, error: reqwest::Error) -> crate::Error {
        if error.is_timeout() {
            crate::Error::timeout(operation, self.request_timeout.as_secs())
        } else {
            crate::Error::Http(error.without_url())
        }
    }
}

/// Read an error body for diagnostics, bounded in size
async fn error_body(response: reqwest::Response) -> String {
    let body = response.text().await.unwrap_or_default();
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}... (truncated)", &body[..cut])
    } else {
        body
    }
}

#[async_trait::async_trait]
impl OAuthProvider for HelixClient {
    async fn request_app_token(&self) -> Result<TokenGrant> {
        tracing::debug!("Requesting app access token from {}", self.auth_url);

        let response = self
            .client
            .post(self.auth_url.clone())
            .query(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("grant_type", "client_credentials"),
            ])
            .send()
            .await
            .map_err(|e| match self.map_send_error("oauth_token", e) {
                crate::Error::Http(e) => {
                    crate::Error::upstream_auth(format!("Network request failed: {}", e))
                }
                other => other,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = error_body(response).await;
            return Err(crate::Error::upstream_auth_status(
                format!("token endpoint rejected the request: {}", body),
                status.as_u16(),
            ));
        }

        response.json::<TokenGrant>().await.map_err(|e| {
            crate::Error::upstream_auth(format!("Failed to parse token response: {}", e))
        })
    }
}

#[async_trait::async_trait]
impl StreamsProvider for HelixClient {
    async fn fetch_streams(&self, login: &ChannelKey, token: &str) -> Result<StreamsResponse> {
        let response = self
            .client
            .get(self.streams_url.clone())
            .query(&[("user_login", login.as_str())])
            .header("Client-ID", &self.client_id)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| match self.map_send_error("streams", e) {
                crate::Error::Http(e) => crate::Error::upstream_query(
                    login.as_str(),
                    format!("Network request failed: {}", e),
                ),
                other => other,
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(crate::Error::upstream_query_status(
                login.as_str(),
                "access token rejected",
                status.as_u16(),
            ));
        }
        if !status.is_success() {
            let body = error_body(response).await;
            return Err(crate::Error::upstream_query_status(
                login.as_str(),
                format!("streams endpoint returned an error: {}", body),
                status.as_u16(),
            ));
        }

        response.json::<StreamsResponse>().await.map_err(|e| {
            crate::Error::upstream_query(
                login.as_str(),
                format!("Failed to parse streams response: {}", e),
            )
        })
    }
}
