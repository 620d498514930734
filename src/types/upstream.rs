//! Twitch API payloads
//!
//! Fields are optional on purpose: a missing field is reported as an upstream
//! error by the caller instead of a generic JSON failure.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Body returned by the OAuth client-credentials grant
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct TokenGrant {
    /// App access token
    #[serde(default)]
    pub access_token: Option<String>,
    /// Token lifetime in seconds
    #[serde(default)]
    pub expires_in: Option<u64>,
    /// Token type, `bearer` in practice
    #[serde(default)]
    pub token_type: Option<String>,
}

impl TokenGrant {
    /// Create a grant as the token endpoint would return it
    pub fn new(access_token: impl Into<String>, expires_in: u64) -> Self {
        Self {
            access_token: Some(access_token.into()),
            expires_in: Some(expires_in),
            token_type: Some("bearer".to_string()),
        }
    }
}

impl fmt::Debug for TokenGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenGrant")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("expires_in", &self.expires_in)
            .field("token_type", &self.token_type)
            .finish()
    }
}

/// Body returned by `GET /helix/streams`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamsResponse {
    /// Active streams matching the filter; empty when offline
    #[serde(default)]
    pub data: Option<Vec<StreamEntry>>,
}

impl StreamsResponse {
    /// A response listing the given streams
    pub fn with_streams(data: Vec<StreamEntry>) -> Self {
        Self { data: Some(data) }
    }

    /// Non-empty `data` means the channel is live
    pub fn is_live(&self) -> bool {
        self.data.as_ref().is_some_and(|streams| !streams.is_empty())
    }
}

/// One active stream
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamEntry {
    /// Stream id
    #[serde(default)]
    pub id: String,
    /// Broadcaster login
    #[serde(default)]
    pub user_login: String,
    /// Broadcaster display name
    #[serde(default)]
    pub user_name: String,
    /// Stream type, `live` for live streams
    #[serde(default, rename = "type")]
    pub stream_type: String,
    /// Stream title
    #[serde(default)]
    pub title: String,
    /// Current viewers
    #[serde(default)]
    pub viewer_count: u64,
    /// RFC 3339 start time
    #[serde(default)]
    pub started_at: Option<String>,
}
