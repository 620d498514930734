//! Internal data structures
//!
//! Cached state owned by the token manager and the liveness cache.

use std::fmt;
use std::time::Instant;

/// App access token held by the token manager
///
/// Starts empty and already expired, so the first read always refreshes.
#[derive(Clone)]
pub struct AccessToken {
    /// Bearer token value
    pub value: String,
    /// Instant after which the token must be refreshed
    pub expires_at: Instant,
}

impl AccessToken {
    /// Create a token valid until `expires_at`
    pub fn new(value: impl Into<String>, expires_at: Instant) -> Self {
        Self {
            value: value.into(),
            expires_at,
        }
    }

    /// Placeholder token that is stale at `now`
    pub fn empty(now: Instant) -> Self {
        Self {
            value: String::new(),
            expires_at: now,
        }
    }

    /// Whether the token can be used at `now`
    pub fn is_fresh(&self, now: Instant) -> bool {
        !self.value.is_empty() && now < self.expires_at
    }
}

// The token value is a credential; keep it out of debug logs.
impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &if self.value.is_empty() { "" } else { "<redacted>" })
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Cached liveness of one channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LivenessRecord {
    /// Whether the channel was broadcasting when fetched
    pub is_live: bool,
    /// Instant after which the record is stale
    pub expires_at: Instant,
}

impl LivenessRecord {
    /// Create a new record
    pub fn new(is_live: bool, expires_at: Instant) -> Self {
        Self {
            is_live,
            expires_at,
        }
    }

    /// Whether the record may be served at `now`
    pub fn is_fresh(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Case-normalized channel login used as the cache key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelKey(String);

impl ChannelKey {
    /// Normalize a raw channel name (trimmed, lower-cased)
    pub fn new(channel: &str) -> Self {
        Self(channel.trim().to_lowercase())
    }

    /// The normalized login
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether normalization left nothing behind
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChannelKey {
    fn from(channel: &str) -> Self {
        Self::new(channel)
    }
}
