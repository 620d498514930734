//! Error types for the live status service
//!
//! Upstream failures are split by which Twitch endpoint produced them so the
//! liveness boundary can log them distinctly before degrading to OFFLINE.

use thiserror::Error;

/// Main error type for the application
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML configuration parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing errors
    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// OAuth token endpoint failed or returned an unusable token
    #[error("Upstream auth failed: {reason}")]
    UpstreamAuth {
        /// What went wrong
        reason: String,
        /// HTTP status returned by the token endpoint, if any
        status: Option<u16>,
    },

    /// Streams endpoint failed or returned a malformed body
    #[error("Upstream query for '{channel}' failed: {reason}")]
    UpstreamQuery {
        /// Channel login that was queried
        channel: String,
        /// What went wrong
        reason: String,
        /// HTTP status returned by the streams endpoint, if any
        status: Option<u16>,
    },

    /// Required configuration missing or invalid
    #[error("Configuration error in {field}: {message}")]
    MalformedConfig {
        /// The configuration field that has an error
        field: String,
        /// Error message describing the issue
        message: String,
    },

    /// Outbound call exceeded its deadline
    #[error("Operation timed out after {duration_secs} seconds: {operation}")]
    Timeout {
        /// The operation that timed out
        operation: String,
        /// Duration in seconds before timing out
        duration_secs: u64,
    },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal {
        /// Error message describing the internal issue
        message: String,
        /// Additional context about where the error occurred
        context: Option<String>,
    },
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an upstream auth error
    pub fn upstream_auth(reason: impl Into<String>) -> Self {
        Self::UpstreamAuth {
            reason: reason.into(),
            status: None,
        }
    }

    /// Create an upstream auth error carrying the HTTP status
    pub fn upstream_auth_status(reason: impl Into<String>, status: u16) -> Self {
        Self::UpstreamAuth {
            reason: reason.into(),
            status: Some(status),
        }
    }

    /// Create an upstream query error
    pub fn upstream_query(channel: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UpstreamQuery {
            channel: channel.into(),
            reason: reason.into(),
            status: None,
        }
    }

    /// Create an upstream query error carrying the HTTP status
    pub fn upstream_query_status(
        channel: impl Into<String>,
        reason: impl Into<String>,
        status: u16,
    ) -> Self {
        Self::UpstreamQuery {
            channel: channel.into(),
            reason: reason.into(),
            status: Some(status),
        }
    }

    /// Create a configuration error
    pub fn config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedConfig {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, duration_secs: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration_secs,
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            context: None,
        }
    }

    /// Create an internal error with context
    pub fn internal_with_context(message: impl Into<String>, context: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            context: Some(context.into()),
        }
    }

    /// Short category label used in structured logs
    pub fn category(&self) -> &'static str {
        match self {
            Error::Http(_) => "http",
            Error::Json(_) => "json",
            Error::Toml(_) | Error::MalformedConfig { .. } => "config",
            Error::Url(_) => "url",
            Error::Io(_) => "io",
            Error::UpstreamAuth { .. } => "upstream_auth",
            Error::UpstreamQuery { .. } => "upstream_query",
            Error::Timeout { .. } => "timeout",
            Error::Internal { .. } => "internal",
        }
    }

    /// Whether a later attempt could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Error::Timeout { .. } => true,
            Error::UpstreamAuth { status, .. } | Error::UpstreamQuery { status, .. } => {
                matches!(status, None | Some(401) | Some(429) | Some(500..=599))
            }
            _ => false,
        }
    }

    /// HTTP status reported by the upstream, when the failure carried one
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Error::UpstreamAuth { status, .. } | Error::UpstreamQuery { status, .. } => *status,
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
