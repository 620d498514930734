//! Response type definitions
//!
//! Bodies returned by the HTTP endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Plain-text status reported by `/status`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LiveStatus {
    /// Channel is broadcasting
    Live,
    /// Channel is not broadcasting, or its status could not be determined
    Offline,
}

impl LiveStatus {
    /// Body text for the status endpoint
    pub fn as_str(&self) -> &'static str {
        match self {
            LiveStatus::Live => "LIVE",
            LiveStatus::Offline => "OFFLINE",
        }
    }
}

impl From<bool> for LiveStatus {
    fn from(is_live: bool) -> Self {
        if is_live {
            LiveStatus::Live
        } else {
            LiveStatus::Offline
        }
    }
}

impl fmt::Display for LiveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ping response for health checks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PingResponse {
    /// Server uptime in seconds
    pub server_uptime: u64,

    /// Server version
    pub version: String,
}

impl PingResponse {
    /// Create a new ping response
    pub fn new(server_uptime: u64, version: impl Into<String>) -> Self {
        Self {
            server_uptime,
            version: version.into(),
        }
    }
}

/// Error response for API errors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,

    /// Optional error context
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    /// Error timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,

    /// Service version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl ErrorResponse {
    /// Create a new error response
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            context: None,
            timestamp: Some(Utc::now()),
            version: Some(crate::utils::version::get_version().to_string()),
        }
    }

    /// Create error response with context
    pub fn with_context(error: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            context: Some(context.into()),
            ..Self::new(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_live_status_from_bool() {
        assert_eq!(LiveStatus::from(true), LiveStatus::Live);
        assert_eq!(LiveStatus::from(false), LiveStatus::Offline);
    }

    #[test]
    fn test_live_status_text() {
        assert_eq!(LiveStatus::Live.as_str(), "LIVE");
        assert_eq!(LiveStatus::Offline.to_string(), "OFFLINE");
        assert_eq!(
            serde_json::to_string(&LiveStatus::Offline).unwrap(),
            "\"OFFLINE\""
        );
    }

    #[test]
    fn test_ping_response_serialization() {
        let response = PingResponse::new(42, "0.1.0");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["server_uptime"], 42);
        assert_eq!(json["version"], "0.1.0");
    }

    #[test]
    fn test_error_response_with_context() {
        let response = ErrorResponse::with_context("Not found", "routing");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["error"], "Not found");
        assert_eq!(json["context"], "routing");
        assert!(json["timestamp"].is_string());
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_error_response_omits_missing_context() {
        let response = ErrorResponse::new("boom");
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("context").is_none());
    }
}
