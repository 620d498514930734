//! Configuration settings
//!
//! Settings are assembled from defaults, an optional TOML file, environment
//! variables and finally command-line overrides.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

pub const DEFAULT_AUTH_URL: &str = "https://id.twitch.tv/oauth2/token";
pub const DEFAULT_API_URL: &str = "https://api.twitch.tv/helix";

/// Upper bound for `cache.liveness_ttl_secs`
pub const MAX_LIVENESS_TTL_SECS: u64 = 86_400;
/// Upper bound for `cache.token_refresh_margin_secs`
pub const MAX_TOKEN_REFRESH_MARGIN_SECS: u64 = 86_400;

// Helper functions for serde defaults
fn default_true() -> bool {
    true
}

fn default_host() -> String {
    "::".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_auth_url() -> String {
    DEFAULT_AUTH_URL.to_string()
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_liveness_ttl() -> u64 {
    15
}

fn default_token_refresh_margin() -> u64 {
    300 // renew five minutes early
}

fn default_connect_timeout() -> u64 {
    5
}

fn default_request_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    format!("twitch-live-status/{}", env!("CARGO_PKG_VERSION"))
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Main configuration settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerSettings,
    /// Twitch credentials and endpoints
    #[serde(default)]
    pub twitch: TwitchSettings,
    /// Cache lifetimes
    #[serde(default)]
    pub cache: CacheSettings,
    /// Outbound HTTP client configuration
    #[serde(default)]
    pub network: NetworkSettings,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,
    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Enable permissive CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,
}

/// Twitch application credentials and endpoints
#[derive(Clone, Serialize, Deserialize)]
pub struct TwitchSettings {
    /// OAuth client id
    #[serde(default)]
    pub client_id: String,
    /// OAuth client secret
    #[serde(default)]
    pub client_secret: String,
    /// Channel served by `GET /status`
    #[serde(default)]
    pub channel: Option<String>,
    /// OAuth token endpoint
    #[serde(default = "default_auth_url")]
    pub auth_url: String,
    /// Helix API base URL
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

/// Cache lifetimes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    /// How long a liveness record is served, in seconds
    #[serde(default = "default_liveness_ttl")]
    pub liveness_ttl_secs: u64,
    /// How long before reported expiry the token is renewed, in seconds
    #[serde(default = "default_token_refresh_margin")]
    pub token_refresh_margin_secs: u64,
}

/// Outbound HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSettings {
    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,
    /// Whole-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
    /// User agent string
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable verbose logging
    #[serde(default)]
    pub verbose: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            enable_cors: default_true(),
        }
    }
}

impl Default for TwitchSettings {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            channel: None,
            auth_url: default_auth_url(),
            api_url: default_api_url(),
        }
    }
}

impl fmt::Debug for TwitchSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secret = if self.client_secret.is_empty() {
            ""
        } else {
            "<redacted>"
        };
        f.debug_struct("TwitchSettings")
            .field("client_id", &self.client_id)
            .field("client_secret", &secret)
            .field("channel", &self.channel)
            .field("auth_url", &self.auth_url)
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            liveness_ttl_secs: default_liveness_ttl(),
            token_refresh_margin_secs: default_token_refresh_margin(),
        }
    }
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            connect_timeout: default_connect_timeout(),
            request_timeout: default_request_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            verbose: false,
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, field: &str) -> crate::Result<Option<T>>
where
    T::Err: fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| crate::Error::config(field, format!("Invalid {}: {}", name, e))),
        Err(_) => Ok(None),
    }
}

impl Settings {
    /// Create new settings with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from environment variables on top of defaults
    pub fn from_env() -> crate::Result<Self> {
        Self::default().merge_with_env()
    }

    /// Load settings from configuration file
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;

        Ok(settings)
    }

    /// Apply environment variable overrides; unset variables leave values untouched
    pub fn merge_with_env(mut self) -> crate::Result<Self> {
        if let Ok(host) = std::env::var("LISTEN_HOST") {
            self.server.host = host;
        }
        if let Some(port) = parse_env("PORT", "port")? {
            self.server.port = port;
        }

        if let Ok(client_id) = std::env::var("TWITCH_CLIENT_ID") {
            self.twitch.client_id = client_id;
        }
        if let Ok(client_secret) = std::env::var("TWITCH_CLIENT_SECRET") {
            self.twitch.client_secret = client_secret;
        }
        if let Ok(channel) = std::env::var("TWITCH_CHANNEL") {
            self.twitch.channel = Some(channel);
        }
        if let Ok(auth_url) = std::env::var("TWITCH_AUTH_URL") {
            self.twitch.auth_url = auth_url;
        }
        if let Ok(api_url) = std::env::var("TWITCH_API_URL") {
            self.twitch.api_url = api_url;
        }

        if let Some(ttl) = parse_env("LIVENESS_TTL", "liveness_ttl_secs")? {
            self.cache.liveness_ttl_secs = ttl;
        }
        if let Some(timeout) = parse_env("REQUEST_TIMEOUT", "request_timeout")? {
            self.network.request_timeout = timeout;
        }

        if let Ok(level) = std::env::var("LOG_LEVEL") {
            self.logging.level = level;
        }

        Ok(self)
    }

    /// Configured single channel, ignoring blank values
    pub fn default_channel(&self) -> Option<&str> {
        self.twitch
            .channel
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    /// Liveness record lifetime
    pub fn liveness_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.liveness_ttl_secs)
    }

    /// Token renewal margin
    pub fn token_refresh_margin(&self) -> Duration {
        Duration::from_secs(self.cache.token_refresh_margin_secs)
    }

    /// Validate configuration settings
    pub fn validate(&self) -> crate::Result<()> {
        if self.twitch.client_id.trim().is_empty() {
            return Err(crate::Error::config(
                "client_id",
                "TWITCH_CLIENT_ID is required",
            ));
        }

        if self.twitch.client_secret.trim().is_empty() {
            return Err(crate::Error::config(
                "client_secret",
                "TWITCH_CLIENT_SECRET is required",
            ));
        }

        if self.server.port == 0 {
            return Err(crate::Error::config(
                "port",
                "Invalid server port: cannot be 0",
            ));
        }

        if self.cache.liveness_ttl_secs == 0 {
            return Err(crate::Error::config(
                "liveness_ttl_secs",
                "Invalid liveness TTL: cannot be 0",
            ));
        }

        if self.cache.liveness_ttl_secs > MAX_LIVENESS_TTL_SECS {
            return Err(crate::Error::config(
                "liveness_ttl_secs",
                format!(
                    "Invalid liveness TTL: {}s exceeds {}s",
                    self.cache.liveness_ttl_secs, MAX_LIVENESS_TTL_SECS
                ),
            ));
        }

        if self.cache.token_refresh_margin_secs > MAX_TOKEN_REFRESH_MARGIN_SECS {
            return Err(crate::Error::config(
                "token_refresh_margin_secs",
                format!(
                    "Invalid token refresh margin: {}s exceeds {}s",
                    self.cache.token_refresh_margin_secs, MAX_TOKEN_REFRESH_MARGIN_SECS
                ),
            ));
        }

        if self.network.request_timeout == 0 {
            return Err(crate::Error::config(
                "request_timeout",
                "Invalid request timeout: cannot be 0",
            ));
        }

        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(crate::Error::config(
                    "log_level",
                    format!("Invalid log level: {}", self.logging.level),
                ));
            }
        }

        for (name, endpoint) in [
            ("auth_url", &self.twitch.auth_url),
            ("api_url", &self.twitch.api_url),
        ] {
            if let Err(e) = url::Url::parse(endpoint) {
                return Err(crate::Error::config(
                    name,
                    format!("Invalid URL '{}': {}", endpoint, e),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ENV_TEST_MUTEX;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn valid_settings() -> Settings {
        let mut settings = Settings::default();
        settings.twitch.client_id = "client".to_string();
        settings.twitch.client_secret = "secret".to_string();
        settings
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.server.host, "::");
        assert_eq!(settings.server.port, 3000);
        assert_eq!(settings.cache.liveness_ttl_secs, 15);
        assert_eq!(settings.cache.token_refresh_margin_secs, 300);
        assert_eq!(settings.twitch.auth_url, DEFAULT_AUTH_URL);
        assert_eq!(settings.twitch.api_url, DEFAULT_API_URL);
        assert!(settings.twitch.channel.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[server]
host = "127.0.0.1"
port = 8080

[twitch]
client_id = "abc"
client_secret = "def"
channel = "Shroud"

[cache]
liveness_ttl_secs = 30
        "#
        )
        .unwrap();

        let settings = Settings::from_file(temp_file.path()).unwrap();
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.twitch.client_id, "abc");
        assert_eq!(settings.default_channel(), Some("Shroud"));
        assert_eq!(settings.liveness_ttl(), Duration::from_secs(30));
        // Unspecified sections keep their defaults
        assert_eq!(settings.network.request_timeout, 10);
    }

    #[test]
    fn test_env_var_override() {
        let _lock = ENV_TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());

        unsafe {
            std::env::set_var("TWITCH_CLIENT_ID", "env-client");
            std::env::set_var("PORT", "9000");
        }

        let settings = Settings::from_env().unwrap();
        assert_eq!(settings.twitch.client_id, "env-client");
        assert_eq!(settings.server.port, 9000);

        unsafe {
            std::env::remove_var("TWITCH_CLIENT_ID");
            std::env::remove_var("PORT");
        }
    }

    #[test]
    fn test_invalid_env_port() {
        let _lock = ENV_TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());

        unsafe {
            std::env::set_var("PORT", "not-a-port");
        }

        let result = Settings::from_env();
        assert!(matches!(
            result,
            Err(crate::Error::MalformedConfig { ref field, .. }) if field == "port"
        ));

        unsafe {
            std::env::remove_var("PORT");
        }
    }

    #[test]
    fn test_blank_channel_is_ignored() {
        let mut settings = Settings::default();
        settings.twitch.channel = Some("   ".to_string());
        assert_eq!(settings.default_channel(), None);
    }

    #[test]
    fn test_validation_success() {
        assert!(valid_settings().validate().is_ok());
    }

    #[test]
    fn test_validation_missing_credentials() {
        let settings = Settings::default();
        let err = settings.validate().unwrap_err();
        assert!(matches!(err, crate::Error::MalformedConfig { ref field, .. } if field == "client_id"));

        let mut settings = valid_settings();
        settings.twitch.client_secret = " ".to_string();
        let err = settings.validate().unwrap_err();
        assert!(matches!(err, crate::Error::MalformedConfig { ref field, .. } if field == "client_secret"));
    }

    #[test]
    fn test_validation_invalid_port() {
        let mut settings = valid_settings();
        settings.server.port = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validation_zero_ttl() {
        let mut settings = valid_settings();
        settings.cache.liveness_ttl_secs = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validation_ttl_upper_bound() {
        let mut settings = valid_settings();
        settings.cache.liveness_ttl_secs = MAX_LIVENESS_TTL_SECS;
        assert!(settings.validate().is_ok());

        settings.cache.liveness_ttl_secs = u64::MAX;
        let err = settings.validate().unwrap_err();
        assert!(
            matches!(err, crate::Error::MalformedConfig { ref field, .. } if field == "liveness_ttl_secs")
        );
    }

    #[test]
    fn test_validation_refresh_margin_upper_bound() {
        let mut settings = valid_settings();
        settings.cache.token_refresh_margin_secs = u64::MAX;
        let err = settings.validate().unwrap_err();
        assert!(
            matches!(err, crate::Error::MalformedConfig { ref field, .. } if field == "token_refresh_margin_secs")
        );
    }

    #[test]
    fn test_validation_invalid_url() {
        let mut settings = valid_settings();
        settings.twitch.api_url = "not a url".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validation_invalid_log_level() {
        let mut settings = valid_settings();
        settings.logging.level = "loud".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let settings = valid_settings();
        let debug = format!("{:?}", settings);
        assert!(debug.contains("client"));
        assert!(!debug.contains("\"secret\""));
        assert!(debug.contains("<redacted>"));
    }
}
