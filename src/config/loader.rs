//! Configuration loading utilities
//!
//! Resolves the config file location and layers file, environment and
//! defaults into validated [`Settings`].

use crate::{Result, config::Settings};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "TWITCH_STATUS_CONFIG";

/// Configuration loader with multiple source support
#[derive(Debug)]
pub struct ConfigLoader {
    /// Default settings
    defaults: Settings,
}

impl ConfigLoader {
    /// Create new configuration loader
    pub fn new() -> Self {
        Self {
            defaults: Settings::default(),
        }
    }

    /// Load a `.env` file from the working directory, if present
    ///
    /// Must run before any environment lookups so its values act as defaults
    /// for the real environment.
    pub fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    /// Get the config file path from the environment or the default location
    ///
    /// Priority:
    /// 1. TWITCH_STATUS_CONFIG environment variable
    /// 2. ~/.config/twitch-live-status/config.toml (or platform equivalent)
    pub fn get_config_path() -> Option<PathBuf> {
        if let Ok(config_path) = std::env::var(CONFIG_ENV_VAR) {
            let path = PathBuf::from(config_path);
            if path.exists() {
                debug!("Using config file from {}: {:?}", CONFIG_ENV_VAR, path);
                return Some(path);
            }
            warn!("{} points to non-existent file: {:?}", CONFIG_ENV_VAR, path);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let default_path = config_dir.join("twitch-live-status").join("config.toml");
            if default_path.exists() {
                debug!("Using default config file: {:?}", default_path);
                return Some(default_path);
            }
        }

        debug!("No config file found");
        None
    }

    /// Load configuration without validating it
    ///
    /// Precedence, lowest first: defaults, configuration file, environment.
    /// Command line overrides are applied by the caller before [`Settings::validate`].
    pub fn load_unvalidated(&self, config_file: Option<&Path>) -> Result<Settings> {
        let mut settings = self.defaults.clone();

        if let Some(path) = config_file {
            if path.exists() {
                info!("Loading configuration from file: {:?}", path);
                settings = Settings::from_file(path)?;
            } else {
                warn!("Configuration file not found: {:?}, using defaults", path);
            }
        }

        debug!("Applying environment variable overrides");
        settings.merge_with_env()
    }

    /// Load and validate configuration
    pub fn load(&self, config_file: Option<&Path>) -> Result<Settings> {
        let settings = self.load_unvalidated(config_file)?;
        settings.validate()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:?}", settings);

        Ok(settings)
    }

    /// Load configuration from environment only
    pub fn from_env_only(&self) -> Result<Settings> {
        let settings = Settings::from_env()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Get default configuration
    pub fn defaults(&self) -> &Settings {
        &self.defaults
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
