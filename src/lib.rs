//! Twitch live-status service
//!
//! Answers "is this channel live right now?" over HTTP with a plain-text
//! `LIVE` or `OFFLINE`, backed by the Twitch Helix API.
//!
//! # Architecture
//!
//! - [`twitch::TokenManager`] holds one app access token obtained with the
//!   client-credentials grant and renews it shortly before it expires.
//! - [`twitch::LivenessCache`] keeps a short-lived record per channel and
//!   collapses concurrent refreshes of the same channel into one upstream call.
//! - [`server`] exposes both through Axum; [`cli`] wires configuration,
//!   logging and the listener together.
//!
//! # Example
//!
//! ```rust
//! use twitch_live_status::{Settings, server::create_app};
//!
//! let mut settings = Settings::default();
//! settings.twitch.client_id = "client-id".to_string();
//! settings.twitch.client_secret = "client-secret".to_string();
//! let app = create_app(settings)?;
//! # let _ = app;
//! # Ok::<(), twitch_live_status::Error>(())
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod server;
pub mod twitch;
pub mod types;
pub mod utils;

pub use config::{ConfigLoader, Settings};
pub use error::{Error, Result};
pub use twitch::{LivenessCache, TokenManager};
pub use types::{ErrorResponse, LiveStatus, PingResponse};
