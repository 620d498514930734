//! Twitch integration
//!
//! [`HelixClient`] performs the upstream calls, [`TokenManager`] caches the app
//! access token and [`LivenessCache`] caches per-channel liveness on top of both.

pub mod helix;
pub mod liveness;
pub mod token;

pub use helix::{HelixClient, OAuthProvider, StreamsProvider};
pub use liveness::LivenessCache;
pub use token::TokenManager;
