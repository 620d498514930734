//! Type definitions for the live status service
//!
//! Cached state, HTTP response bodies and Twitch API payloads.

pub mod internal;
pub mod response;
pub mod upstream;

pub use internal::{AccessToken, ChannelKey, LivenessRecord};
pub use response::{ErrorResponse, LiveStatus, PingResponse};
pub use upstream::{StreamEntry, StreamsResponse, TokenGrant};
