//! Axum application setup
//!
//! Creates and configures the Axum application with routes and middleware.

use crate::{
    Result,
    config::Settings,
    twitch::{HelixClient, LivenessCache, OAuthProvider, StreamsProvider, TokenManager},
    utils::{Clock, SystemClock},
};
use axum::{
    Json, Router,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use std::sync::Arc;
use std::time::Instant;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Application state shared across handlers
#[derive(Debug, Clone)]
pub struct AppState {
    /// Per-channel liveness cache
    pub liveness: LivenessCache,
    /// App access token shared by all upstream calls
    pub tokens: Arc<TokenManager>,
    /// Application settings
    pub settings: Arc<Settings>,
    /// Server start time for uptime calculation
    pub start_time: Instant,
}

impl AppState {
    /// Wire the caches to the given providers
    pub fn new(
        settings: Settings,
        oauth: Arc<dyn OAuthProvider>,
        streams: Arc<dyn StreamsProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let tokens = Arc::new(TokenManager::new(
            oauth,
            Arc::clone(&clock),
            settings.token_refresh_margin(),
        ));
        let liveness = LivenessCache::new(
            Arc::clone(&tokens),
            streams,
            clock,
            settings.liveness_ttl(),
        );

        Self {
            liveness,
            tokens,
            settings: Arc::new(settings),
            start_time: Instant::now(),
        }
    }

    /// State backed by the real Twitch API
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let client = Arc::new(HelixClient::new(&settings)?);
        Ok(Self::new(
            settings,
            client.clone(),
            client,
            Arc::new(SystemClock),
        ))
    }
}

/// Create the main Axum application with routes and middleware
pub fn create_app(settings: Settings) -> Result<Router> {
    Ok(create_app_with_state(AppState::from_settings(settings)?))
}

/// Build the router around an existing state
///
/// `GET /status` is only mounted when a default channel is configured.
pub fn create_app_with_state(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/status/{channel}", get(super::handlers::channel_status))
        .route("/ping", get(super::handlers::ping))
        .route(
            "/invalidate_caches",
            post(super::handlers::invalidate_caches),
        );

    if let Some(channel) = state.settings.default_channel() {
        tracing::info!("Serving /status for configured channel {}", channel);
        router = router.route("/status", get(super::handlers::default_channel_status));
    }

    let router = router.fallback(not_found).layer(TraceLayer::new_for_http());

    let router = if state.settings.server.enable_cors {
        router.layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
    } else {
        router
    };

    router.with_state(state)
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(crate::types::ErrorResponse::with_context(
            "Not found",
            "routing",
        )),
    )
}
