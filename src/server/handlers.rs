//! HTTP request handlers
//!
//! Status endpoints always answer `200` with a plain-text `LIVE` or `OFFLINE`;
//! upstream trouble is absorbed by the liveness cache.

use crate::{
    server::app::AppState,
    types::{LiveStatus, PingResponse},
    utils::version,
};
use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

fn status_response(status: LiveStatus) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        status.as_str(),
    )
        .into_response()
}

/// Liveness of an arbitrary channel
///
/// GET /status/{channel}
pub async fn channel_status(
    State(state): State<AppState>,
    Path(channel): Path<String>,
) -> Response {
    let status = LiveStatus::from(state.liveness.get_liveness(&channel).await);
    tracing::debug!("Status for {}: {}", channel, status);
    status_response(status)
}

/// Liveness of the configured channel
///
/// GET /status
pub async fn default_channel_status(State(state): State<AppState>) -> Response {
    let Some(channel) = state.settings.default_channel() else {
        return status_response(LiveStatus::Offline);
    };

    let status = LiveStatus::from(state.liveness.get_liveness(channel).await);
    tracing::debug!("Status for configured channel {}: {}", channel, status);
    status_response(status)
}

/// Ping endpoint for health checks
///
/// GET /ping
///
/// Returns server status and uptime information.
pub async fn ping(State(state): State<AppState>) -> Json<PingResponse> {
    let uptime = state.start_time.elapsed().as_secs();
    let response = PingResponse::new(uptime, version::get_version());

    tracing::debug!(
        "Ping response: uptime={}s, version={}",
        uptime,
        version::get_version()
    );
    Json(response)
}

/// Invalidate caches endpoint
///
/// POST /invalidate_caches
///
/// Drops every liveness record and the held access token.
pub async fn invalidate_caches(State(state): State<AppState>) -> StatusCode {
    tracing::info!("Invalidating all caches");
    state.liveness.invalidate_all().await;
    state.tokens.invalidate().await;
    StatusCode::NO_CONTENT
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        Result,
        config::Settings,
        twitch::{OAuthProvider, StreamsProvider},
        types::{ChannelKey, StreamEntry, StreamsResponse, TokenGrant},
        utils::ManualClock,
    };
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct FakeTwitch {
        live: Vec<&'static str>,
        fail: bool,
        token_calls: AtomicUsize,
        stream_calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl OAuthProvider for FakeTwitch {
        async fn request_app_token(&self) -> Result<TokenGrant> {
            self.token_calls.fetch_add(1, Ordering::SeqCst);
            Ok(TokenGrant::new("token", 3600))
        }
    }

    #[async_trait::async_trait]
    impl StreamsProvider for FakeTwitch {
        async fn fetch_streams(&self, login: &ChannelKey, _token: &str) -> Result<StreamsResponse> {
            self.stream_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(crate::Error::upstream_query(login.as_str(), "boom"));
            }
            let data = if self.live.iter().any(|live| *live == login.as_str()) {
                vec![StreamEntry {
                    user_login: login.to_string(),
                    ..Default::default()
                }]
            } else {
                Vec::new()
            };
            Ok(StreamsResponse::with_streams(data))
        }
    }

    fn create_test_state(twitch: Arc<FakeTwitch>, channel: Option<&str>) -> AppState {
        let mut settings = Settings::default();
        settings.twitch.channel = channel.map(str::to_string);
        AppState::new(
            settings,
            twitch.clone(),
            twitch,
            Arc::new(ManualClock::new()),
        )
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_channel_status_live() {
        let twitch = Arc::new(FakeTwitch {
            live: vec!["shroud"],
            ..Default::default()
        });
        let state = create_test_state(twitch, None);

        let response = channel_status(State(state), Path("Shroud".to_string())).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
        assert_eq!(body_text(response).await, "LIVE");
    }

    #[tokio::test]
    async fn test_channel_status_offline() {
        let state = create_test_state(Arc::new(FakeTwitch::default()), None);

        let response = channel_status(State(state), Path("xqc".to_string())).await;
        assert_eq!(body_text(response).await, "OFFLINE");
    }

    #[tokio::test]
    async fn test_channel_status_upstream_failure_is_offline() {
        let twitch = Arc::new(FakeTwitch {
            live: vec!["shroud"],
            fail: true,
            ..Default::default()
        });
        let state = create_test_state(twitch, None);

        let response = channel_status(State(state), Path("shroud".to_string())).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "OFFLINE");
    }

    #[tokio::test]
    async fn test_default_channel_status() {
        let twitch = Arc::new(FakeTwitch {
            live: vec!["shroud"],
            ..Default::default()
        });
        let state = create_test_state(twitch, Some("Shroud"));

        let response = default_channel_status(State(state)).await;
        assert_eq!(body_text(response).await, "LIVE");
    }

    #[tokio::test]
    async fn test_default_channel_unset_is_offline() {
        let twitch = Arc::new(FakeTwitch::default());
        let state = create_test_state(twitch.clone(), None);

        let response = default_channel_status(State(state)).await;
        assert_eq!(body_text(response).await, "OFFLINE");
        assert_eq!(twitch.stream_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_ping_handler() {
        let state = create_test_state(Arc::new(FakeTwitch::default()), None);
        let response = ping(State(state)).await;

        assert_eq!(response.0.version, version::get_version());
    }

    #[tokio::test]
    async fn test_invalidate_caches_handler() {
        let twitch = Arc::new(FakeTwitch {
            live: vec!["shroud"],
            ..Default::default()
        });
        let state = create_test_state(twitch.clone(), None);

        state.liveness.get_liveness("shroud").await;
        assert_eq!(state.liveness.cached_channels().await.len(), 1);

        let status = invalidate_caches(State(state.clone())).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(state.liveness.cached_channels().await.is_empty());
        assert!(state.tokens.expires_at().await.is_none());

        state.liveness.get_liveness("shroud").await;
        assert_eq!(twitch.stream_calls.load(Ordering::SeqCst), 2);
        assert_eq!(twitch.token_calls.load(Ordering::SeqCst), 2);
    }
}
