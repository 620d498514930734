//! Common test utilities and helpers
//!
//! Builds settings that point at a wiremock server standing in for Twitch.

#![allow(dead_code)]

use axum::{Router, body::Body, http::Request, http::StatusCode};
use std::time::Duration;
use tower::ServiceExt;
use twitch_live_status::config::Settings;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const CLIENT_ID: &str = "integration-client";
pub const CLIENT_SECRET: &str = "integration-secret";

/// Settings whose upstream URLs point at `server`
pub fn settings_for(server: &MockServer, channel: Option<&str>) -> Settings {
    let mut settings = Settings::default();
    settings.twitch.client_id = CLIENT_ID.to_string();
    settings.twitch.client_secret = CLIENT_SECRET.to_string();
    settings.twitch.channel = channel.map(str::to_string);
    settings.twitch.auth_url = format!("{}/oauth2/token", server.uri());
    settings.twitch.api_url = format!("{}/helix", server.uri());
    settings
}

/// Token endpoint handing out a one hour token, expected `calls` times
pub async fn mount_token(server: &MockServer, calls: u64) {
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(query_param("grant_type", "client_credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "integration-token",
            "expires_in": 3600,
            "token_type": "bearer"
        })))
        .expect(calls)
        .mount(server)
        .await;
}

/// Streams response body for `login`
pub fn streams_body(login: &str, live: bool) -> serde_json::Value {
    if live {
        serde_json::json!({
            "data": [{
                "id": "40952121085",
                "user_login": login,
                "user_name": login,
                "type": "live",
                "title": "integration stream",
                "viewer_count": 78365,
                "started_at": "2021-03-10T15:04:21Z"
            }],
            "pagination": {}
        })
    } else {
        serde_json::json!({ "data": [], "pagination": {} })
    }
}

/// Streams endpoint for `login`, expected `calls` times
pub async fn mount_streams(server: &MockServer, login: &str, live: bool, calls: u64) {
    mount_streams_delayed(server, login, live, calls, Duration::ZERO).await;
}

/// Streams endpoint that answers after `delay`
pub async fn mount_streams_delayed(
    server: &MockServer,
    login: &str,
    live: bool,
    calls: u64,
    delay: Duration,
) {
    Mock::given(method("GET"))
        .and(path("/helix/streams"))
        .and(query_param("user_login", login))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(streams_body(login, live))
                .set_delay(delay),
        )
        .expect(calls)
        .mount(server)
        .await;
}

/// Send a request and collect status and body text
pub async fn send(app: Router, method: &str, uri: &str) -> (StatusCode, String) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}
