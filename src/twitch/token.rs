//! App access token cache
//!
//! Holds one client-credentials token for the whole process and refreshes it
//! lazily, a fixed margin before the upstream expiry. A refresh runs as its own
//! task; callers that find the token stale while it runs await the same task
//! and receive the same outcome, success or failure.

use crate::{
    Error, Result,
    error::format_error_for_logging,
    twitch::helix::OAuthProvider,
    types::{AccessToken, TokenGrant},
    utils::Clock,
};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};

/// Outcome of one refresh as seen by every waiter
type TokenRefresh = Shared<BoxFuture<'static, std::result::Result<String, Arc<Error>>>>;

/// Owner of the process-wide app access token
pub struct TokenManager {
    state: Arc<TokenState>,
}

struct TokenState {
    provider: Arc<dyn OAuthProvider>,
    clock: Arc<dyn Clock>,
    /// Subtracted from `expires_in` when storing the expiry
    refresh_margin: Duration,
    /// Current token, empty until the first refresh
    token: RwLock<AccessToken>,
    /// Refresh currently running, if any
    in_flight: Mutex<Option<TokenRefresh>>,
}

impl TokenManager {
    /// Create a manager holding no token
    pub fn new(
        provider: Arc<dyn OAuthProvider>,
        clock: Arc<dyn Clock>,
        refresh_margin: Duration,
    ) -> Self {
        let token = AccessToken::empty(clock.now());
        Self {
            state: Arc::new(TokenState {
                provider,
                clock,
                refresh_margin,
                token: RwLock::new(token),
                in_flight: Mutex::new(None),
            }),
        }
    }

    /// Return a usable token, refreshing it first if stale
    ///
    /// At most one token request is outstanding at a time. Callers arriving
    /// while it runs share its result, including its failure.
    pub async fn get_token(&self) -> Result<String> {
        if let Some(value) = self.state.fresh_value().await {
            return Ok(value);
        }

        let refresh = {
            let mut in_flight = self.state.in_flight.lock().await;

            // Another caller may have refreshed while we waited
            if let Some(value) = self.state.fresh_value().await {
                tracing::debug!("Reusing token refreshed by a concurrent caller");
                return Ok(value);
            }

            match in_flight.as_ref() {
                Some(refresh) => {
                    tracing::debug!("Joining in-flight token refresh");
                    refresh.clone()
                }
                None => {
                    let refresh = self.state.spawn_refresh();
                    *in_flight = Some(refresh.clone());
                    refresh
                }
            }
        };

        refresh.await.map_err(|err| for_waiter(&err))
    }

    /// Drop the held token so the next call refreshes
    pub async fn invalidate(&self) {
        *self.state.token.write().await = AccessToken::empty(self.state.clock.now());
        tracing::debug!("App access token invalidated");
    }

    /// Drop the held token only if it is still `rejected`
    ///
    /// Returns whether the token was dropped. A token renewed after `rejected`
    /// was handed out is kept.
    pub async fn invalidate_if(&self, rejected: &str) -> bool {
        let mut token = self.state.token.write().await;
        if token.value != rejected {
            tracing::debug!("Rejected token was already replaced, keeping the current one");
            return false;
        }
        *token = AccessToken::empty(self.state.clock.now());
        tracing::debug!("App access token invalidated after rejection");
        true
    }

    /// Expiry of the held token, `None` when there is no usable token
    pub async fn expires_at(&self) -> Option<Instant> {
        let token = self.state.token.read().await;
        token
            .is_fresh(self.state.clock.now())
            .then_some(token.expires_at)
    }
}

impl fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenManager")
            .field("provider", &self.state.provider)
            .field("refresh_margin", &self.state.refresh_margin)
            .finish_non_exhaustive()
    }
}

impl TokenState {
    async fn fresh_value(&self) -> Option<String> {
        let token = self.token.read().await;
        token
            .is_fresh(self.clock.now())
            .then(|| token.value.clone())
    }

    /// Must be called with the `in_flight` lock held
    fn spawn_refresh(self: &Arc<Self>) -> TokenRefresh {
        let state = Arc::clone(self);
        let handle = tokio::spawn(async move { state.refresh().await });
        let weak: Weak<Self> = Arc::downgrade(self);

        async move {
            match handle.await {
                Ok(outcome) => outcome,
                Err(err) => {
                    if let Some(state) = weak.upgrade() {
                        state.in_flight.lock().await.take();
                    }
                    let err = Error::internal_with_context(
                        format!("token refresh task ended abnormally: {}", err),
                        "token_refresh",
                    );
                    tracing::error!("{}", format_error_for_logging(&err));
                    Err(Arc::new(err))
                }
            }
        }
        .boxed()
        .shared()
    }

    async fn refresh(&self) -> std::result::Result<String, Arc<Error>> {
        let outcome = AssertUnwindSafe(self.request())
            .catch_unwind()
            .await
            .unwrap_or_else(|_| Err(Error::internal("token request panicked")));

        // The slot is cleared and the token stored under the same lock, so no
        // caller can see an empty slot next to a stale token.
        let mut in_flight = self.in_flight.lock().await;
        let outcome = match outcome {
            Ok((value, expires_at)) => {
                *self.token.write().await = AccessToken::new(value.clone(), expires_at);
                Ok(value)
            }
            Err(err) => {
                tracing::warn!(
                    "App access token refresh failed: {}",
                    format_error_for_logging(&err)
                );
                Err(Arc::new(err))
            }
        };
        in_flight.take();
        outcome
    }

    async fn request(&self) -> Result<(String, Instant)> {
        tracing::debug!("App access token is stale, requesting a new one");
        let grant = self.provider.request_app_token().await?;
        let (value, lifetime) = validate_grant(grant)?;

        let usable_for = lifetime.saturating_sub(self.refresh_margin);
        let expires_at = self
            .clock
            .now()
            .checked_add(usable_for)
            .ok_or_else(|| Error::upstream_auth("token expires_in is out of range"))?;

        tracing::info!(
            "Obtained app access token, refreshing in {}s",
            usable_for.as_secs()
        );
        Ok((value, expires_at))
    }
}

fn validate_grant(grant: TokenGrant) -> Result<(String, Duration)> {
    let value = match grant.access_token {
        Some(value) if !value.is_empty() => value,
        _ => {
            return Err(Error::upstream_auth("token response has no access_token"));
        }
    };
    let expires_in = grant
        .expires_in
        .ok_or_else(|| Error::upstream_auth("token response has no expires_in"))?;

    Ok((value, Duration::from_secs(expires_in)))
}

/// Rebuild a shared refresh failure for one waiter
///
/// Auth and timeout failures keep their shape; anything else becomes an auth
/// failure carrying the original message and upstream status.
fn for_waiter(err: &Error) -> Error {
    match err {
        Error::UpstreamAuth { reason, status } => Error::UpstreamAuth {
            reason: reason.clone(),
            status: *status,
        },
        Error::Timeout {
            operation,
            duration_secs,
        } => Error::timeout(operation.clone(), *duration_secs),
        other => Error::UpstreamAuth {
            reason: other.to_string(),
            status: other.upstream_status(),
        },
    }
}
