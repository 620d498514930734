//! Per-channel liveness cache
//!
//! Records live for a short TTL. A stale or missing record is refreshed by one
//! spawned task per channel; every caller that arrives while it runs awaits the
//! same task instead of issuing its own upstream request. Upstream failures are
//! logged and reported as offline, and leave the cache untouched.

use crate::{
    Result,
    error::format_error_for_logging,
    twitch::{helix::StreamsProvider, token::TokenManager},
    types::{ChannelKey, LivenessRecord},
    utils::Clock,
};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

/// Result of one refresh; `None` when the upstream call failed
type RefreshFuture = Shared<BoxFuture<'static, Option<bool>>>;

/// Liveness cache shared by all request handlers
#[derive(Clone)]
pub struct LivenessCache {
    inner: Arc<Inner>,
}

struct Inner {
    tokens: Arc<TokenManager>,
    streams: Arc<dyn StreamsProvider>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    records: RwLock<HashMap<ChannelKey, LivenessRecord>>,
    in_flight: Mutex<HashMap<ChannelKey, RefreshFuture>>,
}

impl LivenessCache {
    /// Create an empty cache
    pub fn new(
        tokens: Arc<TokenManager>,
        streams: Arc<dyn StreamsProvider>,
        clock: Arc<dyn Clock>,
        ttl: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                tokens,
                streams,
                clock,
                ttl,
                records: RwLock::new(HashMap::new()),
                in_flight: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Whether `channel` is broadcasting
    ///
    /// Never fails: an upstream error, or a name that normalizes to nothing,
    /// reads as offline.
    pub async fn get_liveness(&self, channel: &str) -> bool {
        let key = ChannelKey::new(channel);
        if key.is_empty() {
            tracing::debug!("Empty channel name, reporting offline");
            return false;
        }

        if let Some(is_live) = self.inner.fresh(&key).await {
            tracing::debug!("Liveness cache hit for {}", key);
            return is_live;
        }

        let refresh = {
            let mut in_flight = self.inner.in_flight.lock().await;

            // A refresh may have finished between the first check and taking the lock
            if let Some(is_live) = self.inner.fresh(&key).await {
                return is_live;
            }

            match in_flight.get(&key) {
                Some(refresh) => {
                    tracing::debug!("Joining in-flight refresh for {}", key);
                    refresh.clone()
                }
                None => {
                    let refresh = self.inner.spawn_refresh(key.clone());
                    in_flight.insert(key, refresh.clone());
                    refresh
                }
            }
        };

        refresh.await.unwrap_or(false)
    }

    /// Drop every record
    pub async fn invalidate_all(&self) {
        let mut records = self.inner.records.write().await;
        let dropped = records.len();
        records.clear();
        tracing::info!("Liveness cache cleared ({} records dropped)", dropped);
    }

    /// Channels with a fresh record, sorted
    pub async fn cached_channels(&self) -> Vec<ChannelKey> {
        let now = self.inner.clock.now();
        let records = self.inner.records.read().await;
        let mut channels: Vec<_> = records
            .iter()
            .filter(|(_, record)| record.is_fresh(now))
            .map(|(key, _)| key.clone())
            .collect();
        channels.sort();
        channels
    }

    /// Record lifetime
    pub fn ttl(&self) -> Duration {
        self.inner.ttl
    }

    /// Token manager used for upstream calls
    pub fn tokens(&self) -> &Arc<TokenManager> {
        &self.inner.tokens
    }
}

impl fmt::Debug for LivenessCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LivenessCache")
            .field("ttl", &self.inner.ttl)
            .field("streams", &self.inner.streams)
            .finish_non_exhaustive()
    }
}

impl Inner {
    async fn fresh(&self, key: &ChannelKey) -> Option<bool> {
        let now = self.clock.now();
        self.records
            .read()
            .await
            .get(key)
            .filter(|record| record.is_fresh(now))
            .map(|record| record.is_live)
    }

    /// Start a refresh that outlives any single waiter
    ///
    /// Must be called with the `in_flight` lock held, so the task cannot
    /// remove its entry before it has been inserted. The entry is removed on
    /// every exit path, a panicking provider included.
    fn spawn_refresh(self: &Arc<Self>, key: ChannelKey) -> RefreshFuture {
        let inner = Arc::clone(self);
        let task_key = key.clone();
        let handle = tokio::spawn(async move {
            let outcome = AssertUnwindSafe(inner.refresh(&task_key))
                .catch_unwind()
                .await;
            inner.in_flight.lock().await.remove(&task_key);

            outcome.unwrap_or_else(|_| {
                let err = crate::Error::internal(format!(
                    "liveness refresh for {} panicked",
                    task_key
                ));
                tracing::error!("{}", format_error_for_logging(&err));
                None
            })
        });
        let weak: Weak<Self> = Arc::downgrade(self);

        async move {
            match handle.await {
                Ok(outcome) => outcome,
                Err(err) => {
                    if let Some(inner) = weak.upgrade() {
                        inner.in_flight.lock().await.remove(&key);
                    }
                    let err = crate::Error::internal_with_context(
                        format!("refresh task for {} ended abnormally: {}", key, err),
                        "liveness_refresh",
                    );
                    tracing::error!("{}", format_error_for_logging(&err));
                    None
                }
            }
        }
        .boxed()
        .shared()
    }

    async fn refresh(&self, key: &ChannelKey) -> Option<bool> {
        let mut used_token = None;
        match self.fetch(key, &mut used_token).await {
            Ok(is_live) => {
                let now = self.clock.now();
                let Some(expires_at) = now.checked_add(self.ttl) else {
                    tracing::warn!(
                        "Liveness TTL {:?} is out of range, not caching {}",
                        self.ttl,
                        key
                    );
                    return Some(is_live);
                };

                let mut records = self.records.write().await;
                records.retain(|_, record| record.is_fresh(now));
                records.insert(key.clone(), LivenessRecord::new(is_live, expires_at));
                tracing::debug!(
                    "Refreshed liveness for {}: {}",
                    key,
                    if is_live { "live" } else { "offline" }
                );
                Some(is_live)
            }
            Err(err) => {
                if let (
                    crate::Error::UpstreamQuery {
                        status: Some(401), ..
                    },
                    Some(token),
                ) = (&err, &used_token)
                {
                    self.tokens.invalidate_if(token).await;
                }
                tracing::warn!(
                    "Liveness refresh for {} failed, reporting offline: {}",
                    key,
                    format_error_for_logging(&err)
                );
                None
            }
        }
    }

    /// Query the streams endpoint, leaving the token used in `used_token`
    async fn fetch(&self, key: &ChannelKey, used_token: &mut Option<String>) -> Result<bool> {
        let token = used_token.insert(self.tokens.get_token().await?);
        let response = self.streams.fetch_streams(key, token).await?;
        Ok(response.is_live())
    }
}
