// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Sliding-window rate limiter.
//!
//! Each caller key (`user:<id>` when authenticated, `ip:<addr>` otherwise)
//! owns an ordered list of the instants at which its requests were allowed.
//! A request is allowed when fewer than `max_requests` instants fall inside
//! the trailing window.
//!
//! ## Limitations
//!
//! The ledger is process-local and lost on restart. Running several server
//! instances multiplies the effective limit because nothing is shared between
//! them. Moving the ledger to a shared counter store means implementing the
//! same `check` contract on top of it.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::CallerIdentity;

/// How often the background sweep runs.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Instants older than this are dropped by the sweep regardless of route.
pub const RETENTION_HORIZON: Duration = Duration::from_secs(60 * 60);

/// Per-route limit: at most `max_requests` within `window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub max_requests: usize,
    pub window: Duration,
}

impl RateLimitPolicy {
    pub const DEFAULT_MAX_REQUESTS: usize = 100;
    pub const DEFAULT_WINDOW: Duration = Duration::from_secs(15 * 60);

    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
        }
    }

    /// Suggested client back-off, in whole seconds.
    pub fn retry_after_secs(&self) -> u64 {
        let secs = self.window.as_secs();
        if self.window.subsec_nanos() > 0 {
            secs + 1
        } else {
            secs
        }
    }
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_REQUESTS, Self::DEFAULT_WINDOW)
    }
}

/// Rejection returned when a caller exceeded its window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimited {
    pub retry_after_secs: u64,
}

impl IntoResponse for RateLimited {
    fn into_response(self) -> Response {
        crate::error::ApiError::from(self).into_response()
    }
}

/// Thread-safe sliding-window ledger keyed by caller.
///
/// The map is sharded, so the read-modify-write on one key holds only that
/// key's shard lock and never suspends.
#[derive(Debug, Default)]
pub struct RateLimiter {
    ledger: DashMap<String, Vec<Instant>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a request for `key` now, or reject it.
    pub fn check(&self, key: &str, policy: &RateLimitPolicy) -> Result<(), RateLimited> {
        self.check_at(key, policy, Instant::now())
    }

    /// Record a request for `key` at `now`, or reject it.
    ///
    /// Rejected attempts are not recorded.
    pub fn check_at(
        &self,
        key: &str,
        policy: &RateLimitPolicy,
        now: Instant,
    ) -> Result<(), RateLimited> {
        let mut requests = self.ledger.entry(key.to_string()).or_default();

        if let Some(window_start) = now.checked_sub(policy.window) {
            requests.retain(|t| *t > window_start);
        }

        if requests.len() >= policy.max_requests {
            return Err(RateLimited {
                retry_after_secs: policy.retry_after_secs(),
            });
        }

        requests.push(now);
        Ok(())
    }

    /// Number of tracked keys.
    pub fn tracked_keys(&self) -> usize {
        self.ledger.len()
    }

    /// Drop instants older than `retention` and forget keys left empty.
    pub fn sweep(&self, retention: Duration) -> usize {
        self.sweep_at(Instant::now(), retention)
    }

    /// Sweep as of `now`. Returns the number of keys removed.
    pub fn sweep_at(&self, now: Instant, retention: Duration) -> usize {
        let before = self.ledger.len();
        self.ledger.retain(|_, requests| {
            requests.retain(|t| now.saturating_duration_since(*t) < retention);
            !requests.is_empty()
        });
        before.saturating_sub(self.ledger.len())
    }
}

/// Background task that periodically sweeps the ledger.
pub struct RateLimitSweeper {
    limiter: Arc<RateLimiter>,
    interval: Duration,
    retention: Duration,
}

impl RateLimitSweeper {
    pub fn new(limiter: Arc<RateLimiter>) -> Self {
        Self {
            limiter,
            interval: SWEEP_INTERVAL,
            retention: RETENTION_HORIZON,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Run the sweep loop until the cancellation token is triggered.
    ///
    /// ```rust,ignore
    /// tokio::spawn(sweeper.run(shutdown.clone()));
    /// ```
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.interval.as_secs(),
            retention_secs = self.retention.as_secs(),
            "Rate limit sweeper starting"
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {},
                _ = shutdown.cancelled() => {
                    info!("Rate limit sweeper shutting down");
                    return;
                }
            }

            let removed = self.limiter.sweep(self.retention);
            debug!(
                removed,
                tracked = self.limiter.tracked_keys(),
                "Rate limit ledger swept"
            );
        }
    }
}

/// State for one rate-limited route group.
#[derive(Clone)]
pub struct RateLimitLayer {
    pub limiter: Arc<RateLimiter>,
    pub policy: RateLimitPolicy,
}

impl RateLimitLayer {
    pub fn new(limiter: Arc<RateLimiter>, policy: RateLimitPolicy) -> Self {
        Self { limiter, policy }
    }
}

/// Key for the current request: the caller id when authenticated, else the
/// peer address.
pub fn request_key(request: &Request) -> String {
    if let Some(identity) = request.extensions().get::<CallerIdentity>() {
        return identity.rate_limit_key();
    }
    match request
        .extensions()
        .get::<ConnectInfo<std::net::SocketAddr>>()
    {
        Some(ConnectInfo(addr)) => format!("ip:{}", addr.ip()),
        None => "ip:unknown".to_string(),
    }
}

/// Rate limiting middleware.
///
/// ```rust,ignore
/// post(handler).route_layer(axum::middleware::from_fn_with_state(
///     RateLimitLayer::new(limiter, policy),
///     rate_limit,
/// ))
/// ```
pub async fn rate_limit(
    State(layer): State<RateLimitLayer>,
    request: Request,
    next: Next,
) -> Response {
    let key = request_key(&request);

    match layer.limiter.check(&key, &layer.policy) {
        Ok(()) => next.run(request).await,
        Err(rejection) => {
            info!(key = %key, path = %request.uri().path(), "Rate limit exceeded");
            rejection.into_response()
        }
    }
}
