// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-client request rate limiting.
//!
//! Fixed one-second windows keyed by client IP: the peer address when the
//! server was started with connect info, otherwise the first
//! `X-Forwarded-For` entry. Requests with neither share one bucket.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;

use crate::error::AppError;
use crate::AppState;

const UNKNOWN_CLIENT: &str = "unknown";

struct Counter {
    window_start: Instant,
    count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allow,
    Limited { retry_after: Duration },
}

pub struct RateLimiter {
    limit: u32,
    window: Duration,
    counters: DashMap<String, Counter>,
}

impl RateLimiter {
    /// Allow `limit` requests per client per `window`.
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit: limit.max(1),
            window,
            counters: DashMap::new(),
        }
    }

    pub fn per_second(limit: u32) -> Self {
        Self::new(limit, Duration::from_secs(1))
    }

    pub fn check(&self, client: &str) -> RateLimitDecision {
        self.check_at(client, Instant::now())
    }

    /// Count one request from `client` at `now`.
    pub fn check_at(&self, client: &str, now: Instant) -> RateLimitDecision {
        let mut counter = self
            .counters
            .entry(client.to_string())
            .or_insert_with(|| Counter {
                window_start: now,
                count: 0,
            });

        if now.duration_since(counter.window_start) >= self.window {
            counter.window_start = now;
            counter.count = 0;
        }

        if counter.count >= self.limit {
            let elapsed = now.duration_since(counter.window_start);
            return RateLimitDecision::Limited {
                retry_after: self.window.saturating_sub(elapsed),
            };
        }

        counter.count += 1;
        RateLimitDecision::Allow
    }

    /// Drop counters whose window has passed.
    pub fn purge_stale(&self, now: Instant) {
        let window = self.window;
        self.counters
            .retain(|_, counter| now.duration_since(counter.window_start) < window);
    }

    /// Purge stale counters every `interval` for the life of the process.
    pub fn spawn_cleanup_task(self: Arc<Self>, interval: Duration) {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                self.purge_stale(Instant::now());
            }
        });
    }
}

fn client_key(req: &Request) -> String {
    if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }

    req.headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

/// Reject requests over the configured rate with 429.
pub async fn rate_limit(State(state): State<Arc<AppState>>, req: Request, next: Next) -> Response {
    let client = client_key(&req);

    match state.rate_limiter.check(&client) {
        RateLimitDecision::Allow => next.run(req).await,
        RateLimitDecision::Limited { retry_after } => {
            tracing::warn!(client = %client, "Rate limit exceeded");
            let mut response = AppError::RateLimited.into_response();
            let secs = retry_after.as_secs_f64().ceil().max(1.0) as u64;
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_limit_within_window() {
        let limiter = RateLimiter::per_second(2);
        let start = Instant::now();

        assert_eq!(limiter.check_at("a", start), RateLimitDecision::Allow);
        assert_eq!(limiter.check_at("a", start), RateLimitDecision::Allow);
        assert!(matches!(
            limiter.check_at("a", start + Duration::from_millis(100)),
            RateLimitDecision::Limited { retry_after } if retry_after == Duration::from_millis(900)
        ));

        // Other clients have their own budget.
        assert_eq!(limiter.check_at("b", start), RateLimitDecision::Allow);
    }

    #[test]
    fn test_window_resets() {
        let limiter = RateLimiter::per_second(1);
        let start = Instant::now();

        assert_eq!(limiter.check_at("a", start), RateLimitDecision::Allow);
        assert_ne!(limiter.check_at("a", start), RateLimitDecision::Allow);
        assert_eq!(
            limiter.check_at("a", start + Duration::from_secs(1)),
            RateLimitDecision::Allow
        );
    }

    #[test]
    fn test_purge_stale() {
        let limiter = RateLimiter::per_second(1);
        let start = Instant::now();
        limiter.check_at("a", start);
        limiter.check_at("b", start + Duration::from_millis(500));

        limiter.purge_stale(start + Duration::from_millis(1200));
        assert_eq!(limiter.counters.len(), 1);
        assert!(limiter.counters.contains_key("b"));
    }

    #[test]
    fn test_client_key_sources() {
        let mut req = Request::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_key(&req), "203.0.113.7");

        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 1], 4000))));
        assert_eq!(client_key(&req), "192.0.2.1");

        let bare = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(client_key(&bare), UNKNOWN_CLIENT);
    }
}
