// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Sojo News

//! Per-client fixed-window request limit for the `/api/auth` routes.
//!
//! Each client IP gets `max_requests` per window. The window starts at the
//! client's first request and resets once it has fully elapsed.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header::RETRY_AFTER, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::sync::Mutex;
use tracing::warn;

use crate::config::RateLimitConfig;
use crate::error::ApiError;

const LIMIT_MESSAGE: &str = "Too many requests! Please try again later.";

/// Expired windows are swept once this many clients are tracked.
const SWEEP_THRESHOLD: usize = 10_000;

struct Window {
    started: Instant,
    count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    Limited { retry_after: Duration },
}

#[derive(Clone)]
pub struct RateLimiter {
    windows: Arc<Mutex<HashMap<IpAddr, Window>>>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            windows: Arc::new(Mutex::new(HashMap::new())),
            config,
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Count one request from `client`.
    pub async fn check(&self, client: IpAddr) -> RateDecision {
        self.check_at(client, Instant::now()).await
    }

    async fn check_at(&self, client: IpAddr, now: Instant) -> RateDecision {
        let window = self.config.window;
        let mut windows = self.windows.lock().await;

        if windows.len() >= SWEEP_THRESHOLD {
            windows.retain(|_, w| now.saturating_duration_since(w.started) < window);
        }

        let entry = windows.entry(client).or_insert(Window {
            started: now,
            count: 0,
        });
        let elapsed = now.saturating_duration_since(entry.started);
        if elapsed >= window {
            *entry = Window {
                started: now,
                count: 0,
            };
        }

        if entry.count >= self.config.max_requests {
            let retry_after = window.saturating_sub(now.saturating_duration_since(entry.started));
            return RateDecision::Limited { retry_after };
        }
        entry.count += 1;
        RateDecision::Allowed
    }

    /// Client address used as the limit key.
    pub fn client_ip(&self, headers: &HeaderMap, peer: Option<SocketAddr>) -> IpAddr {
        if self.config.trust_proxy_headers {
            if let Some(ip) = forwarded_ip(headers) {
                return ip;
            }
        }
        peer.map(|addr| addr.ip())
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
    }
}

fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
    let first_forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|ip| ip.trim().parse().ok());
    first_forwarded.or_else(|| {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .and_then(|ip| ip.trim().parse().ok())
    })
}

/// Middleware rejecting clients over the limit with 429.
pub async fn limit_requests(
    State(limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = limiter.client_ip(request.headers(), peer);

    match limiter.check(client).await {
        RateDecision::Allowed => next.run(request).await,
        RateDecision::Limited { retry_after } => {
            warn!(client = %client, path = %request.uri().path(), "Auth rate limit exceeded");
            let mut response =
                ApiError::new(StatusCode::TOO_MANY_REQUESTS, "rate_limit_exceeded", LIMIT_MESSAGE)
                    .into_response();
            let seconds = retry_after.as_secs().max(1);
            if let Ok(value) = HeaderValue::from_str(&seconds.to_string()) {
                response.headers_mut().insert(RETRY_AFTER, value);
            }
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_requests: u32, trust_proxy_headers: bool) -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            max_requests,
            window: Duration::from_secs(60),
            trust_proxy_headers,
        })
    }

    fn ip(raw: &str) -> IpAddr {
        raw.parse().unwrap()
    }

    #[tokio::test]
    async fn blocks_after_limit_until_window_ends() {
        let limiter = limiter(2, false);
        let start = Instant::now();
        let client = ip("10.0.0.1");

        assert_eq!(limiter.check_at(client, start).await, RateDecision::Allowed);
        assert_eq!(limiter.check_at(client, start).await, RateDecision::Allowed);
        assert_eq!(
            limiter.check_at(client, start + Duration::from_secs(20)).await,
            RateDecision::Limited {
                retry_after: Duration::from_secs(40)
            }
        );

        let next_window = start + Duration::from_secs(60);
        assert_eq!(limiter.check_at(client, next_window).await, RateDecision::Allowed);
    }

    #[tokio::test]
    async fn clients_are_counted_separately() {
        let limiter = limiter(1, false);
        let now = Instant::now();

        assert_eq!(limiter.check_at(ip("10.0.0.1"), now).await, RateDecision::Allowed);
        assert!(matches!(
            limiter.check_at(ip("10.0.0.1"), now).await,
            RateDecision::Limited { .. }
        ));
        assert_eq!(limiter.check_at(ip("10.0.0.2"), now).await, RateDecision::Allowed);
    }

    #[test]
    fn forwarding_headers_need_trust() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7, 10.0.0.1"));
        let peer: SocketAddr = "10.0.0.9:5000".parse().unwrap();

        assert_eq!(limiter(1, false).client_ip(&headers, Some(peer)), ip("10.0.0.9"));
        assert_eq!(limiter(1, true).client_ip(&headers, Some(peer)), ip("203.0.113.7"));

        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.4"));
        assert_eq!(limiter(1, true).client_ip(&headers, None), ip("198.51.100.4"));
        assert_eq!(limiter(1, false).client_ip(&headers, None), ip("0.0.0.0"));
    }
}
