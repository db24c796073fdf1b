/// Per-client rate limiting
///
/// This module implements token bucket rate limiting with in-process state.
/// Each client gets one bucket per policy:
///
/// - **Api**: `RATE_LIMIT_MAX_REQUESTS` per `RATE_LIMIT_WINDOW_MS` on all of `/api/v1`
/// - **AdminRegistration**: `ADMIN_RATE_LIMIT_MAX_REQUESTS` per window on
///   `register-admin`, to make guessing the admin secret impractical
///
/// # Algorithm
///
/// Uses token bucket algorithm:
/// - A bucket starts full at `max_requests`
/// - Tokens refill continuously at `max_requests / window`
/// - Each request consumes 1 token
/// - Request blocked if bucket empty
///
/// # Client identity
///
/// The peer address from `ConnectInfo`. With `TRUST_PROXY` enabled, the
/// rightmost `X-Forwarded-For` entry instead: that hop is appended by the
/// proxy, while everything left of it is whatever the client sent.
///
/// # Headers
///
/// Response includes rate limit headers:
/// - `X-RateLimit-Limit`: Total requests allowed per window
/// - `X-RateLimit-Remaining`: Tokens remaining
/// - `Retry-After`: Seconds to wait (429 responses only)

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};

use crate::app::AppState;
use crate::config::RateLimitConfig;
use crate::error::ApiError;

/// Bucket count above which idle buckets are swept
const SWEEP_THRESHOLD: usize = 10_000;

/// Which limit a request is charged against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Policy {
    Api,
    AdminRegistration,
}

/// Rate limit configuration for a policy
#[derive(Debug, Clone, Copy)]
pub struct RateLimit {
    /// Maximum requests per window
    pub max_requests: u32,

    /// Length of the window
    pub window: Duration,
}

impl RateLimit {
    /// Token refill rate (tokens per second)
    pub fn refill_rate(&self) -> f64 {
        self.max_requests as f64 / self.window.as_secs_f64()
    }
}

/// Token bucket state
#[derive(Debug, Clone)]
struct TokenBucket {
    /// Current number of tokens
    tokens: f64,

    /// Last refill instant
    last_refill: Instant,
}

impl TokenBucket {
    /// Creates a new full bucket
    fn new(capacity: u32, now: Instant) -> Self {
        TokenBucket {
            tokens: capacity as f64,
            last_refill: now,
        }
    }

    /// Refills tokens based on elapsed time
    fn refill(&mut self, now: Instant, rate: f64, capacity: u32) {
        let elapsed_secs = now.saturating_duration_since(self.last_refill).as_secs_f64();

        self.tokens = (self.tokens + elapsed_secs * rate).min(capacity as f64);
        self.last_refill = now;
    }

    /// Attempts to consume N tokens
    fn try_consume(&mut self, count: f64) -> bool {
        if self.tokens >= count {
            self.tokens -= count;
            true
        } else {
            false
        }
    }

    /// Calculates seconds until N tokens available
    fn seconds_until_available(&self, count: f64, rate: f64) -> u64 {
        let deficit = count - self.tokens;
        if deficit <= 0.0 {
            0
        } else {
            (deficit / rate).ceil() as u64
        }
    }
}

/// Result of rate limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitResult {
    /// Whether request is allowed
    pub ok: bool,

    pub limit: u32,

    /// Tokens remaining
    pub remaining: u32,

    /// Seconds until a request would be allowed again
    pub retry_after: u64,
}

/// Shared bucket store
#[derive(Debug, Clone)]
pub struct RateLimiter {
    api: RateLimit,
    admin: RateLimit,
    trust_proxy: bool,
    buckets: Arc<Mutex<HashMap<(Policy, String), TokenBucket>>>,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            api: RateLimit {
                max_requests: config.max_requests,
                window: config.window,
            },
            admin: RateLimit {
                max_requests: config.admin_max_requests,
                window: config.window,
            },
            trust_proxy: config.trust_proxy,
            buckets: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn limit_for(&self, policy: Policy) -> RateLimit {
        match policy {
            Policy::Api => self.api,
            Policy::AdminRegistration => self.admin,
        }
    }

    /// Charges one request to `client` under `policy`
    pub fn check(&self, policy: Policy, client: &str) -> RateLimitResult {
        self.check_at(policy, client, Instant::now())
    }

    pub fn check_at(&self, policy: Policy, client: &str, now: Instant) -> RateLimitResult {
        let limit = self.limit_for(policy);
        let rate = limit.refill_rate();

        // A poisoned lock only means another request panicked mid-update;
        // the bucket map itself is still usable.
        let mut buckets = self
            .buckets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if buckets.len() > SWEEP_THRESHOLD {
            let window = limit.window;
            buckets.retain(|_, bucket| now.saturating_duration_since(bucket.last_refill) < window);
        }

        let bucket = buckets
            .entry((policy, client.to_string()))
            .or_insert_with(|| TokenBucket::new(limit.max_requests, now));
        bucket.refill(now, rate, limit.max_requests);

        let ok = bucket.try_consume(1.0);
        RateLimitResult {
            ok,
            limit: limit.max_requests,
            remaining: bucket.tokens.floor().max(0.0) as u32,
            retry_after: if ok {
                0
            } else {
                bucket.seconds_until_available(1.0, rate).max(1)
            },
        }
    }
}

/// Identifies the calling client
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>, trust_proxy: bool) -> String {
    let forwarded = if trust_proxy {
        headers
            .get_all("X-Forwarded-For")
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(','))
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .last()
            .map(str::to_string)
    } else {
        None
    };

    forwarded
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

async fn enforce(
    limiter: &RateLimiter,
    policy: Policy,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = client_key(request.headers(), peer, limiter.trust_proxy);

    let result = limiter.check(policy, &client);
    if !result.ok {
        tracing::warn!(client = %client, policy = ?policy, "Rate limit exceeded");
        return Err(create_rate_limit_error(result));
    }

    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert("X-RateLimit-Limit", HeaderValue::from(result.limit));
    headers.insert("X-RateLimit-Remaining", HeaderValue::from(result.remaining));

    Ok(response)
}

/// Rate limiting middleware for the API
///
/// # Errors
///
/// - 429 Too Many Requests: Rate limit exceeded
pub async fn rate_limit_layer(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    enforce(&state.limiter, Policy::Api, request, next).await
}

/// Stricter limit for admin registration
pub async fn admin_rate_limit_layer(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    enforce(&state.limiter, Policy::AdminRegistration, request, next).await
}

/// Creates a rate limit exceeded error response
fn create_rate_limit_error(result: RateLimitResult) -> ApiError {
    ApiError::RateLimitExceeded {
        retry_after: result.retry_after,
        message: "Too many requests from this IP, please try again later".to_string(),
    }
}
