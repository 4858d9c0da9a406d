use crate::error::AppError;
use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use governor::{
    Quota, RateLimiter,
    clock::{Clock, DefaultClock},
    state::keyed::DashMapStateStore,
};
use std::{
    net::{IpAddr, SocketAddr},
    num::NonZeroU32,
    sync::Arc,
    time::Duration,
};

type KeyedLimiter = RateLimiter<IpAddr, DashMapStateStore<IpAddr>, DefaultClock>;

/// Rate limiter keyed by client IP address
#[derive(Clone)]
pub struct IpRateLimiter {
    limiter: Arc<KeyedLimiter>,
    trust_forwarded_for: bool,
}

impl IpRateLimiter {
    /// Key on the first `X-Forwarded-For` hop instead of the socket peer.
    /// Only safe when a trusted proxy overwrites that header.
    pub fn trust_forwarded_for(mut self, trust: bool) -> Self {
        self.trust_forwarded_for = trust;
        self
    }

    /// Take one unit of quota for `ip`; on exhaustion returns how long to wait.
    pub fn check(&self, ip: &IpAddr) -> Result<(), Duration> {
        self.limiter
            .check_key(ip)
            .map_err(|negative| negative.wait_time_from(DefaultClock::default().now()))
    }

    /// Resolve the address the quota is charged to.
    pub fn client_ip(&self, request: &Request) -> Option<IpAddr> {
        let peer_ip = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());

        if !self.trust_forwarded_for {
            return peer_ip;
        }

        request
            .headers()
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
            .or(peer_ip)
    }
}

/// Create a keyed rate limiter allowing `attempts` requests per IP every `window_seconds`.
pub fn create_ip_rate_limiter(attempts: u32, window_seconds: u64) -> Result<IpRateLimiter, AppError> {
    let attempts = NonZeroU32::new(attempts.max(1)).ok_or_else(|| {
        AppError::ConfigError(anyhow::anyhow!("rate limit attempts must be non-zero"))
    })?;
    let period = Duration::from_millis((window_seconds * 1000) / u64::from(attempts.get()))
        .max(Duration::from_millis(1));
    let quota = Quota::with_period(period)
        .ok_or_else(|| {
            AppError::ConfigError(anyhow::anyhow!(
                "invalid rate limit window of {}s",
                window_seconds
            ))
        })?
        .allow_burst(attempts);

    Ok(IpRateLimiter {
        limiter: Arc::new(RateLimiter::dashmap(quota)),
        trust_forwarded_for: false,
    })
}

/// Middleware for IP-based rate limiting
pub async fn ip_rate_limit_middleware(
    State(limiter): State<IpRateLimiter>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    match limiter.client_ip(&request) {
        Some(ip) => match limiter.check(&ip) {
            Ok(()) => Ok(next.run(request).await),
            Err(wait_time) => {
                tracing::warn!(client_ip = %ip, "Rate limit exceeded");
                Err(AppError::TooManyRequests(
                    "Too many requests from this IP. Please try again later.".to_string(),
                    Some(wait_time.as_secs().max(1)),
                ))
            }
        },
        None => {
            tracing::warn!("Could not determine IP for rate limiting");
            Ok(next.run(request).await)
        }
    }
}
