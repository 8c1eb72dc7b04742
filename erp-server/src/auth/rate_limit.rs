//! Fixed-window rate limiting for the login route

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use shared::error::{AppError, ErrorCode};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Login attempts allowed per client IP and window
pub const LOGIN_MAX_ATTEMPTS: u32 = 5;
pub const LOGIN_WINDOW: Duration = Duration::from_secs(60);

/// Idle entries older than this are dropped by [`RateLimiter::cleanup`]
const ENTRY_TTL: Duration = Duration::from_secs(300);

struct IpEntry {
    count: u32,
    window_start: Instant,
}

#[derive(Clone, Default)]
pub struct RateLimiter {
    /// route name -> (IP -> entry)
    inner: Arc<Mutex<HashMap<&'static str, HashMap<String, IpEntry>>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the request is allowed, `false` if rate-limited.
    pub async fn check(
        &self,
        route: &'static str,
        ip: &str,
        max_requests: u32,
        window: Duration,
    ) -> bool {
        let mut map = self.inner.lock().await;
        let route_map = map.entry(route).or_default();
        let now = Instant::now();

        let entry = route_map.entry(ip.to_owned()).or_insert_with(|| IpEntry {
            count: 0,
            window_start: now,
        });

        if now.duration_since(entry.window_start) >= window {
            entry.count = 0;
            entry.window_start = now;
        }

        entry.count += 1;
        entry.count <= max_requests
    }

    /// Drop stale entries
    pub async fn cleanup(&self) {
        let mut map = self.inner.lock().await;
        let now = Instant::now();

        for route_map in map.values_mut() {
            route_map.retain(|_, entry| now.duration_since(entry.window_start) < ENTRY_TTL);
        }
        map.retain(|_, route_map| !route_map.is_empty());
    }

    #[cfg(test)]
    async fn tracked(&self) -> usize {
        self.inner.lock().await.values().map(HashMap::len).sum()
    }
}

/// Client IP: the peer address, or the last `X-Forwarded-For` entry when
/// running behind a trusted proxy (the one the proxy appended)
fn extract_ip(request: &Request, trust_proxy: bool) -> String {
    if trust_proxy
        && let Some(forwarded) = request.headers().get("x-forwarded-for")
        && let Ok(val) = forwarded.to_str()
        && let Some(last) = val.rsplit(',').next()
    {
        let ip = last.trim();
        if !ip.is_empty() {
            return ip.to_owned();
        }
    }

    request
        .extensions()
        .get::<axum::extract::ConnectInfo<std::net::SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_owned())
}

/// Rate limit middleware for login
pub async fn login_rate_limit(
    State(state): State<crate::state::AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ip = extract_ip(&request, state.trust_proxy);
    if !state
        .rate_limiter
        .check("login", &ip, LOGIN_MAX_ATTEMPTS, LOGIN_WINDOW)
        .await
    {
        tracing::warn!(ip = %ip, "Login rate limit exceeded");
        return Err(AppError::new(ErrorCode::TooManyRequests));
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[tokio::test]
    async fn test_limit_per_ip() {
        let limiter = RateLimiter::new();
        for _ in 0..LOGIN_MAX_ATTEMPTS {
            assert!(limiter.check("login", "10.0.0.1", 5, LOGIN_WINDOW).await);
        }
        assert!(!limiter.check("login", "10.0.0.1", 5, LOGIN_WINDOW).await);
        // Other clients are unaffected
        assert!(limiter.check("login", "10.0.0.2", 5, LOGIN_WINDOW).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_resets() {
        let limiter = RateLimiter::new();
        assert!(limiter.check("login", "10.0.0.1", 1, LOGIN_WINDOW).await);
        assert!(!limiter.check("login", "10.0.0.1", 1, LOGIN_WINDOW).await);

        tokio::time::advance(LOGIN_WINDOW).await;
        assert!(limiter.check("login", "10.0.0.1", 1, LOGIN_WINDOW).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_drops_stale_entries() {
        let limiter = RateLimiter::new();
        limiter.check("login", "10.0.0.1", 5, LOGIN_WINDOW).await;
        assert_eq!(limiter.tracked().await, 1);

        tokio::time::advance(ENTRY_TTL).await;
        limiter.cleanup().await;
        assert_eq!(limiter.tracked().await, 0);
    }

    fn forwarded_request() -> Request {
        let mut req = Request::builder()
            .header("x-forwarded-for", "203.0.113.7, 198.51.100.4")
            .body(Body::empty())
            .unwrap();
        req.extensions_mut().insert(axum::extract::ConnectInfo(
            std::net::SocketAddr::from(([10, 0, 0, 9], 41000)),
        ));
        req
    }

    #[test]
    fn test_forwarded_header_ignored_by_default() {
        assert_eq!(extract_ip(&forwarded_request(), false), "10.0.0.9");

        let req = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(extract_ip(&req, false), "unknown");
    }

    #[test]
    fn test_trusted_proxy_uses_appended_entry() {
        assert_eq!(extract_ip(&forwarded_request(), true), "198.51.100.4");
    }
}
