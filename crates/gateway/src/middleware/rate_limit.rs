//! Rate limiting middleware using token bucket algorithm
//!
//! Keyed per workspace so one noisy tenant cannot starve the others.

use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use governor::{
    clock::DefaultClock,
    state::keyed::DefaultKeyedStateStore,
    Quota, RateLimiter,
};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Rate limiter keyed by workspace id, using governor crate
pub type WorkspaceRateLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Create a new keyed rate limiter
pub fn create_rate_limiter(requests_per_second: u32, burst: u32) -> Arc<WorkspaceRateLimiter> {
    let quota = Quota::per_second(NonZeroU32::new(requests_per_second.max(1)).unwrap())
        .allow_burst(NonZeroU32::new(burst.max(1)).unwrap());

    Arc::new(RateLimiter::keyed(quota))
}

/// Rate limiting middleware. Unauthenticated requests share one bucket.
pub async fn rate_limit_middleware(
    request: Request,
    next: Next,
    limiter: Arc<WorkspaceRateLimiter>,
) -> Result<Response, StatusCode> {
    let key = request
        .headers()
        .get("x-workspace-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("anonymous")
        .to_string();

    match limiter.check_key(&key) {
        Ok(_) => Ok(next.run(request).await),
        Err(_) => {
            tracing::warn!(workspace = %key, "Rate limit exceeded");
            Err(StatusCode::TOO_MANY_REQUESTS)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limiter_creation() {
        let limiter = create_rate_limiter(100, 200);
        assert!(limiter.check_key(&"ws-a".to_string()).is_ok());
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = create_rate_limiter(1, 1);
        assert!(limiter.check_key(&"ws-a".to_string()).is_ok());
        // ws-a's bucket is drained, ws-b's is not
        assert!(limiter.check_key(&"ws-a".to_string()).is_err());
        assert!(limiter.check_key(&"ws-b".to_string()).is_ok());
    }
}
