use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

#[derive(Debug)]
struct Window {
    opened_at: Instant,
    served: u32,
}

/// Fixed-window limiter shared by every route behind it: at most `limit`
/// requests per `period`, counted across all callers.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    limit: u32,
    period: Duration,
    window: Arc<Mutex<Window>>,
}

impl RateLimiter {
    pub fn new(rps: u32) -> Self {
        Self::with_period(rps, Duration::from_secs(1))
    }

    pub fn with_period(limit: u32, period: Duration) -> Self {
        Self {
            limit: limit.max(1),
            period,
            window: Arc::new(Mutex::new(Window {
                opened_at: Instant::now(),
                served: 0,
            })),
        }
    }

    fn allow_at(&self, now: Instant) -> bool {
        let mut window = match self.window.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if now.saturating_duration_since(window.opened_at) >= self.period {
            window.opened_at = now;
            window.served = 0;
        }
        if window.served >= self.limit {
            return false;
        }
        window.served += 1;
        true
    }
}

pub async fn rps_middleware(
    State(limiter): State<RateLimiter>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if !limiter.allow_at(Instant::now()) {
        tracing::debug!(limit = limiter.limit, "request rejected by rate limiter");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({ "error": "rate_limit_exceeded" })),
        )
            .into_response();
    }
    next.run(req).await
}

pub fn new_rps_state(rps: u32) -> RateLimiter {
    RateLimiter::new(rps)
}
