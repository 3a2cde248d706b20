//! Per-user fixed-window rate limiting.
//!
//! A window opens on a user's first request and holds for a fixed duration.
//! Requests within an open window count against a fixed ceiling; the request
//! after the ceiling is denied with the seconds remaining until the window
//! resets. An expired window is replaced lazily on the user's next request,
//! so idle users cost nothing. Bursty at window boundaries, which is an
//! accepted trade-off for the simplicity of the counter.
//!
//! State is in-process: each server instance enforces its own limit.

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy)]
struct Window {
    started_at: Instant,
    count: u32,
}

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    Denied { retry_after_secs: u64 },
}

/// Fixed-window counter keyed by user identity.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    windows: Arc<Mutex<HashMap<String, Window>>>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            windows: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Counts one request for `user_id` and reports whether it is allowed.
    ///
    /// The check-and-increment happens under a single lock so concurrent
    /// bursts from the same user cannot undercount.
    pub async fn check(&self, user_id: &str) -> RateDecision {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;

        let window = windows
            .entry(user_id.to_string())
            .or_insert(Window {
                started_at: now,
                count: 0,
            });

        let elapsed = now.saturating_duration_since(window.started_at);
        if elapsed >= self.window {
            window.started_at = now;
            window.count = 0;
        }

        if window.count >= self.max_requests {
            let remaining = self.window.saturating_sub(elapsed);
            let retry_after_secs = remaining.as_secs().max(1);
            return RateDecision::Denied { retry_after_secs };
        }

        window.count += 1;
        RateDecision::Allowed
    }
}
