//! Client-side request throttling.
//!
//! DESIGN
//! ======
//! Rolling-window counter backed by a `VecDeque<Instant>` of dispatch times.
//! A caller over the limit sleeps until the oldest dispatch leaves the
//! window. The deque's async mutex is held across that sleep, so waiting
//! callers are admitted in arrival order and nothing is ever rejected.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

const DEFAULT_MAX_REQUESTS: usize = 5;
const DEFAULT_WINDOW: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub max_requests: usize,
    pub window: Duration,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self { max_requests: DEFAULT_MAX_REQUESTS, window: DEFAULT_WINDOW }
    }
}

#[derive(Debug, Clone)]
pub struct RateLimiter {
    limit: RateLimit,
    dispatched: Arc<Mutex<VecDeque<Instant>>>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(limit: RateLimit) -> Self {
        Self { limit, dispatched: Arc::new(Mutex::new(VecDeque::with_capacity(limit.max_requests))) }
    }

    #[must_use]
    pub fn limit(&self) -> RateLimit {
        self.limit
    }

    /// Wait for a slot in the window, then record the dispatch.
    pub async fn acquire(&self) {
        let max = self.limit.max_requests.max(1);
        let mut dispatched = self.dispatched.lock().await;
        loop {
            let now = Instant::now();
            while dispatched
                .front()
                .is_some_and(|&t| now.duration_since(t) >= self.limit.window)
            {
                dispatched.pop_front();
            }
            if dispatched.len() < max {
                dispatched.push_back(now);
                return;
            }
            let Some(&oldest) = dispatched.front() else {
                continue;
            };
            let wait = (oldest + self.limit.window).saturating_duration_since(now);
            tracing::trace!(wait_ms = wait.as_millis(), "rate limit reached; queuing request");
            tokio::time::sleep(wait).await;
        }
    }
}

#[cfg(test)]
#[path = "rate_limit_test.rs"]
mod tests;
