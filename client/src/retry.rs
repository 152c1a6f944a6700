//! Retry policy for outbound API calls.
//!
//! Only transport failures and idempotent requests answered with 429 or a
//! 5xx are retried. Delay is `base * 2^attempt` plus up to `jitter` of that.

use std::time::Duration;

use rand::Rng;
use reqwest::{Method, StatusCode};

const DEFAULT_MAX_RETRIES: u32 = 1;
const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(100);
const DEFAULT_JITTER: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    /// Fraction of the computed delay added at random, `0.0..=1.0`.
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retries: DEFAULT_MAX_RETRIES, base_delay: DEFAULT_BASE_DELAY, jitter: DEFAULT_JITTER }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (0-indexed), for a jitter sample in `[0, 1)`.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32, sample: f64) -> Duration {
        let base = self.base_delay.saturating_mul(2u32.saturating_pow(attempt));
        let extra = base.mul_f64(self.jitter.clamp(0.0, 1.0) * sample.clamp(0.0, 1.0));
        base + extra
    }

    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.delay_for_attempt(attempt, rand::rng().random::<f64>())
    }

    #[must_use]
    pub fn allows(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }
}

#[must_use]
pub fn is_idempotent(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS | Method::PUT | Method::DELETE)
}

/// Whether a response status is worth a second attempt for this method.
#[must_use]
pub fn is_retryable_status(method: &Method, status: StatusCode) -> bool {
    is_idempotent(method) && (status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_doubles_per_attempt() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for_attempt(0, 0.0), Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(1, 0.0), Duration::from_millis(200));
        assert_eq!(policy.delay_for_attempt(2, 0.0), Duration::from_millis(400));
    }

    #[test]
    fn jitter_is_bounded() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for_attempt(0, 1.0), Duration::from_millis(120));
        for _ in 0..100 {
            let d = policy.backoff(1);
            assert!(d >= Duration::from_millis(200) && d <= Duration::from_millis(240), "{d:?}");
        }
    }

    #[test]
    fn only_one_retry_by_default() {
        let policy = RetryPolicy::default();
        assert!(policy.allows(0));
        assert!(!policy.allows(1));
    }

    #[test]
    fn post_is_never_retried_on_status() {
        assert!(!is_retryable_status(&Method::POST, StatusCode::SERVICE_UNAVAILABLE));
        assert!(!is_retryable_status(&Method::PATCH, StatusCode::TOO_MANY_REQUESTS));
    }

    #[test]
    fn idempotent_methods_retry_on_429_and_5xx() {
        for method in [Method::GET, Method::HEAD, Method::OPTIONS, Method::PUT, Method::DELETE] {
            assert!(is_retryable_status(&method, StatusCode::TOO_MANY_REQUESTS));
            assert!(is_retryable_status(&method, StatusCode::BAD_GATEWAY));
            assert!(!is_retryable_status(&method, StatusCode::NOT_FOUND));
            assert!(!is_retryable_status(&method, StatusCode::UNAUTHORIZED));
        }
    }
}
