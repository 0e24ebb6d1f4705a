//! Token-bucket rate limiting for `govern` calls.
//!
//! One bucket per engine instance, refilled continuously at the configured
//! rate. When the bucket is empty the configured policy applies uniformly:
//! reject with a retry hint, or wait up to a bound and then reject.
//! Requests are never silently dropped.

use std::sync::Mutex;
use std::time::Instant;

use tracing::{debug, warn};

use quorum_types::RateLimitPolicy;

use crate::error::GovernError;

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

/// Token-bucket limiter shared across concurrent `govern` calls.
///
/// The critical section only updates two floats, so a plain mutex is
/// sufficient; no await happens while it is held.
pub struct RateLimiter {
    state: Mutex<BucketState>,
    rate_per_sec: f64,
    capacity: f64,
    policy: RateLimitPolicy,
}

impl RateLimiter {
    pub fn new(rate_per_sec: f64, policy: RateLimitPolicy) -> Self {
        let capacity = rate_per_sec.max(1.0);
        Self {
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
            rate_per_sec,
            capacity,
            policy,
        }
    }

    /// Take one token, applying the configured exhaustion policy.
    pub async fn acquire(&self) -> Result<(), GovernError> {
        let deadline = match self.policy {
            RateLimitPolicy::Reject => None,
            RateLimitPolicy::Wait { max_wait_ms } => {
                Some(Instant::now() + std::time::Duration::from_millis(max_wait_ms))
            }
        };

        loop {
            match self.try_take() {
                Ok(()) => return Ok(()),
                Err(retry_after_ms) => {
                    let Some(deadline) = deadline else {
                        warn!(retry_after_ms, "Rate limit exceeded, rejecting");
                        return Err(GovernError::RateLimitExceeded { retry_after_ms });
                    };

                    let wait = std::time::Duration::from_millis(retry_after_ms.max(1));
                    if Instant::now() + wait > deadline {
                        warn!(retry_after_ms, "Rate limit wait bound exhausted");
                        return Err(GovernError::RateLimitExceeded { retry_after_ms });
                    }
                    debug!(wait_ms = wait.as_millis() as u64, "Rate limited, waiting");
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }

    /// Refill by elapsed time and take a token, or report how long until
    /// one is available.
    fn try_take(&self) -> Result<(), u64> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.rate_per_sec).min(self.capacity);
        state.last_refill = now;

        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            Ok(())
        } else {
            let deficit = 1.0 - state.tokens;
            Err((deficit / self.rate_per_sec * 1000.0).ceil() as u64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn burst_within_capacity_is_admitted() {
        let limiter = RateLimiter::new(5.0, RateLimitPolicy::Reject);
        for _ in 0..5 {
            limiter.acquire().await.unwrap();
        }
    }

    #[tokio::test]
    async fn reject_policy_fails_fast_when_exhausted() {
        let limiter = RateLimiter::new(0.1, RateLimitPolicy::Reject);
        limiter.acquire().await.unwrap();

        let result = limiter.acquire().await;
        assert!(matches!(
            result,
            Err(GovernError::RateLimitExceeded { .. })
        ));
    }

    #[tokio::test]
    async fn wait_policy_delays_until_a_token_refills() {
        let limiter = RateLimiter::new(
            20.0,
            RateLimitPolicy::Wait { max_wait_ms: 1_000 },
        );
        // Drain the bucket
        for _ in 0..20 {
            limiter.acquire().await.unwrap();
        }

        // At 20 rps a token returns within ~50 ms, inside the wait bound
        let start = Instant::now();
        limiter.acquire().await.unwrap();
        assert!(start.elapsed() >= std::time::Duration::from_millis(20));
    }

    #[tokio::test]
    async fn wait_policy_gives_up_past_the_bound() {
        let limiter = RateLimiter::new(0.5, RateLimitPolicy::Wait { max_wait_ms: 10 });
        limiter.acquire().await.unwrap();

        // Next token is ~2 s away, far beyond the 10 ms bound
        let result = limiter.acquire().await;
        assert!(matches!(
            result,
            Err(GovernError::RateLimitExceeded { .. })
        ));
    }

    #[tokio::test]
    async fn retry_hint_reflects_refill_rate() {
        let limiter = RateLimiter::new(0.1, RateLimitPolicy::Reject);
        limiter.acquire().await.unwrap();

        match limiter.acquire().await {
            Err(GovernError::RateLimitExceeded { retry_after_ms }) => {
                assert!(retry_after_ms <= 10_000);
                assert!(retry_after_ms > 0);
            }
            other => panic!("expected rate limit error, got {other:?}"),
        }
    }
}
