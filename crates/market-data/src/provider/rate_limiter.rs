//! Token bucket rate limiter for a single provider.
//!
//! Every provider owns one limiter built from its [`RateLimit`]. Requests
//! take a token before they are sent; when the bucket is empty the caller
//! waits until the next token is earned.

use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::{debug, warn};

use super::capabilities::RateLimit;

#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    last_update: Instant,
    /// Tokens earned per second.
    rate: f64,
    capacity: f64,
}

impl TokenBucket {
    fn new(limit: &RateLimit) -> Self {
        let capacity = f64::from(limit.burst.max(1));
        Self {
            tokens: capacity,
            last_update: Instant::now(),
            rate: f64::from(limit.requests_per_minute.max(1)) / 60.0,
            capacity,
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.rate).min(self.capacity);
        self.last_update = now;
    }

    fn try_acquire(&mut self) -> bool {
        self.refill();
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    fn time_until_available(&mut self) -> Duration {
        self.refill();
        if self.tokens >= 1.0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64((1.0 - self.tokens) / self.rate)
        }
    }
}

/// Thread-safe token bucket shared by all requests of one provider.
#[derive(Debug)]
pub struct RateLimiter {
    provider: &'static str,
    bucket: Mutex<TokenBucket>,
}

impl RateLimiter {
    pub fn new(provider: &'static str, limit: &RateLimit) -> Self {
        Self {
            provider,
            bucket: Mutex::new(TokenBucket::new(limit)),
        }
    }

    /// Lock the bucket, recovering from poison.
    ///
    /// A poisoned bucket can at worst mis-count a token.
    fn lock_bucket(&self) -> MutexGuard<'_, TokenBucket> {
        self.bucket.lock().unwrap_or_else(|poisoned| {
            warn!("Rate limiter for '{}' was poisoned, recovering", self.provider);
            poisoned.into_inner()
        })
    }

    /// Wait (asynchronously) until a token is available, then take it.
    pub async fn acquire(&self) {
        loop {
            let wait_time = {
                let mut bucket = self.lock_bucket();
                if bucket.try_acquire() {
                    return;
                }
                bucket.time_until_available()
            };

            if wait_time > Duration::ZERO {
                debug!(
                    "Rate limiter: waiting {:?} for provider '{}'",
                    wait_time, self.provider
                );
                tokio::time::sleep(wait_time).await;
            }
        }
    }

    /// Take a token without waiting. Returns false if rate limited.
    pub fn try_acquire(&self) -> bool {
        self.lock_bucket().try_acquire()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_is_available_immediately() {
        let limiter = RateLimiter::new(
            "TEST",
            &RateLimit {
                requests_per_minute: 1,
                burst: 3,
            },
        );

        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
    }

    #[tokio::test]
    async fn test_acquire_returns_with_tokens_left() {
        let limiter = RateLimiter::new("TEST", &RateLimit::default());
        limiter.acquire().await;
        assert!(limiter.try_acquire());
    }
}
