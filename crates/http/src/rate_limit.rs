//! A token-bucket limiter, one independent bucket per route, driven by the
//! shared [`Clock`] abstraction so tests can advance time deterministically.

use parking_lot::Mutex;
use rex_core::Clock;
use std::time::Instant;

struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// One bucket per configured capacity; refills continuously at
/// `capacity` tokens per minute.
pub struct RateLimiter<C: Clock> {
    clock: C,
    capacity: f64,
    per_minute: f64,
    bucket: Mutex<Bucket>,
}

impl<C: Clock> RateLimiter<C> {
    pub fn new(clock: C, per_minute: u32) -> Self {
        let now = clock.now();
        Self {
            clock,
            capacity: per_minute as f64,
            per_minute: per_minute as f64,
            bucket: Mutex::new(Bucket { tokens: per_minute as f64, last_refill: now }),
        }
    }

    /// Attempts to consume one token. Returns `true` when the request is
    /// allowed, `false` when the bucket is empty.
    pub fn try_acquire(&self) -> bool {
        let now = self.clock.now();
        let mut bucket = self.bucket.lock();
        let elapsed = now.saturating_duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * (self.per_minute / 60.0)).min(self.capacity);
        bucket.last_refill = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
#[path = "rate_limit_tests.rs"]
mod tests;
