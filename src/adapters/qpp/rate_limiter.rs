//! Token bucket rate limiter shared by every worker
//!
//! The bucket starts full (`burst` tokens) and refills continuously at
//! `requests_per_second`. Waiters queue on a tokio mutex, which hands the
//! lock out in FIFO order, and the holder sleeps with the lock held so a
//! later caller can never overtake an earlier one.

use crate::config::RateLimitConfig;
use crate::domain::{ExtractError, Result};
use tokio::sync::Mutex;
use tokio::time::{sleep, Duration, Instant};

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

impl Bucket {
    fn refill(&mut self, rate: f64, capacity: f64) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * rate).min(capacity);
        self.last_refill = now;
    }
}

/// Caps the outbound request rate across all workers and years
#[derive(Debug)]
pub struct RateLimiter {
    rate: f64,
    capacity: f64,
    bucket: Mutex<Bucket>,
}

impl RateLimiter {
    /// Creates a limiter allowing `requests_per_second` sustained and
    /// `burst` back-to-back requests
    ///
    /// # Errors
    ///
    /// Returns a configuration error if either value is not positive
    pub fn new(requests_per_second: f64, burst: u32) -> Result<Self> {
        if !(requests_per_second > 0.0 && requests_per_second.is_finite()) {
            return Err(ExtractError::Configuration(format!(
                "requests_per_second must be positive, got {requests_per_second}"
            )));
        }
        if burst == 0 {
            return Err(ExtractError::Configuration(
                "burst must be at least 1".to_string(),
            ));
        }

        let capacity = f64::from(burst);
        Ok(Self {
            rate: requests_per_second,
            capacity,
            bucket: Mutex::new(Bucket {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        })
    }

    pub fn from_config(config: &RateLimitConfig) -> Result<Self> {
        Self::new(config.requests_per_second, config.burst)
    }

    /// Waits for one permit and returns how long the caller waited
    pub async fn acquire(&self) -> Duration {
        let started = Instant::now();
        let mut bucket = self.bucket.lock().await;
        bucket.refill(self.rate, self.capacity);

        if bucket.tokens < 1.0 {
            let deficit = 1.0 - bucket.tokens;
            sleep(Duration::from_secs_f64(deficit / self.rate)).await;
            bucket.refill(self.rate, self.capacity);
        }

        // Float rounding can leave the bucket a hair under one token
        bucket.tokens = (bucket.tokens - 1.0).max(0.0);
        started.elapsed()
    }

    pub fn requests_per_second(&self) -> f64 {
        self.rate
    }

    pub fn burst(&self) -> u32 {
        self.capacity as u32
    }
}
