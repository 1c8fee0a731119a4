//! CMS QPP Eligibility API adapter
//!
//! The rate-limited, retrying HTTP client and the token bucket it shares
//! with every other worker.

pub mod client;
pub mod models;
pub mod rate_limiter;

pub use client::QppClient;
pub use rate_limiter::RateLimiter;
