//! Single-lane request queue.
//!
//! Callers wait in FIFO order for the lane (tokio's mutex is fair), then
//! for the governor limiter, so two dispatches are never closer together
//! than the configured delay.

use governor::{Quota, RateLimiter};
use nonzero_ext::nonzero;
use std::future::Future;
use std::time::Duration;
use tokio::sync::Mutex;

type DefaultRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

pub struct RequestLane {
    lane: Mutex<()>,
    limiter: Option<DefaultRateLimiter>,
}

impl RequestLane {
    /// A zero delay only serializes.
    pub fn new(min_delay: Duration) -> Self {
        let limiter = Quota::with_period(min_delay)
            .map(|quota| RateLimiter::direct(quota.allow_burst(nonzero!(1u32))));
        Self {
            lane: Mutex::new(()),
            limiter,
        }
    }

    /// Run `request` once it reaches the front of the lane.
    pub async fn run<F, T>(&self, request: F) -> T
    where
        F: Future<Output = T>,
    {
        let _slot = self.lane.lock().await;
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
        request.await
    }
}
