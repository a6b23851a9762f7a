//! Sliding-window request budget for the bookmarks API.
//!
//! The provider allows a fixed number of requests per trailing window
//! (180 requests per 15 minutes for the bookmarks endpoint). [`RateLimiter`]
//! keeps the timestamps of recent calls and tells the caller how long to wait
//! before the next call fits inside the budget.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use bookmark_sync::api::RateLimiter;
//!
//! # async fn example() {
//! let mut limiter = RateLimiter::new(2, Duration::from_secs(1));
//! limiter.wait_if_needed().await;
//! limiter.record_call();
//! assert!(limiter.can_proceed());
//! # }
//! ```

use std::collections::VecDeque;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, instrument};

/// Default number of requests allowed per window.
pub const DEFAULT_MAX_REQUESTS: usize = 180;

/// Default trailing window (15 minutes).
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(15 * 60);

/// Added to every computed wait so the oldest call has definitely aged out.
const SAFETY_MARGIN: Duration = Duration::from_millis(100);

/// Sliding-window rate limiter.
///
/// A call counts against the budget only while it is younger than the window.
/// Timestamps use [`tokio::time::Instant`], so tests can drive the limiter
/// with a paused clock.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    /// Call times, oldest first.
    timestamps: VecDeque<Instant>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW)
    }
}

impl RateLimiter {
    /// Creates a limiter allowing `max_requests` calls per `window`.
    ///
    /// A cap of zero is treated as one.
    #[must_use]
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests: max_requests.max(1),
            window,
            timestamps: VecDeque::new(),
        }
    }

    /// Returns the configured cap.
    #[must_use]
    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    /// Returns the configured window.
    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Returns true if another call fits in the current window.
    pub fn can_proceed(&mut self) -> bool {
        self.prune(Instant::now());
        self.timestamps.len() < self.max_requests
    }

    /// Records a call made now.
    pub fn record_call(&mut self) {
        self.timestamps.push_back(Instant::now());
    }

    /// Number of calls still counting against the budget.
    pub fn calls_in_window(&mut self) -> usize {
        self.prune(Instant::now());
        self.timestamps.len()
    }

    /// How long the caller must wait before the next call fits.
    ///
    /// Zero while under the cap; otherwise the time until the oldest call in
    /// the window ages out, plus a small safety margin.
    pub fn wait_time(&mut self) -> Duration {
        let now = Instant::now();
        self.prune(now);
        if self.timestamps.len() < self.max_requests {
            return Duration::ZERO;
        }
        match self.timestamps.front() {
            Some(&oldest) => (oldest + self.window).saturating_duration_since(now) + SAFETY_MARGIN,
            None => Duration::ZERO,
        }
    }

    /// [`wait_time`](Self::wait_time) in whole milliseconds.
    pub fn wait_time_ms(&mut self) -> u64 {
        u64::try_from(self.wait_time().as_millis()).unwrap_or(u64::MAX)
    }

    /// Sleeps until the next call fits in the window.
    #[instrument(level = "debug", skip(self), fields(max_requests = self.max_requests))]
    pub async fn wait_if_needed(&mut self) {
        let wait = self.wait_time();
        if wait.is_zero() {
            return;
        }
        debug!(wait_ms = wait.as_millis(), "request budget exhausted, waiting");
        tokio::time::sleep(wait).await;
    }

    fn prune(&mut self, now: Instant) {
        while let Some(&oldest) = self.timestamps.front() {
            if now.saturating_duration_since(oldest) >= self.window {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }
    }
}
