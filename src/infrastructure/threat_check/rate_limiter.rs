//! Client-side request budget for the threat intelligence API.
//!
//! The upstream does not advertise its quota, so the client keeps its own
//! conservative fixed-window count. Calls over budget fail immediately; nothing
//! is queued.

use std::time::{Duration, Instant};

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

/// Requests allowed per window by default.
pub const DEFAULT_LIMIT: u32 = 1000;

/// Window length by default.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Point-in-time view of the budget.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitInfo {
    pub remaining: u32,
    pub reset_time: DateTime<Utc>,
    pub limit: u32,
}

#[derive(Debug)]
pub struct RateLimiter {
    limit: u32,
    remaining: u32,
    window: Duration,
    reset_time: Instant,
}

impl RateLimiter {
    /// Creates a full budget whose first window starts at `now`.
    pub fn new(limit: u32, window: Duration, now: Instant) -> Self {
        Self {
            limit,
            remaining: limit,
            window,
            reset_time: now + window,
        }
    }

    /// Takes one request from the budget.
    ///
    /// A window that has ended is refilled to `limit` first.
    ///
    /// # Errors
    ///
    /// Returns the time until the window resets when the budget is spent.
    pub fn try_acquire(&mut self, now: Instant) -> Result<(), Duration> {
        self.refill(now);

        if self.remaining == 0 {
            return Err(self.reset_time.saturating_duration_since(now));
        }

        self.remaining -= 1;
        Ok(())
    }

    pub fn remaining(&mut self, now: Instant) -> u32 {
        self.refill(now);
        self.remaining
    }

    pub fn info(&mut self, now: Instant) -> RateLimitInfo {
        self.refill(now);
        let until_reset = self.reset_time.saturating_duration_since(now);

        RateLimitInfo {
            remaining: self.remaining,
            reset_time: Utc::now() + TimeDelta::from_std(until_reset).unwrap_or(TimeDelta::zero()),
            limit: self.limit,
        }
    }

    fn refill(&mut self, now: Instant) {
        if now > self.reset_time {
            self.remaining = self.limit;
            self.reset_time = now + self.window;
        }
    }
}
