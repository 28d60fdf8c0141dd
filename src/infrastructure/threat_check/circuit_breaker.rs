//! Circuit breaker guarding the threat intelligence API.
//!
//! ```text
//!   CLOSED --(threshold consecutive failures)--> OPEN
//!   OPEN   --(reset timeout elapsed, next call)--> HALF_OPEN
//!   any    --(success)--> CLOSED
//!   HALF_OPEN --(failure)--> OPEN
//! ```

use std::time::{Duration, Instant};

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use tracing::{info, warn};

/// Consecutive failures that open the breaker by default.
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 5;

/// Time the breaker stays open by default.
pub const DEFAULT_RESET_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

/// Point-in-time view of the breaker, for health output and responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitBreakerInfo {
    pub state: CircuitState,
    pub failure_count: u32,
    pub last_failure_time: Option<DateTime<Utc>>,
    pub next_attempt_time: Option<DateTime<Utc>>,
}

/// Failure accounting for one upstream dependency.
///
/// All methods take the current instant so the state machine can be driven
/// deterministically.
#[derive(Debug)]
pub struct CircuitBreaker {
    state: CircuitState,
    failure_count: u32,
    last_failure_time: Option<Instant>,
    next_attempt_time: Option<Instant>,
    failure_threshold: u32,
    reset_timeout: Duration,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, reset_timeout: Duration) -> Self {
        Self {
            state: CircuitState::Closed,
            failure_count: 0,
            last_failure_time: None,
            next_attempt_time: None,
            failure_threshold: failure_threshold.max(1),
            reset_timeout,
        }
    }

    pub fn state(&self) -> CircuitState {
        self.state
    }

    pub fn failure_count(&self) -> u32 {
        self.failure_count
    }

    /// Returns whether a call would be let through at `now`, without changing
    /// state.
    ///
    /// # Errors
    ///
    /// Returns the remaining cool-down while the breaker is open.
    pub fn check(&self, now: Instant) -> Result<(), Duration> {
        if self.state != CircuitState::Open {
            return Ok(());
        }

        match self.next_attempt_time {
            Some(next) if now < next => Err(next - now),
            _ => Ok(()),
        }
    }

    /// Decides whether a call may go through at `now`.
    ///
    /// An open breaker whose reset timeout has elapsed moves to HALF_OPEN and
    /// lets the call through.
    ///
    /// # Errors
    ///
    /// Returns the remaining cool-down while the breaker is open.
    pub fn try_acquire(&mut self, now: Instant) -> Result<(), Duration> {
        self.check(now)?;

        if self.state == CircuitState::Open {
            info!("Circuit breaker half-open, allowing a trial request");
            self.state = CircuitState::HalfOpen;
        }
        Ok(())
    }

    /// Records a successful call; the breaker closes and forgets failures.
    pub fn record_success(&mut self) {
        if self.state != CircuitState::Closed {
            info!("Circuit breaker closed after successful request");
        }
        self.state = CircuitState::Closed;
        self.failure_count = 0;
        self.next_attempt_time = None;
    }

    /// Records a failed call at `now`, opening the breaker at the threshold.
    pub fn record_failure(&mut self, now: Instant) {
        self.failure_count = self.failure_count.saturating_add(1);
        self.last_failure_time = Some(now);

        if self.failure_count >= self.failure_threshold {
            if self.state != CircuitState::Open {
                metrics::counter!("circuit_breaker_opened_total").increment(1);
                warn!(
                    "Circuit breaker opened after {} consecutive failures, retrying in {:?}",
                    self.failure_count, self.reset_timeout
                );
            }
            self.state = CircuitState::Open;
            self.next_attempt_time = Some(now + self.reset_timeout);
        }
    }

    /// Snapshot with wall-clock timestamps relative to `now`.
    pub fn info(&self, now: Instant) -> CircuitBreakerInfo {
        let wall_now = Utc::now();
        let to_wall = |at: Instant| {
            if at >= now {
                wall_now + TimeDelta::from_std(at - now).unwrap_or(TimeDelta::zero())
            } else {
                wall_now - TimeDelta::from_std(now - at).unwrap_or(TimeDelta::zero())
            }
        };

        CircuitBreakerInfo {
            state: self.state,
            failure_count: self.failure_count,
            last_failure_time: self.last_failure_time.map(to_wall),
            next_attempt_time: self.next_attempt_time.map(to_wall),
        }
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(DEFAULT_FAILURE_THRESHOLD, DEFAULT_RESET_TIMEOUT)
    }
}
