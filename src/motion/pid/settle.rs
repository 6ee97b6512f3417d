//! Settle detection for closed-loop motions.
//!
//! A [`SettleDetector`] watches an error signal over time and decides when a
//! motion is done. It knows nothing about the controller that produced the
//! error.
//!
//! There are three ways to settle:
//!
//! - **Small error**: the error stayed within `small_error` for
//!   `small_error_time`.
//! - **Large error**: the error stayed within `large_error` for
//!   `large_error_time`. This catches motions that hover near the target
//!   without ever converging tightly.
//! - **Timeout**: `timeout` elapsed since the motion started.
//!
//! Leaving a band resets that band's dwell timer. Once settled, the
//! detector stays settled.

use std::time::Duration;

/// Thresholds and timeouts for a [`SettleDetector`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExitConditions {
    /// Outer tolerance band.
    pub large_error:      f64,
    /// Inner tolerance band.
    pub small_error:      f64,
    /// Dwell required inside the outer band.
    pub large_error_time: Duration,
    /// Dwell required inside the inner band.
    pub small_error_time: Duration,
    /// Hard limit on the whole motion.
    pub timeout:          Duration,
}

impl ExitConditions {
    /// Creates exit conditions. Times are in milliseconds.
    pub fn new(
        large_error: f64,
        small_error: f64,
        large_error_time: u64,
        small_error_time: u64,
        timeout: u64,
    ) -> Self {
        Self {
            large_error,
            small_error,
            large_error_time: Duration::from_millis(large_error_time),
            small_error_time: Duration::from_millis(small_error_time),
            timeout: Duration::from_millis(timeout),
        }
    }
}

/// Why a detector settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleReason {
    SmallError,
    LargeError,
    Timeout,
}

/// Detector state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleState {
    Active,
    Settled(SettleReason),
}

/// Dual-band settle state machine.
#[derive(Debug, Clone)]
pub struct SettleDetector {
    conditions:  ExitConditions,
    large_since: Option<Duration>,
    small_since: Option<Duration>,
    state:       SettleState,
}

impl SettleDetector {
    pub fn new(conditions: ExitConditions) -> Self {
        Self {
            conditions,
            large_since: None,
            small_since: None,
            state: SettleState::Active,
        }
    }

    pub fn conditions(&self) -> &ExitConditions { &self.conditions }

    pub fn state(&self) -> SettleState { self.state }

    pub fn is_settled(&self) -> bool { matches!(self.state, SettleState::Settled(_)) }

    /// Feeds one error sample. `elapsed` is the time since the motion
    /// started and must not decrease between calls.
    pub fn poll(&mut self, error: f64, elapsed: Duration) -> SettleState {
        if self.is_settled() {
            return self.state;
        }
        let c = self.conditions;
        if elapsed >= c.timeout {
            self.state = SettleState::Settled(SettleReason::Timeout);
            return self.state;
        }

        let error = error.abs();
        let small = dwell(&mut self.small_since, error <= c.small_error, elapsed);
        let large = dwell(&mut self.large_since, error <= c.large_error, elapsed);

        if small.is_some_and(|d| d >= c.small_error_time) {
            self.state = SettleState::Settled(SettleReason::SmallError);
        } else if large.is_some_and(|d| d >= c.large_error_time) {
            self.state = SettleState::Settled(SettleReason::LargeError);
        }
        self.state
    }
}

fn dwell(since: &mut Option<Duration>, inside: bool, now: Duration) -> Option<Duration> {
    if !inside {
        *since = None;
        return None;
    }
    let start = *since.get_or_insert(now);
    Some(now.saturating_sub(start))
}
