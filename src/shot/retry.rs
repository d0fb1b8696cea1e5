//! Caller-side retry of whole logical operations
//!
//! Responses are occasionally lost or arrive late under load. A failure in
//! the middle of a sequence leaves the emulator in an unknown state, so the
//! only recovery is to run the entire operation again from `Idle`, which
//! re-pauses and reloads the save slot.

use crate::error::BridgeError;
use std::num::NonZeroU32;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first; `None` retries forever
    max_attempts: Option<NonZeroU32>,
    backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl RetryPolicy {
    /// Keeps restarting until the operation succeeds or fails unrecoverably
    pub fn unbounded() -> Self {
        Self {
            max_attempts: None,
            backoff: Duration::ZERO,
        }
    }

    pub fn bounded(max_attempts: NonZeroU32) -> Self {
        Self {
            max_attempts: Some(max_attempts),
            backoff: Duration::ZERO,
        }
    }

    /// A single attempt, failures go straight to the caller
    pub fn never() -> Self {
        Self::bounded(NonZeroU32::MIN)
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn max_attempts(&self) -> Option<NonZeroU32> {
        self.max_attempts
    }

    pub fn backoff(&self) -> Duration {
        self.backoff
    }

    /// Whether another attempt follows attempt number `attempt` (1-based)
    /// that failed with `error`
    pub fn should_retry(&self, attempt: u32, error: &BridgeError) -> bool {
        error.is_recoverable() && self.max_attempts.map_or(true, |max| attempt < max.get())
    }
}
