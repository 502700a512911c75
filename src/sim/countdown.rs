//! 1 Hz attempt countdown
//!
//! Owned by exactly one session. The `resolved` flag is the single guard
//! shared by completion, timeout and cancellation: whichever terminal cause
//! arrives first wins, later ones are ignored.

use serde::{Deserialize, Serialize};

/// Why an attempt stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminalCause {
    /// The scorer saw the last waypoint/stage
    Completed,
    /// The countdown reached zero while still active
    TimedOut,
    /// The caller backed out
    Cancelled,
}

/// Countdown in whole seconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Countdown {
    remaining: u32,
    limit: u32,
    resolved: Option<TerminalCause>,
}

impl Countdown {
    pub fn new(limit_secs: u32) -> Self {
        Self {
            remaining: limit_secs,
            limit: limit_secs,
            resolved: None,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Fraction of time left, 0..=1 (drives the timer colour)
    pub fn fraction_left(&self) -> f32 {
        if self.limit == 0 {
            0.0
        } else {
            self.remaining as f32 / self.limit as f32
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.is_some()
    }

    pub fn cause(&self) -> Option<TerminalCause> {
        self.resolved
    }

    /// Advance one second. Returns true only on the tick that expires it.
    pub fn tick(&mut self) -> bool {
        if self.resolved.is_some() {
            return false;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.resolved = Some(TerminalCause::TimedOut);
            return true;
        }
        false
    }

    /// Resolve with `cause` unless already resolved. Returns true if this
    /// call won the race.
    pub fn resolve(&mut self, cause: TerminalCause) -> bool {
        if self.resolved.is_some() {
            return false;
        }
        self.resolved = Some(cause);
        true
    }

    /// Stop the countdown on behalf of the caller
    pub fn cancel(&mut self) -> bool {
        self.resolve(TerminalCause::Cancelled)
    }
}
