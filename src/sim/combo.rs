//! Caller-owned running totals: combo streak and ultimate charge
//!
//! The resolver never mutates these; it returns deltas the caller folds in.

use serde::{Deserialize, Serialize};

use crate::consts::{CHARGE_MAX, COMBO_THRESHOLD};

/// How an outcome moves the combo streak
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ComboChange {
    /// Streak untouched (fold outcomes)
    #[default]
    Hold,
    /// +1
    Increment,
    /// Back to 0
    Reset,
}

impl ComboChange {
    /// Transition law for trace accuracy: +1 iff accuracy > 70, else reset
    pub fn for_accuracy(accuracy: u8) -> Self {
        if accuracy > COMBO_THRESHOLD {
            ComboChange::Increment
        } else {
            ComboChange::Reset
        }
    }

    pub fn apply(&self, streak: u32) -> u32 {
        match self {
            ComboChange::Hold => streak,
            ComboChange::Increment => streak.saturating_add(1),
            ComboChange::Reset => 0,
        }
    }
}

/// Consecutive above-threshold resolutions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComboState {
    pub streak: u32,
}

impl ComboState {
    pub fn apply(&mut self, change: ComboChange) -> u32 {
        self.streak = change.apply(self.streak);
        self.streak
    }

    pub fn reset(&mut self) {
        self.streak = 0;
    }
}

/// Capped ultimate gauge with a one-shot ready signal
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UltimateCharge {
    value: u32,
    ready: bool,
}

impl UltimateCharge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Gauge fill 0..=1
    pub fn fraction(&self) -> f32 {
        self.value as f32 / CHARGE_MAX as f32
    }

    /// Add charge. Returns true exactly once: on the call that first
    /// reaches the cap.
    pub fn add(&mut self, delta: u32) -> bool {
        if self.ready {
            return false;
        }
        self.value = self.value.saturating_add(delta).min(CHARGE_MAX);
        if self.value >= CHARGE_MAX {
            self.ready = true;
            log::info!("Ultimate ready");
            return true;
        }
        false
    }

    /// Spend a full gauge. Re-arms the ready signal.
    pub fn consume(&mut self) -> bool {
        if !self.ready {
            return false;
        }
        self.value = 0;
        self.ready = false;
        true
    }
}
