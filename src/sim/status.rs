//! Elemental statuses attached to targets
//!
//! Burn deals periodic damage; slow dampens the target's attack chance.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::round_points;

/// Kind of lingering effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Burn,
    Slow,
}

/// A status as produced by the outcome resolver
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElementalStatus {
    pub kind: StatusKind,
    pub duration_ms: u32,
    /// Damage per tick (burn) - zero for slow
    pub tick_value: u32,
    /// Zero when the status does not tick
    pub tick_interval_ms: u32,
    /// Multiplier on the target's attack chance (slow)
    pub slow_factor: f32,
}

impl ElementalStatus {
    /// Burn scaled from the hit that applied it
    pub fn burn(hit_damage: u32, tick_interval_ms: u32) -> Self {
        Self {
            kind: StatusKind::Burn,
            duration_ms: BURN_DURATION_MS,
            tick_value: round_points(hit_damage as f32 * BURN_TICK_FACTOR),
            tick_interval_ms,
            slow_factor: 1.0,
        }
    }

    pub fn slow() -> Self {
        Self {
            kind: StatusKind::Slow,
            duration_ms: SLOW_DURATION_MS,
            tick_value: 0,
            tick_interval_ms: 0,
            slow_factor: SLOW_FACTOR,
        }
    }
}

/// What advancing a status produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusStep {
    pub damage: u32,
    pub ticks: u32,
    pub expired: bool,
}

/// A status running on a target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveStatus {
    pub status: ElementalStatus,
    elapsed_ms: u32,
    since_tick_ms: u32,
}

impl ActiveStatus {
    pub fn new(status: ElementalStatus) -> Self {
        Self {
            status,
            elapsed_ms: 0,
            since_tick_ms: 0,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.elapsed_ms >= self.status.duration_ms
    }

    pub fn remaining_ms(&self) -> u32 {
        self.status.duration_ms.saturating_sub(self.elapsed_ms)
    }

    /// Scale applied to the target's attack chance while active
    pub fn attack_chance_factor(&self) -> f32 {
        if self.is_expired() {
            1.0
        } else {
            self.status.slow_factor
        }
    }

    /// Advance by `ms`, collecting every tick that falls inside the
    /// remaining duration
    pub fn advance(&mut self, ms: u32) -> StatusStep {
        if self.is_expired() {
            return StatusStep {
                expired: true,
                ..Default::default()
            };
        }
        let step_ms = ms.min(self.remaining_ms());
        self.elapsed_ms += step_ms;

        let mut ticks = 0;
        if self.status.tick_interval_ms > 0 {
            self.since_tick_ms += step_ms;
            while self.since_tick_ms >= self.status.tick_interval_ms {
                self.since_tick_ms -= self.status.tick_interval_ms;
                ticks += 1;
            }
        }
        StatusStep {
            damage: ticks * self.status.tick_value,
            ticks,
            expired: self.is_expired(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burn_ticks_over_duration() {
        let mut burn = ActiveStatus::new(ElementalStatus::burn(120, BURN_TICK_MS));
        assert_eq!(burn.status.tick_value, 12);

        let step = burn.advance(1_000);
        assert_eq!(step.ticks, 0);
        let step = burn.advance(3_000);
        assert_eq!(step.ticks, 2);
        assert_eq!(step.damage, 24);

        // Overshooting the end only counts ticks inside the duration
        let step = burn.advance(60_000);
        assert_eq!(step.ticks, 3);
        assert!(step.expired);
        assert_eq!(burn.advance(2_000), StatusStep { expired: true, ..Default::default() });
    }

    #[test]
    fn test_slow_halves_attack_chance_until_expiry() {
        let mut slow = ActiveStatus::new(ElementalStatus::slow());
        assert_eq!(slow.attack_chance_factor(), 0.5);
        assert_eq!(slow.advance(14_999).damage, 0);
        assert!(!slow.is_expired());
        assert!(slow.advance(1).expired);
        assert_eq!(slow.attack_chance_factor(), 1.0);
    }
}
