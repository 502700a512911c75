//! Output events and damage-number projection
//!
//! The controller queues `CombatEvent`s; the presentation layer drains them
//! for sound, particles and floating numbers. Positions come from a
//! caller-maintained map, never from a lookup into the presentation layer.

use std::collections::HashMap;

use serde::Serialize;

use super::countdown::TerminalCause;
use super::key_challenge::KeyBonus;
use super::outcome::{HitGrade, Outcome, TargetId, UltimateHit};
use super::pattern::FoldKind;
use crate::Point;

/// Everything the controller reports outward
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CombatEvent {
    TargetSelected { target: TargetId },
    TraceStarted { pattern: String, time_limit: u32 },
    FoldStarted { pattern: String, kind: FoldKind, time_limit: u32 },
    /// Seconds left after a 1 Hz tick
    CountdownTick { remaining: u32 },
    WaypointHit { index: usize, critical: bool },
    FoldStageHit { stage_index: usize },
    FoldMiss { stage_index: usize, hint_deg: f32 },
    SessionCompleted { accuracy: u8, pattern: String },
    SessionTimedOut,
    SessionCancelled,
    KeyChallengeOpened { key: char, window_ms: u32 },
    KeyChallengeDecided { bonus: KeyBonus },
    OutcomeResolved {
        target: Option<TargetId>,
        outcome: Outcome,
        combo_streak: u32,
        charge: u32,
    },
    UltimateReady,
    UltimateUnleashed { hits: Vec<UltimateHit> },
}

impl CombatEvent {
    /// Terminal cause this event announces, if any
    pub fn terminal_cause(&self) -> Option<TerminalCause> {
        match self {
            CombatEvent::SessionCompleted { .. } => Some(TerminalCause::Completed),
            CombatEvent::SessionTimedOut => Some(TerminalCause::TimedOut),
            CombatEvent::SessionCancelled => Some(TerminalCause::Cancelled),
            _ => None,
        }
    }
}

/// Styling of a floating number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NumberStyle {
    Normal,
    Combo,
    Critical,
    Heal,
    Splash,
    Burn,
}

impl From<HitGrade> for NumberStyle {
    fn from(grade: HitGrade) -> Self {
        match grade {
            HitGrade::Normal => NumberStyle::Normal,
            HitGrade::Combo => NumberStyle::Combo,
            HitGrade::Critical => NumberStyle::Critical,
        }
    }
}

/// A floating number anchored at a target
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DamageNumber {
    pub target: TargetId,
    pub position: Point,
    pub amount: u32,
    pub style: NumberStyle,
}

/// Last-known positions, keyed by target id
pub type PositionMap = HashMap<TargetId, Point>;

/// Floating numbers for one outcome. `caster` anchors heals. Targets
/// missing from `positions` are skipped.
pub fn project_outcome(
    outcome: &Outcome,
    target: Option<TargetId>,
    caster: TargetId,
    positions: &PositionMap,
) -> Vec<DamageNumber> {
    let mut numbers = Vec::new();
    let mut push = |id: TargetId, amount: u32, style: NumberStyle| {
        if amount == 0 {
            return;
        }
        if let Some(&position) = positions.get(&id) {
            numbers.push(DamageNumber {
                target: id,
                position,
                amount,
                style,
            });
        }
    };

    if let Some(id) = target {
        push(id, outcome.damage, outcome.grade.into());
    }
    for hit in &outcome.splash {
        push(hit.target, hit.damage, NumberStyle::Splash);
    }
    push(caster, outcome.heal, NumberStyle::Heal);
    push(caster, outcome.self_damage, NumberStyle::Normal);
    numbers
}

/// A burn tick landing on a target
pub fn project_burn_tick(target: TargetId, damage: u32, positions: &PositionMap) -> Option<DamageNumber> {
    positions.get(&target).map(|&position| DamageNumber {
        target,
        position,
        amount: damage,
        style: NumberStyle::Burn,
    })
}
