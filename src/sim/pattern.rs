//! Pattern definitions
//!
//! Patterns are static configuration: built once from the catalog, validated,
//! and never mutated while an attempt is running.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Point;
use crate::consts::{FOLD_DIFFICULTY_STEP, FOLD_MIN_DIFFICULTY_FACTOR, FOLD_TIERS};

/// Attack kind - selects the payoff modifier applied after scoring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttackKind {
    Crane,
    Dragon,
    /// Multi-hit: damage lands three times
    Butterfly,
    /// Precision strike: bonus on near-perfect traces
    Samurai,
    /// Healing/defensive pattern
    Lotus,
}

impl AttackKind {
    pub const ALL: [AttackKind; 5] = [
        AttackKind::Crane,
        AttackKind::Dragon,
        AttackKind::Butterfly,
        AttackKind::Samurai,
        AttackKind::Lotus,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AttackKind::Crane => "crane",
            AttackKind::Dragon => "dragon",
            AttackKind::Butterfly => "butterfly",
            AttackKind::Samurai => "samurai",
            AttackKind::Lotus => "lotus",
        }
    }
}

/// Elemental affinity (absence is `None` on the owning pattern)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Element {
    Fire,
    Water,
    Wind,
    Earth,
}

impl Element {
    pub fn as_str(&self) -> &'static str {
        match self {
            Element::Fire => "fire",
            Element::Water => "water",
            Element::Wind => "wind",
            Element::Earth => "earth",
        }
    }
}

/// Which side of the exchange a fold is played for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FoldKind {
    Attack,
    Defense,
}

/// Rejected pattern definitions
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PatternError {
    #[error("pattern `{name}` has {count} point(s), at least 2 required")]
    TooFewPoints { name: String, count: usize },

    #[error("pattern `{name}` has a non-positive time limit")]
    NonPositiveTimeLimit { name: String },

    #[error("fold pattern `{name}` has difficulty {difficulty}, expected 1..={max}")]
    DifficultyOutOfRange { name: String, difficulty: u8, max: u8 },
}

fn check_points(name: &str, points: &[Point]) -> Result<(), PatternError> {
    if points.len() < 2 {
        return Err(PatternError::TooFewPoints {
            name: name.to_string(),
            count: points.len(),
        });
    }
    Ok(())
}

/// A continuous-trace pattern, authored in reference (600x400) space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TracePattern {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Ordered waypoints
    pub points: Vec<Point>,
    pub attack_kind: AttackKind,
    /// Base damage at 100% accuracy
    pub damage: u32,
    /// Seconds allowed for the attempt
    pub time_limit: u32,
    #[serde(default)]
    pub element: Option<Element>,
}

impl TracePattern {
    pub fn validate(&self) -> Result<(), PatternError> {
        check_points(&self.name, &self.points)?;
        if self.time_limit == 0 {
            return Err(PatternError::NonPositiveTimeLimit {
                name: self.name.clone(),
            });
        }
        Ok(())
    }

    /// Lotus-kind patterns answer enemy attacks instead of dealing damage
    pub fn is_defensive(&self) -> bool {
        self.attack_kind == AttackKind::Lotus
    }
}

/// A discrete fold pattern, authored in normalized (0..1) space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoldPattern {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Ordered fold stages
    pub points: Vec<Point>,
    /// Declared difficulty tier, 1..=5
    pub difficulty: u8,
    /// Base damage (attack) or healing (defense)
    pub value: u32,
    /// Seconds allowed; the caller's tuning default applies when absent
    #[serde(default)]
    pub time_limit: Option<u32>,
    #[serde(default)]
    pub element: Option<Element>,
}

impl FoldPattern {
    pub fn validate(&self) -> Result<(), PatternError> {
        check_points(&self.name, &self.points)?;
        if !(1..=FOLD_TIERS).contains(&self.difficulty) {
            return Err(PatternError::DifficultyOutOfRange {
                name: self.name.clone(),
                difficulty: self.difficulty,
                max: FOLD_TIERS,
            });
        }
        if self.time_limit == Some(0) {
            return Err(PatternError::NonPositiveTimeLimit {
                name: self.name.clone(),
            });
        }
        Ok(())
    }

    /// Tolerance multiplier: higher difficulty shrinks the hit radius
    pub fn difficulty_factor(&self) -> f32 {
        difficulty_factor(self.difficulty)
    }
}

/// `max(0.7, 1 - difficulty * 0.05)`
pub fn difficulty_factor(difficulty: u8) -> f32 {
    (1.0 - difficulty as f32 * FOLD_DIFFICULTY_STEP).max(FOLD_MIN_DIFFICULTY_FACTOR)
}
