//! Discrete fold scorer
//!
//! The paper-folding minigame: click each fold stage in order. Tolerance
//! scales with surface width and shrinks with declared difficulty. Misses
//! are free; only the countdown can fail the attempt.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::countdown::{Countdown, TerminalCause};
use super::geometry::{Surface, distance, heading_deg};
use super::pattern::{FoldKind, FoldPattern, PatternError, difficulty_factor};
use crate::Point;
use crate::consts::{FOLD_MIN_TOLERANCE, FOLD_TOLERANCE_FRACTION, MAX_CLICK_HISTORY};

/// Hit radius for a fold stage: `max(width * 0.15 * factor, 40)`
pub fn fold_tolerance(surface_width: f32, difficulty: u8) -> f32 {
    (surface_width * FOLD_TOLERANCE_FRACTION * difficulty_factor(difficulty)).max(FOLD_MIN_TOLERANCE)
}

/// How an attempt ended, as reported to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoldResult {
    pub success: bool,
    /// Present on success only
    pub pattern_name: Option<String>,
    pub kind: FoldKind,
}

/// Result of one click
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Click {
    /// Landed on the current stage
    Hit { stage_index: usize, completed: bool },
    /// Missed; `hint_deg` points from the click toward the target
    Miss { stage_index: usize, hint_deg: f32 },
    /// Arrived during the stage pause or after resolution
    Ignored,
}

impl Click {
    pub fn is_hit(&self) -> bool {
        matches!(self, Click::Hit { .. })
    }
}

/// One attempt at a fold pattern
#[derive(Debug, Clone)]
pub struct FoldSession {
    pattern: FoldPattern,
    kind: FoldKind,
    surface: Surface,
    stage_index: usize,
    /// Recent raw clicks, feedback only
    click_history: VecDeque<Point>,
    countdown: Countdown,
    /// Clicks are ignored while the fold animation plays
    input_lock_ms: u32,
    stage_pause_ms: u32,
    result: Option<FoldResult>,
}

impl FoldSession {
    /// Start an attempt; `default_time_limit` applies when the pattern has none
    pub fn begin(
        pattern: FoldPattern,
        kind: FoldKind,
        surface: Surface,
        default_time_limit: u32,
    ) -> Result<Self, PatternError> {
        pattern.validate()?;
        let time_limit = pattern.time_limit.unwrap_or(default_time_limit);
        if time_limit == 0 {
            return Err(PatternError::NonPositiveTimeLimit {
                name: pattern.name.clone(),
            });
        }
        log::info!(
            "Fold started: {} ({:?}, difficulty {}, {}s)",
            pattern.name,
            kind,
            pattern.difficulty,
            time_limit
        );
        Ok(Self {
            pattern,
            kind,
            surface,
            stage_index: 0,
            click_history: VecDeque::with_capacity(MAX_CLICK_HISTORY + 1),
            countdown: Countdown::new(time_limit),
            input_lock_ms: 0,
            stage_pause_ms: 0,
            result: None,
        })
    }

    /// Lock input for `ms` after every successful fold
    pub fn with_stage_pause(mut self, ms: u32) -> Self {
        self.stage_pause_ms = ms;
        self
    }

    pub fn pattern(&self) -> &FoldPattern {
        &self.pattern
    }

    pub fn kind(&self) -> FoldKind {
        self.kind
    }

    pub fn stage_index(&self) -> usize {
        self.stage_index
    }

    pub fn click_history(&self) -> impl Iterator<Item = &Point> {
        self.click_history.iter()
    }

    pub fn time_remaining(&self) -> u32 {
        self.countdown.remaining()
    }

    pub fn countdown(&self) -> &Countdown {
        &self.countdown
    }

    pub fn is_terminal(&self) -> bool {
        self.countdown.is_resolved()
    }

    pub fn terminal_cause(&self) -> Option<TerminalCause> {
        self.countdown.cause()
    }

    pub fn is_input_locked(&self) -> bool {
        self.input_lock_ms > 0
    }

    /// Resolved result (success or timeout)
    pub fn result(&self) -> Option<&FoldResult> {
        self.result.as_ref()
    }

    /// Current hit radius on this surface
    pub fn tolerance(&self) -> f32 {
        fold_tolerance(self.surface.width, self.pattern.difficulty)
    }

    /// Current stage target mapped onto the surface
    pub fn current_target(&self) -> Option<Point> {
        self.pattern
            .points
            .get(self.stage_index)
            .map(|p| self.surface.denormalize(*p))
    }

    /// Register a click at surface coordinates
    pub fn register_click(&mut self, point: Point) -> Click {
        if self.is_terminal() {
            log::warn!("Click after fold resolved ignored ({:?})", self.terminal_cause());
            return Click::Ignored;
        }
        if self.is_input_locked() {
            return Click::Ignored;
        }

        self.click_history.push_back(point);
        while self.click_history.len() > MAX_CLICK_HISTORY {
            self.click_history.pop_front();
        }

        let Some(target) = self.current_target() else {
            return Click::Ignored;
        };

        if distance(point, target) < self.tolerance() {
            self.stage_index += 1;
            self.input_lock_ms = self.stage_pause_ms;
            let completed = self.stage_index == self.pattern.points.len();
            log::debug!("Fold stage {} hit", self.stage_index);
            if completed && self.countdown.resolve(TerminalCause::Completed) {
                log::info!("Fold completed: {}", self.pattern.name);
                self.result = Some(FoldResult {
                    success: true,
                    pattern_name: Some(self.pattern.name.clone()),
                    kind: self.kind,
                });
            }
            Click::Hit {
                stage_index: self.stage_index,
                completed,
            }
        } else {
            log::debug!("Fold miss at stage {}", self.stage_index);
            Click::Miss {
                stage_index: self.stage_index,
                hint_deg: heading_deg(point, target),
            }
        }
    }

    /// Let the stage pause run down
    pub fn advance_ms(&mut self, ms: u32) {
        self.input_lock_ms = self.input_lock_ms.saturating_sub(ms);
    }

    fn fail(&mut self) -> FoldResult {
        let result = FoldResult {
            success: false,
            pattern_name: None,
            kind: self.kind,
        };
        self.result = Some(result.clone());
        result
    }

    /// One second elapsed. Returns the failure on the tick that expires it.
    pub fn tick(&mut self) -> Option<FoldResult> {
        if self.countdown.tick() {
            log::info!("Fold timed out at stage {}", self.stage_index);
            return Some(self.fail());
        }
        None
    }

    /// Force a timeout; inert once resolved
    pub fn timeout(&mut self) -> Option<FoldResult> {
        if self.countdown.resolve(TerminalCause::TimedOut) {
            return Some(self.fail());
        }
        None
    }

    /// Caller closed the minigame; inert once resolved
    pub fn cancel(&mut self) -> bool {
        self.countdown.cancel()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(difficulty: u8) -> FoldPattern {
        FoldPattern {
            name: "Crane Strike".into(),
            description: String::new(),
            points: vec![
                Point::new(0.2, 0.2),
                Point::new(0.8, 0.2),
                Point::new(0.5, 0.5),
            ],
            difficulty,
            value: 25,
            time_limit: None,
            element: None,
        }
    }

    fn session() -> FoldSession {
        FoldSession::begin(pattern(1), FoldKind::Attack, Surface::new(600.0, 400.0), 30).unwrap()
    }

    #[test]
    fn test_tolerance_formula() {
        // 600 * 0.15 * 0.95
        assert!((fold_tolerance(600.0, 1) - 85.5).abs() < 1e-3);
        assert!((fold_tolerance(600.0, 5) - 67.5).abs() < 1e-3);
        // Small surfaces hit the absolute floor
        assert_eq!(fold_tolerance(100.0, 3), FOLD_MIN_TOLERANCE);
    }

    #[test]
    fn test_full_fold_sequence() {
        let mut s = session();
        assert_eq!(
            s.register_click(Point::new(120.0, 80.0)),
            Click::Hit { stage_index: 1, completed: false }
        );
        assert!(s.register_click(Point::new(480.0, 80.0)).is_hit());
        assert_eq!(
            s.register_click(Point::new(300.0, 200.0)),
            Click::Hit { stage_index: 3, completed: true }
        );
        let result = s.result().unwrap();
        assert!(result.success);
        assert_eq!(result.pattern_name.as_deref(), Some("Crane Strike"));
        assert_eq!(result.kind, FoldKind::Attack);
        assert_eq!(s.register_click(Point::new(300.0, 200.0)), Click::Ignored);
    }

    #[test]
    fn test_miss_is_free_and_hints_direction() {
        let mut s = session();
        match s.register_click(Point::new(520.0, 80.0)) {
            Click::Miss { stage_index, hint_deg } => {
                assert_eq!(stage_index, 0);
                // Target is due left
                assert!((hint_deg.abs() - 180.0).abs() < 1e-3);
            }
            other => panic!("expected miss, got {other:?}"),
        }
        assert_eq!(s.stage_index(), 0);
        assert!(s.register_click(Point::new(120.0, 80.0)).is_hit());
    }

    #[test]
    fn test_stage_pause_ignores_clicks() {
        let mut s = session().with_stage_pause(800);
        assert!(s.register_click(Point::new(120.0, 80.0)).is_hit());
        assert_eq!(s.register_click(Point::new(480.0, 80.0)), Click::Ignored);
        s.advance_ms(500);
        assert!(s.is_input_locked());
        s.advance_ms(300);
        assert!(s.register_click(Point::new(480.0, 80.0)).is_hit());
    }

    #[test]
    fn test_click_history_bounded() {
        let mut s = session();
        for i in 0..25 {
            s.register_click(Point::new(590.0, 390.0 - i as f32));
        }
        assert_eq!(s.click_history().count(), MAX_CLICK_HISTORY);
    }

    #[test]
    fn test_timeout_without_clicks() {
        let mut s = FoldSession::begin(pattern(2), FoldKind::Defense, Surface::reference(), 5).unwrap();
        for _ in 0..4 {
            assert!(s.tick().is_none());
        }
        let result = s.tick().unwrap();
        assert!(!result.success);
        assert_eq!(result.kind, FoldKind::Defense);
        assert_eq!(s.stage_index(), 0);
        assert!(s.tick().is_none());
    }

    #[test]
    fn test_timeout_ignores_partial_progress() {
        let mut s = session();
        s.register_click(Point::new(120.0, 80.0));
        let result = s.timeout().unwrap();
        assert_eq!(
            result,
            FoldResult { success: false, pattern_name: None, kind: FoldKind::Attack }
        );
    }

    #[test]
    fn test_cancel_blocks_timeout() {
        let mut s = session();
        assert!(s.cancel());
        assert!(s.timeout().is_none());
        assert!(s.result().is_none());
    }

    #[test]
    fn test_pattern_time_limit_overrides_default() {
        let mut p = pattern(1);
        p.time_limit = Some(12);
        let s = FoldSession::begin(p, FoldKind::Attack, Surface::reference(), 30).unwrap();
        assert_eq!(s.time_remaining(), 12);
        assert!(
            FoldSession::begin(pattern(1), FoldKind::Attack, Surface::reference(), 0).is_err()
        );
    }
}
