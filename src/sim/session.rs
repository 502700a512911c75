//! Timing / session controller
//!
//! Owns at most one attempt at a time and walks it through
//! `Idle -> Targeting -> Active -> {Completed, TimedOut} -> Idle`.
//! Cancellation discards the attempt synchronously and returns to `Idle`.
//!
//! Time enters only through [`SessionController::update`]: a millisecond
//! accumulator turns host frame deltas into 1 Hz countdown ticks and also
//! runs the fold stage pause, the key window and the completion banner.
//! Completion is decided by the scorers on input, never by the timer.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::Serialize;
use thiserror::Error;

use super::combo::{ComboState, UltimateCharge};
use super::events::CombatEvent;
use super::fold::{Click, FoldResult, FoldSession};
use super::key_challenge::{self, KeyBonus, KeyChallenge};
use super::outcome::{
    FoldContext, Outcome, OutcomeResolver, TargetId, TraceContext, UltimateHit, UltimateTarget,
};
use super::pattern::{FoldKind, FoldPattern, PatternError, TracePattern};
use super::trace::{SampleFeedback, TraceSession};
use crate::Point;
use crate::consts::TICK_MS;
use crate::tuning::Tuning;

/// Which scorer an active attempt runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActiveKind {
    Tracing,
    Folding,
}

/// Controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    #[default]
    Idle,
    /// Target chosen, no attempt yet
    Targeting,
    Active(ActiveKind),
    /// Scorer finished; key window and/or banner hold running
    Completed,
    /// Countdown ran out; banner hold running
    TimedOut,
}

/// What a trace attempt answers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TracePurpose {
    Attack,
    /// Blocking an enemy hit of `incoming` damage
    Defense { incoming: u32 },
}

/// Controller misuse
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("cannot start an attempt while {0:?}")]
    Busy(SessionPhase),
    #[error(transparent)]
    Pattern(#[from] PatternError),
    #[error("ultimate gauge is not full")]
    UltimateNotReady,
}

#[derive(Debug)]
enum Attempt {
    Trace {
        session: TraceSession,
        purpose: TracePurpose,
    },
    Fold {
        session: FoldSession,
        /// Live targets other than the primary, for wind splash
        others: Vec<TargetId>,
    },
}

/// Drives one attempt at a time and folds outcomes into the running
/// combo streak and ultimate charge
#[derive(Debug)]
pub struct SessionController {
    tuning: Tuning,
    resolver: OutcomeResolver,
    rng: Pcg32,
    phase: SessionPhase,
    target: Option<TargetId>,
    attempt: Option<Attempt>,
    key_challenge: Option<KeyChallenge>,
    /// Resolved outcome waiting out the banner hold
    pending: Option<Outcome>,
    banner_ms: u32,
    tick_accumulator_ms: u32,
    combo: ComboState,
    charge: UltimateCharge,
    events: Vec<CombatEvent>,
}

impl SessionController {
    pub fn new(tuning: Tuning, resolver: OutcomeResolver, seed: u64) -> Self {
        let resolver = resolver.with_ultimate(tuning.ultimate_enabled);
        Self {
            tuning,
            resolver,
            rng: Pcg32::seed_from_u64(seed),
            phase: SessionPhase::Idle,
            target: None,
            attempt: None,
            key_challenge: None,
            pending: None,
            banner_ms: 0,
            tick_accumulator_ms: 0,
            combo: ComboState::default(),
            charge: UltimateCharge::new(),
            events: Vec::new(),
        }
    }

    // ------------------------------------------------------------------
    // State
    // ------------------------------------------------------------------

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn target(&self) -> Option<TargetId> {
        self.target
    }

    pub fn combo_streak(&self) -> u32 {
        self.combo.streak
    }

    pub fn charge(&self) -> &UltimateCharge {
        &self.charge
    }

    pub fn trace(&self) -> Option<&TraceSession> {
        match &self.attempt {
            Some(Attempt::Trace { session, .. }) => Some(session),
            _ => None,
        }
    }

    pub fn fold(&self) -> Option<&FoldSession> {
        match &self.attempt {
            Some(Attempt::Fold { session, .. }) => Some(session),
            _ => None,
        }
    }

    pub fn key_challenge(&self) -> Option<&KeyChallenge> {
        self.key_challenge.as_ref()
    }

    /// Seconds left on the running attempt
    pub fn time_remaining(&self) -> Option<u32> {
        match &self.attempt {
            Some(Attempt::Trace { session, .. }) => Some(session.time_remaining()),
            Some(Attempt::Fold { session, .. }) => Some(session.time_remaining()),
            None => None,
        }
    }

    /// Take every event queued since the last drain
    pub fn drain_events(&mut self) -> Vec<CombatEvent> {
        std::mem::take(&mut self.events)
    }

    // ------------------------------------------------------------------
    // Starting attempts
    // ------------------------------------------------------------------

    /// Choose the enemy the next attack goes to
    pub fn select_target(&mut self, target: TargetId) -> bool {
        if !matches!(self.phase, SessionPhase::Idle | SessionPhase::Targeting) {
            return false;
        }
        self.phase = SessionPhase::Targeting;
        self.target = Some(target);
        self.events.push(CombatEvent::TargetSelected { target });
        true
    }

    fn ensure_ready(&self) -> Result<(), SessionError> {
        match self.phase {
            SessionPhase::Idle | SessionPhase::Targeting => Ok(()),
            phase => Err(SessionError::Busy(phase)),
        }
    }

    fn start_trace(&mut self, pattern: TracePattern, purpose: TracePurpose) -> Result<(), SessionError> {
        self.ensure_ready()?;
        let session = TraceSession::begin(pattern, self.tuning.surface)?;
        self.events.push(CombatEvent::TraceStarted {
            pattern: session.pattern().name.clone(),
            time_limit: session.time_remaining(),
        });
        self.attempt = Some(Attempt::Trace { session, purpose });
        self.phase = SessionPhase::Active(ActiveKind::Tracing);
        self.tick_accumulator_ms = 0;
        Ok(())
    }

    /// Trace an attack pattern against the selected target
    pub fn begin_trace(&mut self, pattern: TracePattern) -> Result<(), SessionError> {
        self.start_trace(pattern, TracePurpose::Attack)
    }

    /// Trace a defense pattern to block an incoming hit
    pub fn begin_defense_trace(&mut self, pattern: TracePattern, incoming: u32) -> Result<(), SessionError> {
        self.start_trace(pattern, TracePurpose::Defense { incoming })
    }

    /// Fold a pattern; `others` are the live targets besides the primary
    pub fn begin_fold(
        &mut self,
        pattern: FoldPattern,
        kind: FoldKind,
        others: &[TargetId],
    ) -> Result<(), SessionError> {
        self.ensure_ready()?;
        let session = FoldSession::begin(pattern, kind, self.tuning.surface, self.tuning.fold_time_limit)?
            .with_stage_pause(self.tuning.fold_stage_pause_ms);
        self.events.push(CombatEvent::FoldStarted {
            pattern: session.pattern().name.clone(),
            kind,
            time_limit: session.time_remaining(),
        });
        self.attempt = Some(Attempt::Fold {
            session,
            others: others.to_vec(),
        });
        self.phase = SessionPhase::Active(ActiveKind::Folding);
        self.tick_accumulator_ms = 0;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Input
    // ------------------------------------------------------------------

    pub fn pointer_down(&mut self, point: Point) {
        if let Some(Attempt::Trace { session, .. }) = self.attempt.as_mut() {
            session.pointer_down(point);
        }
    }

    pub fn pointer_up(&mut self) {
        if let Some(Attempt::Trace { session, .. }) = self.attempt.as_mut() {
            session.pointer_up();
        }
    }

    /// Pointer moved while tracing
    pub fn pointer_move(&mut self, point: Point) -> SampleFeedback {
        let Some(Attempt::Trace { session, purpose }) = self.attempt.as_mut() else {
            return SampleFeedback::default();
        };
        let feedback = session.pointer_move(point);
        if let Some(hit) = feedback.waypoint_hit {
            self.events.push(CombatEvent::WaypointHit {
                index: hit.index,
                critical: hit.critical,
            });
        }
        if let Some(accuracy) = feedback.completed {
            let purpose = *purpose;
            self.events.push(CombatEvent::SessionCompleted {
                accuracy,
                pattern: session.pattern().name.clone(),
            });
            self.phase = SessionPhase::Completed;
            self.on_trace_completed(accuracy, purpose);
        }
        feedback
    }

    /// Click on the fold surface
    pub fn click(&mut self, point: Point) -> Click {
        let Some(Attempt::Fold { session, others }) = self.attempt.as_mut() else {
            return Click::Ignored;
        };
        let click = session.register_click(point);
        match click {
            Click::Hit { stage_index, completed } => {
                self.events.push(CombatEvent::FoldStageHit { stage_index });
                if let (true, Some(result)) = (completed, session.result().cloned()) {
                    self.events.push(CombatEvent::SessionCompleted {
                        accuracy: 100,
                        pattern: session.pattern().name.clone(),
                    });
                    let outcome = self.resolver.resolve_fold(
                        &result,
                        session.pattern(),
                        &FoldContext { other_targets: others },
                        &mut self.rng,
                    );
                    self.phase = SessionPhase::Completed;
                    self.stage_outcome(outcome);
                }
            }
            Click::Miss { stage_index, hint_deg } => {
                self.events.push(CombatEvent::FoldMiss { stage_index, hint_deg });
            }
            Click::Ignored => {}
        }
        click
    }

    /// Key press during the post-trace window
    pub fn press_key(&mut self, key: char) -> Option<KeyBonus> {
        let bonus = self.key_challenge.as_mut()?.press(key)?;
        self.finish_key(bonus);
        Some(bonus)
    }

    /// Key press by browser key name; see [`KeyChallenge::press_named`]
    pub fn press_key_named(&mut self, name: &str) -> Option<KeyBonus> {
        let bonus = self.key_challenge.as_mut()?.press_named(name)?;
        self.finish_key(bonus);
        Some(bonus)
    }

    /// Drop the selected target before an attempt starts
    pub fn clear_target(&mut self) -> bool {
        if self.phase != SessionPhase::Targeting {
            return false;
        }
        self.target = None;
        self.phase = SessionPhase::Idle;
        log::debug!("Target cleared");
        true
    }

    /// Caller closed the minigame. Inert unless an attempt is active; the
    /// attempt resolves with no payoff, exactly as a timeout would.
    pub fn cancel(&mut self) -> bool {
        if !matches!(self.phase, SessionPhase::Active(_)) {
            return false;
        }
        let outcome = match self.attempt.as_mut() {
            Some(Attempt::Trace { session, purpose }) => {
                if !session.cancel() {
                    return false;
                }
                match *purpose {
                    TracePurpose::Attack => self.resolver.resolve_abandoned_trace(),
                    TracePurpose::Defense { incoming } => self.resolver.resolve_failed_defense(incoming),
                }
            }
            Some(Attempt::Fold { session, .. }) => {
                if !session.cancel() {
                    return false;
                }
                let failed = FoldResult {
                    success: false,
                    pattern_name: None,
                    kind: session.kind(),
                };
                self.resolver
                    .resolve_fold(&failed, session.pattern(), &FoldContext::default(), &mut self.rng)
            }
            None => return false,
        };
        log::info!("Attempt cancelled");
        self.events.push(CombatEvent::SessionCancelled);
        self.pending = Some(outcome);
        self.deliver();
        true
    }

    /// Spend a full gauge on every live target
    pub fn unleash_ultimate(
        &mut self,
        player_level: u32,
        targets: &[UltimateTarget],
    ) -> Result<Vec<UltimateHit>, SessionError> {
        self.ensure_ready()?;
        if !self.charge.consume() {
            return Err(SessionError::UltimateNotReady);
        }
        let hits = self.resolver.resolve_ultimate(player_level, targets);
        log::info!("Ultimate unleashed on {} targets", hits.len());
        self.events.push(CombatEvent::UltimateUnleashed { hits: hits.clone() });
        Ok(hits)
    }

    /// Abandon everything and clear the running totals (new encounter)
    pub fn reset(&mut self) {
        if let Some(Attempt::Trace { session, .. }) = self.attempt.as_mut() {
            session.cancel();
        }
        if let Some(Attempt::Fold { session, .. }) = self.attempt.as_mut() {
            session.cancel();
        }
        self.attempt = None;
        self.key_challenge = None;
        self.pending = None;
        self.target = None;
        self.phase = SessionPhase::Idle;
        self.tick_accumulator_ms = 0;
        self.combo.reset();
        self.charge = UltimateCharge::new();
        self.events.clear();
    }

    // ------------------------------------------------------------------
    // Time
    // ------------------------------------------------------------------

    /// Advance wall-clock time by `dt_ms`
    pub fn update(&mut self, dt_ms: u32) {
        match self.phase {
            SessionPhase::Active(_) => {
                if let Some(Attempt::Fold { session, .. }) = self.attempt.as_mut() {
                    session.advance_ms(dt_ms);
                }
                self.tick_accumulator_ms += dt_ms;
                while self.tick_accumulator_ms >= TICK_MS && matches!(self.phase, SessionPhase::Active(_)) {
                    self.tick_accumulator_ms -= TICK_MS;
                    self.tick();
                }
            }
            SessionPhase::Completed | SessionPhase::TimedOut => {
                if let Some(challenge) = self.key_challenge.as_mut() {
                    if let Some(bonus) = challenge.advance_ms(dt_ms) {
                        self.finish_key(bonus);
                    }
                } else if self.pending.is_some() {
                    self.banner_ms = self.banner_ms.saturating_sub(dt_ms);
                    if self.banner_ms == 0 {
                        self.deliver();
                    }
                }
            }
            SessionPhase::Idle | SessionPhase::Targeting => {}
        }
    }

    /// One countdown second for the active attempt
    pub fn tick(&mut self) {
        if !matches!(self.phase, SessionPhase::Active(_)) {
            return;
        }
        let (remaining, expired) = match self.attempt.as_mut() {
            Some(Attempt::Trace { session, purpose }) => {
                let expired = session.tick().then(|| match *purpose {
                    TracePurpose::Attack => self.resolver.resolve_abandoned_trace(),
                    TracePurpose::Defense { incoming } => self.resolver.resolve_failed_defense(incoming),
                });
                (session.time_remaining(), expired)
            }
            Some(Attempt::Fold { session, .. }) => {
                let expired = session.tick().map(|result| {
                    self.resolver
                        .resolve_fold(&result, session.pattern(), &FoldContext::default(), &mut self.rng)
                });
                (session.time_remaining(), expired)
            }
            None => return,
        };

        self.events.push(CombatEvent::CountdownTick { remaining });
        if let Some(outcome) = expired {
            self.events.push(CombatEvent::SessionTimedOut);
            self.phase = SessionPhase::TimedOut;
            self.stage_outcome(outcome);
        }
    }

    // ------------------------------------------------------------------
    // Resolution
    // ------------------------------------------------------------------

    fn on_trace_completed(&mut self, accuracy: u8, purpose: TracePurpose) {
        match purpose {
            TracePurpose::Attack if key_challenge::qualifies(accuracy) => {
                let challenge = KeyChallenge::open(&mut self.rng, self.tuning.key_window_ms);
                self.events.push(CombatEvent::KeyChallengeOpened {
                    key: challenge.required_key(),
                    window_ms: challenge.remaining_ms(),
                });
                self.key_challenge = Some(challenge);
            }
            TracePurpose::Attack => {
                if let Some(outcome) = self.resolve_attack(accuracy, KeyBonus::NotOffered) {
                    self.stage_outcome(outcome);
                }
            }
            TracePurpose::Defense { incoming } => {
                if let Some(session) = self.trace() {
                    let outcome = self
                        .resolver
                        .resolve_defense_trace(session.pattern(), accuracy, incoming);
                    self.stage_outcome(outcome);
                }
            }
        }
    }

    fn resolve_attack(&self, accuracy: u8, key: KeyBonus) -> Option<Outcome> {
        let session = self.trace()?;
        let ctx = TraceContext {
            combo_streak: self.combo.streak,
            key,
        };
        Some(self.resolver.resolve_trace(session.pattern(), accuracy, &ctx))
    }

    fn finish_key(&mut self, bonus: KeyBonus) {
        self.key_challenge = None;
        self.events.push(CombatEvent::KeyChallengeDecided { bonus });
        let accuracy = self.trace().and_then(|s| s.final_result()).unwrap_or(0);
        if let Some(outcome) = self.resolve_attack(accuracy, bonus) {
            self.stage_outcome(outcome);
        }
    }

    fn stage_outcome(&mut self, outcome: Outcome) {
        self.pending = Some(outcome);
        self.banner_ms = self.tuning.banner_hold_ms;
        if self.banner_ms == 0 {
            self.deliver();
        }
    }

    /// Hand the pending outcome to the caller and return to idle
    fn deliver(&mut self) {
        let Some(outcome) = self.pending.take() else {
            return;
        };
        let combo_streak = self.combo.apply(outcome.combo);
        let ready = outcome.charge_delta > 0 && self.charge.add(outcome.charge_delta);
        log::info!(
            "Outcome delivered: dmg={} heal={} self={} combo={} charge={}",
            outcome.damage,
            outcome.heal,
            outcome.self_damage,
            combo_streak,
            self.charge.value()
        );
        self.events.push(CombatEvent::OutcomeResolved {
            target: self.target,
            outcome,
            combo_streak,
            charge: self.charge.value(),
        });
        if ready {
            self.events.push(CombatEvent::UltimateReady);
        }

        self.attempt = None;
        self.target = None;
        self.phase = SessionPhase::Idle;
        self.tick_accumulator_ms = 0;
    }
}
