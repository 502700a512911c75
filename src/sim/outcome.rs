//! Outcome resolver
//!
//! Maps a finished trace or fold attempt plus caller context to game-facing
//! numbers: damage, healing, combo movement, ultimate charge and elemental
//! effects. Holds no state beyond its modifier table; randomness comes in
//! through the `rng` argument and running totals stay with the caller.

use std::collections::HashMap;

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::Serialize;
use thiserror::Error;

use super::combo::ComboChange;
use super::fold::FoldResult;
use super::key_challenge::KeyBonus;
use super::pattern::{AttackKind, Element, FoldKind, FoldPattern, TracePattern};
use super::status::ElementalStatus;
use crate::consts::*;
use crate::round_points;

/// Stable id of a combat target, assigned by the caller
pub type TargetId = u32;

/// Payoff rule for an attack kind: `(damage, accuracy) -> damage`
pub type KindModifier = fn(u32, u8) -> u32;

/// Resolver construction failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolverError {
    #[error("no payoff modifier registered for attack kind `{0}`")]
    MissingModifier(&'static str),
}

/// How a hit is presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HitGrade {
    #[default]
    Normal,
    Combo,
    Critical,
}

/// Secondary damage dealt to another target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SplashHit {
    pub target: TargetId,
    pub damage: u32,
}

/// Resolved effect of one finished attempt
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Outcome {
    /// 0..=100
    pub accuracy: u8,
    /// Damage to the primary target
    pub damage: u32,
    /// Healing for the acting player
    pub heal: u32,
    /// Damage the acting player takes (fumbles, unmitigated attacks)
    pub self_damage: u32,
    pub combo: ComboChange,
    pub charge_delta: u32,
    pub grade: HitGrade,
    pub elemental_status: Option<ElementalStatus>,
    pub splash: Vec<SplashHit>,
}

impl Outcome {
    /// Any payoff for the acting side
    pub fn is_beneficial(&self) -> bool {
        self.damage > 0 || self.heal > 0 || !self.splash.is_empty()
    }
}

/// Context a trace is resolved in
#[derive(Debug, Clone, Copy, Default)]
pub struct TraceContext {
    /// Caller's streak before this attempt
    pub combo_streak: u32,
    pub key: KeyBonus,
}

/// Context a fold is resolved in
#[derive(Debug, Clone, Copy, Default)]
pub struct FoldContext<'a> {
    /// Other live targets, candidates for wind splash
    pub other_targets: &'a [TargetId],
}

/// Target of an ultimate strike
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UltimateTarget {
    pub id: TargetId,
    pub is_boss: bool,
}

/// One target's share of an ultimate strike
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UltimateHit {
    pub target: TargetId,
    pub damage: u32,
    pub status: ElementalStatus,
}

// ============================================================================
// KIND MODIFIERS
// ============================================================================

/// Damage passes through unchanged
pub fn unmodified(damage: u32, _accuracy: u8) -> u32 {
    damage
}

/// Lands three times
pub fn multi_hit(damage: u32, _accuracy: u8) -> u32 {
    damage.saturating_mul(3)
}

/// 1.5x on near-perfect traces
pub fn precision_strike(damage: u32, accuracy: u8) -> u32 {
    if accuracy > CRITICAL_THRESHOLD {
        round_points(damage as f32 * 1.5)
    } else {
        damage
    }
}

/// Attack kind -> payoff rule
#[derive(Debug, Clone, Default)]
pub struct ModifierTable {
    rules: HashMap<AttackKind, KindModifier>,
}

impl ModifierTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The game's rules: butterfly multi-hits, samurai crits on precision
    pub fn standard() -> Self {
        Self::new()
            .with(AttackKind::Crane, unmodified)
            .with(AttackKind::Dragon, unmodified)
            .with(AttackKind::Butterfly, multi_hit)
            .with(AttackKind::Samurai, precision_strike)
            .with(AttackKind::Lotus, unmodified)
    }

    pub fn with(mut self, kind: AttackKind, modifier: KindModifier) -> Self {
        self.rules.insert(kind, modifier);
        self
    }

    pub fn get(&self, kind: AttackKind) -> Option<KindModifier> {
        self.rules.get(&kind).copied()
    }

    /// Every attack kind must have a rule
    pub fn validate(&self) -> Result<(), ResolverError> {
        for kind in AttackKind::ALL {
            if !self.rules.contains_key(&kind) {
                return Err(ResolverError::MissingModifier(kind.as_str()));
            }
        }
        Ok(())
    }
}

/// Streak multiplier for a trace at `accuracy`
pub fn combo_multiplier(accuracy: u8, streak: u32) -> f32 {
    if accuracy > GREAT_THRESHOLD {
        1.0 + streak as f32 * GREAT_COMBO_STEP
    } else if accuracy > COMBO_THRESHOLD {
        1.0 + streak as f32 * COMBO_STEP
    } else {
        1.0
    }
}

/// Fraction of incoming damage a defense trace absorbs
pub fn defense_reduction(accuracy: u8, earth: bool) -> f32 {
    match (accuracy, earth) {
        (a, true) if a > 80 => 0.9,
        (a, false) if a > 80 => 0.8,
        (a, true) if a > 60 => 0.65,
        (a, false) if a > 60 => 0.5,
        (_, true) => 0.35,
        (_, false) => 0.2,
    }
}

// ============================================================================
// RESOLVER
// ============================================================================

/// Stateless payoff mapping, validated at construction
#[derive(Debug, Clone)]
pub struct OutcomeResolver {
    modifiers: ModifierTable,
    ultimate_enabled: bool,
}

impl OutcomeResolver {
    pub fn new(modifiers: ModifierTable) -> Result<Self, ResolverError> {
        modifiers.validate()?;
        Ok(Self {
            modifiers,
            ultimate_enabled: true,
        })
    }

    /// Resolver with the standard table
    pub fn standard() -> Self {
        Self {
            modifiers: ModifierTable::standard(),
            ultimate_enabled: true,
        }
    }

    /// Disable ultimate charge accrual (challenge modes)
    pub fn with_ultimate(mut self, enabled: bool) -> Self {
        self.ultimate_enabled = enabled;
        self
    }

    fn charge(&self, amount: u32) -> u32 {
        if self.ultimate_enabled {
            amount.min(CHARGE_MAX)
        } else {
            0
        }
    }

    /// Completed attack trace
    pub fn resolve_trace(&self, pattern: &TracePattern, accuracy: u8, ctx: &TraceContext) -> Outcome {
        let accuracy = accuracy.min(100);
        let mut damage = round_points(pattern.damage as f32 * accuracy as f32 / 100.0);

        if ctx.key == KeyBonus::Perfect {
            damage = round_points(damage as f32 * KEY_BONUS_MULTIPLIER);
        }

        let combo = ComboChange::for_accuracy(accuracy);
        damage = round_points(damage as f32 * combo_multiplier(accuracy, ctx.combo_streak));
        let grade = if accuracy > CRITICAL_THRESHOLD {
            HitGrade::Critical
        } else if accuracy > COMBO_THRESHOLD {
            HitGrade::Combo
        } else {
            HitGrade::Normal
        };

        // Validated at construction; unmodified is unreachable in practice
        let modifier = self.modifiers.get(pattern.attack_kind).unwrap_or(unmodified);
        damage = modifier(damage, accuracy);

        let charge = round_points(accuracy as f32 * 0.2)
            + round_points(damage as f32 * 0.05 * accuracy as f32 / 100.0);

        let self_damage = if ctx.key == KeyBonus::Fumbled {
            FUMBLE_DAMAGE
        } else {
            0
        };

        log::debug!(
            "Trace resolved: {} acc={} dmg={} {:?}",
            pattern.name,
            accuracy,
            damage,
            grade
        );
        Outcome {
            accuracy,
            damage,
            self_damage,
            combo,
            charge_delta: self.charge(charge),
            grade,
            ..Default::default()
        }
    }

    /// Attack trace that timed out or was cancelled: no payoff, streak broken
    pub fn resolve_abandoned_trace(&self) -> Outcome {
        Outcome {
            combo: ComboChange::Reset,
            ..Default::default()
        }
    }

    /// Defense trace answering an incoming hit of `incoming` damage
    pub fn resolve_defense_trace(&self, pattern: &TracePattern, accuracy: u8, incoming: u32) -> Outcome {
        let accuracy = accuracy.min(100);
        let earth = pattern.element == Some(Element::Earth);
        let reduction = defense_reduction(accuracy, earth);
        Outcome {
            accuracy,
            self_damage: round_points(incoming as f32 * (1.0 - reduction)),
            ..Default::default()
        }
    }

    /// Defense trace that ran out of time: the hit lands in full
    pub fn resolve_failed_defense(&self, incoming: u32) -> Outcome {
        Outcome {
            self_damage: incoming,
            ..Default::default()
        }
    }

    /// Finished fold attempt
    pub fn resolve_fold<R: Rng + ?Sized>(
        &self,
        result: &FoldResult,
        pattern: &FoldPattern,
        ctx: &FoldContext<'_>,
        rng: &mut R,
    ) -> Outcome {
        if !result.success {
            log::debug!("Fold fumbled ({:?})", result.kind);
            return Outcome {
                self_damage: FUMBLE_DAMAGE,
                ..Default::default()
            };
        }

        let amount = pattern.value + rng.random_range(0..FOLD_BONUS_BAND);
        let element = pattern.element;
        let mut outcome = Outcome {
            accuracy: 100,
            ..Default::default()
        };

        match result.kind {
            FoldKind::Attack => {
                outcome.damage = amount;
                outcome.grade = HitGrade::Critical;
                match element {
                    Some(Element::Fire) => {
                        outcome.elemental_status = Some(ElementalStatus::burn(amount, BURN_TICK_MS));
                    }
                    Some(Element::Water) => {
                        outcome.elemental_status = Some(ElementalStatus::slow());
                    }
                    Some(Element::Wind) => {
                        let splash = round_points(amount as f32 * WIND_SPLASH_FACTOR);
                        outcome.splash = ctx
                            .other_targets
                            .choose_multiple(rng, WIND_SPLASH_TARGETS)
                            .map(|&target| SplashHit {
                                target,
                                damage: splash,
                            })
                            .collect();
                    }
                    Some(Element::Earth) => outcome.heal = EARTH_CASTER_HEAL,
                    None => {}
                }
                outcome.charge_delta = self.charge(10 + if element.is_some() { 15 } else { 0 });
            }
            FoldKind::Defense => {
                outcome.heal = amount
                    + match element {
                        Some(Element::Earth) => 20,
                        Some(Element::Water) => 10,
                        _ => 0,
                    };
                outcome.charge_delta = self.charge(5 + if element.is_some() { 8 } else { 0 });
            }
        }

        log::debug!(
            "Fold resolved: {} dmg={} heal={} splash={}",
            pattern.name,
            outcome.damage,
            outcome.heal,
            outcome.splash.len()
        );
        outcome
    }

    /// Spend a full gauge against every live target
    pub fn resolve_ultimate(&self, player_level: u32, targets: &[UltimateTarget]) -> Vec<UltimateHit> {
        let base = ULTIMATE_DAMAGE_PER_LEVEL.saturating_mul(player_level.max(1));
        targets
            .iter()
            .map(|t| {
                let damage = if t.is_boss {
                    round_points(base as f32 * ULTIMATE_BOSS_FACTOR)
                } else {
                    base
                };
                UltimateHit {
                    target: t.id,
                    damage,
                    status: ElementalStatus::burn(damage, ULTIMATE_BURN_TICK_MS),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Point;
    use crate::sim::status::StatusKind;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn trace(kind: AttackKind, damage: u32) -> TracePattern {
        TracePattern {
            id: "t".into(),
            name: "T".into(),
            description: String::new(),
            points: vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0)],
            attack_kind: kind,
            damage,
            time_limit: 8,
            element: None,
        }
    }

    fn fold(value: u32, element: Option<Element>) -> FoldPattern {
        FoldPattern {
            name: "F".into(),
            description: String::new(),
            points: vec![Point::new(0.2, 0.2), Point::new(0.8, 0.8)],
            difficulty: 2,
            value,
            time_limit: None,
            element,
        }
    }

    fn success(kind: FoldKind) -> FoldResult {
        FoldResult {
            success: true,
            pattern_name: Some("F".into()),
            kind,
        }
    }

    #[test]
    fn test_perfect_trace_no_streak() {
        let r = OutcomeResolver::standard();
        let o = r.resolve_trace(&trace(AttackKind::Crane, 35), 100, &TraceContext::default());
        assert_eq!(o.damage, 35);
        assert_eq!(o.grade, HitGrade::Critical);
        assert_eq!(o.combo, ComboChange::Increment);
        // 20 for accuracy + round(35 * 0.05)
        assert_eq!(o.charge_delta, 22);
    }

    #[test]
    fn test_trace_combo_bands() {
        let r = OutcomeResolver::standard();
        let p = trace(AttackKind::Dragon, 100);
        let ctx = TraceContext { combo_streak: 2, key: KeyBonus::NotOffered };

        let great = r.resolve_trace(&p, 92, &ctx);
        assert_eq!(great.damage, 120); // 92 * 1.3
        assert_eq!(great.grade, HitGrade::Combo);

        let good = r.resolve_trace(&p, 80, &ctx);
        assert_eq!(good.damage, 96); // 80 * 1.2
        assert_eq!(good.combo, ComboChange::Increment);

        let weak = r.resolve_trace(&p, 70, &ctx);
        assert_eq!(weak.damage, 70);
        assert_eq!(weak.combo, ComboChange::Reset);
        assert_eq!(weak.grade, HitGrade::Normal);
    }

    #[test]
    fn test_key_bonus() {
        let r = OutcomeResolver::standard();
        let p = trace(AttackKind::Crane, 100);
        let perfect = r.resolve_trace(&p, 80, &TraceContext { combo_streak: 0, key: KeyBonus::Perfect });
        assert_eq!(perfect.damage, 104);
        assert_eq!(perfect.self_damage, 0);

        let fumbled = r.resolve_trace(&p, 80, &TraceContext { combo_streak: 0, key: KeyBonus::Fumbled });
        assert_eq!(fumbled.damage, 80);
        assert_eq!(fumbled.self_damage, FUMBLE_DAMAGE);

        let slow = r.resolve_trace(&p, 80, &TraceContext { combo_streak: 0, key: KeyBonus::TooSlow });
        assert_eq!(slow.damage, 80);
        assert_eq!(slow.self_damage, 0);
    }

    #[test]
    fn test_kind_modifiers() {
        let r = OutcomeResolver::standard();
        let ctx = TraceContext::default();
        assert_eq!(r.resolve_trace(&trace(AttackKind::Butterfly, 25), 80, &ctx).damage, 60);
        assert_eq!(r.resolve_trace(&trace(AttackKind::Samurai, 120), 100, &ctx).damage, 180);
        assert_eq!(r.resolve_trace(&trace(AttackKind::Samurai, 120), 95, &ctx).damage, 114);
    }

    #[test]
    fn test_modifier_table_validation() {
        let partial = ModifierTable::new().with(AttackKind::Crane, unmodified);
        assert!(matches!(
            OutcomeResolver::new(partial),
            Err(ResolverError::MissingModifier("dragon"))
        ));

        // Swapping a rule needs no scorer change
        let custom = ModifierTable::standard().with(AttackKind::Crane, multi_hit);
        let r = OutcomeResolver::new(custom).unwrap();
        let o = r.resolve_trace(&trace(AttackKind::Crane, 10), 100, &TraceContext::default());
        assert_eq!(o.damage, 30);
    }

    #[test]
    fn test_ultimate_disabled_accrues_nothing() {
        let r = OutcomeResolver::standard().with_ultimate(false);
        let o = r.resolve_trace(&trace(AttackKind::Crane, 35), 100, &TraceContext::default());
        assert_eq!(o.charge_delta, 0);
    }

    #[test]
    fn test_abandoned_trace() {
        let o = OutcomeResolver::standard().resolve_abandoned_trace();
        assert_eq!(o.combo, ComboChange::Reset);
        assert!(!o.is_beneficial());
        assert_eq!(o.charge_delta, 0);
    }

    #[test]
    fn test_defense_trace_mitigation() {
        let r = OutcomeResolver::standard();
        let mut p = trace(AttackKind::Lotus, 0);
        assert_eq!(r.resolve_defense_trace(&p, 85, 40).self_damage, 8);
        assert_eq!(r.resolve_defense_trace(&p, 65, 40).self_damage, 20);
        assert_eq!(r.resolve_defense_trace(&p, 30, 40).self_damage, 32);
        p.element = Some(Element::Earth);
        assert_eq!(r.resolve_defense_trace(&p, 85, 40).self_damage, 4);
        assert_eq!(r.resolve_failed_defense(40).self_damage, 40);
    }

    #[test]
    fn test_fold_attack_bonus_band() {
        let r = OutcomeResolver::standard();
        let mut rng = Pcg32::seed_from_u64(42);
        for _ in 0..50 {
            let o = r.resolve_fold(&success(FoldKind::Attack), &fold(60, None), &FoldContext::default(), &mut rng);
            assert!((60..160).contains(&o.damage));
            assert_eq!(o.charge_delta, 10);
            assert_eq!(o.combo, ComboChange::Hold);
        }
    }

    #[test]
    fn test_fold_fire_and_water_status() {
        let r = OutcomeResolver::standard();
        let mut rng = Pcg32::seed_from_u64(1);
        let fire = r.resolve_fold(&success(FoldKind::Attack), &fold(60, Some(Element::Fire)), &FoldContext::default(), &mut rng);
        let burn = fire.elemental_status.unwrap();
        assert_eq!(burn.kind, StatusKind::Burn);
        assert_eq!(burn.duration_ms, BURN_DURATION_MS);
        assert_eq!(burn.tick_value, round_points(fire.damage as f32 * 0.1));
        assert_eq!(fire.charge_delta, 25);

        let water = r.resolve_fold(&success(FoldKind::Attack), &fold(60, Some(Element::Water)), &FoldContext::default(), &mut rng);
        assert_eq!(water.elemental_status.unwrap().kind, StatusKind::Slow);
    }

    #[test]
    fn test_fold_wind_splash_caps_at_three() {
        let r = OutcomeResolver::standard();
        let mut rng = Pcg32::seed_from_u64(9);
        let others = [2, 3, 4, 5, 6];
        let o = r.resolve_fold(
            &success(FoldKind::Attack),
            &fold(40, Some(Element::Wind)),
            &FoldContext { other_targets: &others },
            &mut rng,
        );
        assert_eq!(o.splash.len(), 3);
        for hit in &o.splash {
            assert!(others.contains(&hit.target));
            assert_eq!(hit.damage, round_points(o.damage as f32 * 0.6));
        }

        let o = r.resolve_fold(
            &success(FoldKind::Attack),
            &fold(40, Some(Element::Wind)),
            &FoldContext { other_targets: &others[..1] },
            &mut rng,
        );
        assert_eq!(o.splash.len(), 1);
    }

    #[test]
    fn test_fold_earth_heals_caster() {
        let r = OutcomeResolver::standard();
        let mut rng = Pcg32::seed_from_u64(3);
        let o = r.resolve_fold(&success(FoldKind::Attack), &fold(100, Some(Element::Earth)), &FoldContext::default(), &mut rng);
        assert_eq!(o.heal, EARTH_CASTER_HEAL);
        assert!(o.elemental_status.is_none());
    }

    #[test]
    fn test_fold_defense_heals() {
        let r = OutcomeResolver::standard();
        let mut rng = Pcg32::seed_from_u64(5);
        let o = r.resolve_fold(&success(FoldKind::Defense), &fold(40, Some(Element::Earth)), &FoldContext::default(), &mut rng);
        assert!((60..160).contains(&o.heal));
        assert_eq!(o.damage, 0);
        assert_eq!(o.charge_delta, 13);
    }

    #[test]
    fn test_fold_failure_fumbles() {
        let r = OutcomeResolver::standard();
        let mut rng = Pcg32::seed_from_u64(5);
        let failed = FoldResult { success: false, pattern_name: None, kind: FoldKind::Attack };
        let o = r.resolve_fold(&failed, &fold(40, Some(Element::Fire)), &FoldContext::default(), &mut rng);
        assert_eq!(o.self_damage, FUMBLE_DAMAGE);
        assert!(!o.is_beneficial());
        assert_eq!(o.charge_delta, 0);
        assert!(o.elemental_status.is_none());
    }

    #[test]
    fn test_fold_is_deterministic_under_seed() {
        let r = OutcomeResolver::standard();
        let run = |seed| {
            let mut rng = Pcg32::seed_from_u64(seed);
            r.resolve_fold(&success(FoldKind::Attack), &fold(25, None), &FoldContext::default(), &mut rng)
                .damage
        };
        assert_eq!(run(77), run(77));
    }

    #[test]
    fn test_ultimate_strike() {
        let r = OutcomeResolver::standard();
        let hits = r.resolve_ultimate(
            2,
            &[
                UltimateTarget { id: 1, is_boss: false },
                UltimateTarget { id: 2, is_boss: true },
            ],
        );
        assert_eq!(hits[0].damage, 300);
        assert_eq!(hits[1].damage, 210);
        assert_eq!(hits[1].status.tick_value, 21);
        assert_eq!(hits[1].status.tick_interval_ms, ULTIMATE_BURN_TICK_MS);
    }
}
