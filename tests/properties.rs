//! Property tests for the scorers, resolver and running totals

use paper_samurai::Point;
use paper_samurai::consts::{CAPTURE_RADIUS, CHARGE_MAX};
use paper_samurai::sim::outcome::combo_multiplier;
use paper_samurai::sim::{
    AttackKind, ComboChange, KeyBonus, OutcomeResolver, Surface, TerminalCause, TraceContext,
    TracePattern, TraceSession, UltimateCharge, distance, fold_tolerance,
};
use proptest::prelude::*;

fn zigzag() -> TracePattern {
    TracePattern {
        id: "zigzag".into(),
        name: "Zigzag".into(),
        description: String::new(),
        points: vec![
            Point::new(100.0, 100.0),
            Point::new(200.0, 200.0),
            Point::new(300.0, 100.0),
            Point::new(400.0, 200.0),
        ],
        attack_kind: AttackKind::Crane,
        damage: 50,
        time_limit: 10,
        element: None,
    }
}

fn dense(points: &[Point], steps: usize) -> Vec<Point> {
    let mut path: Vec<Point> = points
        .windows(2)
        .flat_map(|w| (0..steps).map(move |i| w[0].lerp(w[1], i as f32 / steps as f32)))
        .collect();
    path.extend(points.last().copied());
    path
}

fn point() -> impl Strategy<Value = Point> {
    (0.0f32..600.0, 0.0f32..400.0).prop_map(|(x, y)| Point::new(x, y))
}

proptest! {
    /// Property: the waypoint cursor never moves backwards and only a
    /// sample strictly inside the capture radius moves it forward
    #[test]
    fn prop_waypoint_monotonicity(samples in prop::collection::vec(point(), 1..200)) {
        let mut session = TraceSession::begin(zigzag(), Surface::reference()).unwrap();
        for sample in samples {
            let before = session.current_waypoint_index();
            let target = session.waypoint(before);
            let was_terminal = session.is_terminal();
            session.add_sample(sample);
            let after = session.current_waypoint_index();

            prop_assert!(after >= before);
            prop_assert!(after <= before + 1);
            if let (Some(target), false) = (target, was_terminal) {
                let inside = distance(sample, target) < CAPTURE_RADIUS;
                prop_assert_eq!(after == before + 1, inside);
            } else {
                prop_assert_eq!(after, before);
            }
        }
    }

    /// Property: final accuracy stays in 0..=100 for any non-empty path
    #[test]
    fn prop_final_accuracy_bounded(samples in prop::collection::vec(point(), 1..150)) {
        let mut session = TraceSession::begin(zigzag(), Surface::reference()).unwrap();
        for sample in samples {
            session.add_sample(sample);
        }
        prop_assert!(session.final_accuracy() <= 100);
    }

    /// Property: a dense copy of the pattern scores at least 99
    #[test]
    fn prop_dense_pattern_scores_high(steps in 4usize..40) {
        let pattern = zigzag();
        let mut session = TraceSession::begin(pattern.clone(), Surface::reference()).unwrap();
        for sample in dense(&pattern.points, steps) {
            session.add_sample(sample);
        }
        prop_assert!(session.is_completed());
        prop_assert!(session.final_result().unwrap() >= 99);
    }

    /// Property: timeout after completion changes nothing
    #[test]
    fn prop_timeout_after_completion_is_inert(steps in 4usize..20, extra_ticks in 0u32..20) {
        let pattern = zigzag();
        let mut session = TraceSession::begin(pattern.clone(), Surface::reference()).unwrap();
        for sample in dense(&pattern.points, steps) {
            session.add_sample(sample);
        }
        let result = session.final_result();
        prop_assert!(!session.timeout());
        for _ in 0..extra_ticks {
            prop_assert!(!session.tick());
        }
        prop_assert_eq!(session.terminal_cause(), Some(TerminalCause::Completed));
        prop_assert_eq!(session.final_result(), result);
    }

    /// Property: for a fixed width, the easiest tier is more forgiving than
    /// the hardest once above the absolute floor
    #[test]
    fn prop_fold_tolerance_monotonic(width in 356.0f32..4000.0) {
        prop_assert!(fold_tolerance(width, 1) > fold_tolerance(width, 5));
        for d in 1..5u8 {
            prop_assert!(fold_tolerance(width, d) >= fold_tolerance(width, d + 1));
        }
    }

    /// Property: streak +1 iff accuracy > 70, otherwise reset
    #[test]
    fn prop_combo_transition_law(accuracy in 0u8..=100, streak in 0u32..50) {
        let resolver = OutcomeResolver::standard();
        let ctx = TraceContext { combo_streak: streak, key: KeyBonus::NotOffered };
        let outcome = resolver.resolve_trace(&zigzag(), accuracy, &ctx);
        let next = outcome.combo.apply(streak);
        if accuracy > 70 {
            prop_assert_eq!(outcome.combo, ComboChange::Increment);
            prop_assert_eq!(next, streak + 1);
        } else {
            prop_assert_eq!(next, 0);
        }
    }

    /// Property: great traces out-multiply combo traces at equal streak
    #[test]
    fn prop_great_beats_combo_multiplier(great in 91u8..=100, good in 71u8..=90, streak in 1u32..50) {
        prop_assert!(combo_multiplier(great, streak) > combo_multiplier(good, streak));
    }

    /// Property: charge is capped and "ready" fires exactly once
    #[test]
    fn prop_charge_cap(deltas in prop::collection::vec(1u32..60, 1..60)) {
        let mut charge = UltimateCharge::new();
        let mut fired = 0;
        let mut total = 0u32;
        for delta in deltas {
            let before = charge.value();
            if charge.add(delta) {
                fired += 1;
                prop_assert!(before < CHARGE_MAX);
                prop_assert_eq!(charge.value(), CHARGE_MAX);
            }
            total += delta;
            prop_assert!(charge.value() <= CHARGE_MAX);
        }
        prop_assert_eq!(fired, if total >= CHARGE_MAX { 1 } else { 0 });
    }
}
