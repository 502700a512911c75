//! Paper Samurai headless demo
//!
//! Plays a scripted encounter against the combat core and logs every
//! event. The browser build drives the same core through `web.rs`.

#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Paper Samurai (native) starting...");
    demo::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is web::start
}

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use std::error::Error;

    use paper_samurai::Point;
    use paper_samurai::Tuning;
    use paper_samurai::sim::{
        ActiveStatus, Catalog, CombatEvent, FoldKind, ModifierTable, OutcomeResolver, PositionMap,
        SessionController, StatusKind, TracePattern, UltimateTarget, project_burn_tick, project_outcome,
    };

    const PLAYER: u32 = 0;
    const FRAME_MS: u32 = 16;

    /// Dense stroke along a pattern's polyline on the reference surface
    fn stroke(pattern: &TracePattern) -> Vec<Point> {
        pattern
            .points
            .windows(2)
            .flat_map(|w| (0..8).map(move |i| w[0].lerp(w[1], i as f32 / 8.0)))
            .chain(pattern.points.last().copied())
            .collect()
    }

    fn settle(controller: &mut SessionController, positions: &PositionMap) {
        for _ in 0..200 {
            controller.update(FRAME_MS);
        }
        report(controller, positions);
    }

    fn report(controller: &mut SessionController, positions: &PositionMap) {
        for event in controller.drain_events() {
            if let CombatEvent::OutcomeResolved { target, outcome, .. } = &event {
                for number in project_outcome(outcome, *target, PLAYER, positions) {
                    log::info!("  +{} {:?} at {:?}", number.amount, number.style, number.position);
                }
                if let Some(status) = outcome.elemental_status.filter(|s| s.kind == StatusKind::Burn) {
                    let mut active = ActiveStatus::new(status);
                    let step = active.advance(status.duration_ms);
                    if let Some(n) = target.and_then(|t| project_burn_tick(t, step.damage, positions)) {
                        log::info!("  Burn would deal {} over {} ticks", n.amount, step.ticks);
                    }
                }
            }
            match serde_json::to_string(&event) {
                Ok(json) => log::info!("{}", json),
                Err(e) => log::warn!("Unserializable event: {}", e),
            }
        }
    }

    pub fn run() -> Result<(), Box<dyn Error>> {
        let catalog = Catalog::builtin()?;
        let table = ModifierTable::standard();
        catalog.check_modifiers(&table)?;
        let resolver = OutcomeResolver::new(table)?;
        let mut controller = SessionController::new(Tuning::default(), resolver, 2024);

        let positions = PositionMap::from([
            (PLAYER, Point::new(80.0, 320.0)),
            (1, Point::new(420.0, 120.0)),
            (2, Point::new(500.0, 160.0)),
            (3, Point::new(360.0, 180.0)),
        ]);

        // Attack trace with a perfect key press
        let crane = catalog.trace("crane").cloned().ok_or("crane pattern missing")?;
        let path = stroke(&crane);
        controller.select_target(1);
        controller.begin_trace(crane)?;
        if let Some((first, rest)) = path.split_first() {
            controller.pointer_down(*first);
            controller.pointer_move(*first);
            for point in rest {
                controller.pointer_move(*point);
                controller.update(FRAME_MS);
            }
        }
        controller.pointer_up();
        if let Some(key) = controller.key_challenge().map(|c| c.required_key()) {
            controller.press_key(key);
        }
        settle(&mut controller, &positions);

        // Wind fold splashing the other enemies
        let fold = catalog
            .fold_tier(FoldKind::Attack, 2)
            .cloned()
            .ok_or("fold tier missing")?;
        let surface = controller.tuning().surface;
        let stages: Vec<Point> = fold.points.iter().map(|p| surface.denormalize(*p)).collect();
        controller.select_target(1);
        controller.begin_fold(fold, FoldKind::Attack, &[2, 3])?;
        for stage in stages {
            controller.click(stage);
            controller.update(800);
        }
        settle(&mut controller, &positions);

        // Defense trace left to run out
        let lotus = catalog
            .defense_traces()
            .next()
            .cloned()
            .ok_or("no defense pattern")?;
        controller.begin_defense_trace(lotus, 25)?;
        for _ in 0..10 {
            controller.update(1000);
        }
        settle(&mut controller, &positions);

        log::info!(
            "Encounter done: combo {} charge {}",
            controller.combo_streak(),
            controller.charge().value()
        );
        if controller.charge().is_ready() {
            let hits = controller.unleash_ultimate(
                1,
                &[
                    UltimateTarget { id: 1, is_boss: false },
                    UltimateTarget { id: 2, is_boss: true },
                ],
            )?;
            log::info!("Ultimate: {:?}", hits);
        }
        Ok(())
    }
}
