//! Browser binding
//!
//! A thin `wasm_bindgen` wrapper around [`SessionController`]. The page
//! forwards pointer, click, key and frame events and drains combat events
//! as JSON each frame.

use wasm_bindgen::prelude::*;

use crate::settings::{LocalStore, Settings};
use crate::sim::{
    Catalog, Click, FoldKind, ModifierTable, OutcomeResolver, SessionController, TargetId,
    UltimateTarget,
};
use crate::{Point, Tuning};

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"Logger already installed".into());
    }
    log::info!("Paper Samurai core loaded");
}

/// One combat screen's worth of state
#[wasm_bindgen]
pub struct Combat {
    controller: SessionController,
    catalog: Catalog,
}

#[wasm_bindgen]
impl Combat {
    /// `tuning_json` may be empty for defaults
    #[wasm_bindgen(constructor)]
    pub fn new(tuning_json: &str) -> Result<Combat, JsValue> {
        let tuning = if tuning_json.trim().is_empty() {
            Tuning::default()
        } else {
            Tuning::from_json(tuning_json).map_err(js_error)?
        };
        let catalog = Catalog::builtin().map_err(js_error)?;
        let table = ModifierTable::standard();
        catalog.check_modifiers(&table).map_err(js_error)?;
        let resolver = OutcomeResolver::new(table).map_err(js_error)?;

        let seed = js_sys::Date::now() as u64;
        log::info!("Combat initialized with seed: {}", seed);
        Ok(Combat {
            controller: SessionController::new(tuning, resolver, seed),
            catalog,
        })
    }

    pub fn select_target(&mut self, target: TargetId) -> bool {
        self.controller.select_target(target)
    }

    pub fn clear_target(&mut self) -> bool {
        self.controller.clear_target()
    }

    pub fn begin_trace(&mut self, pattern_id: &str) -> Result<(), JsValue> {
        let pattern = self
            .catalog
            .trace(pattern_id)
            .cloned()
            .ok_or_else(|| js_error(format!("unknown pattern `{pattern_id}`")))?;
        self.controller.begin_trace(pattern).map_err(js_error)
    }

    pub fn begin_defense_trace(&mut self, pattern_id: &str, incoming: u32) -> Result<(), JsValue> {
        let pattern = self
            .catalog
            .trace(pattern_id)
            .cloned()
            .ok_or_else(|| js_error(format!("unknown pattern `{pattern_id}`")))?;
        self.controller
            .begin_defense_trace(pattern, incoming)
            .map_err(js_error)
    }

    /// `kind` is "attack" or "defense"
    pub fn begin_fold(&mut self, kind: &str, tier: u8, others: Vec<TargetId>) -> Result<(), JsValue> {
        let kind = match kind {
            "attack" => FoldKind::Attack,
            "defense" => FoldKind::Defense,
            other => return Err(js_error(format!("unknown fold kind `{other}`"))),
        };
        let pattern = self
            .catalog
            .fold_tier(kind, tier)
            .cloned()
            .ok_or_else(|| js_error("empty fold tier"))?;
        self.controller
            .begin_fold(pattern, kind, &others)
            .map_err(js_error)
    }

    pub fn pointer_down(&mut self, x: f32, y: f32) {
        self.controller.pointer_down(Point::new(x, y));
    }

    /// Returns the realtime accuracy for the accuracy meter
    pub fn pointer_move(&mut self, x: f32, y: f32) -> u8 {
        self.controller.pointer_move(Point::new(x, y)).realtime_accuracy
    }

    pub fn pointer_up(&mut self) {
        self.controller.pointer_up();
    }

    /// Returns true on a fold hit
    pub fn click(&mut self, x: f32, y: f32) -> bool {
        matches!(self.controller.click(Point::new(x, y)), Click::Hit { .. })
    }

    /// `key` is the `KeyboardEvent.key` name
    pub fn press_key(&mut self, key: &str) -> bool {
        self.controller.press_key_named(key).is_some()
    }

    pub fn cancel(&mut self) -> bool {
        self.controller.cancel()
    }

    pub fn update(&mut self, dt_ms: u32) {
        self.controller.update(dt_ms);
    }

    pub fn combo_streak(&self) -> u32 {
        self.controller.combo_streak()
    }

    pub fn charge(&self) -> u32 {
        self.controller.charge().value()
    }

    /// Consume a full gauge; `boss_ids` marks which targets are bosses
    pub fn unleash_ultimate(
        &mut self,
        player_level: u32,
        targets: Vec<TargetId>,
        boss_ids: Vec<TargetId>,
    ) -> Result<String, JsValue> {
        let targets: Vec<UltimateTarget> = targets
            .into_iter()
            .map(|id| UltimateTarget {
                id,
                is_boss: boss_ids.contains(&id),
            })
            .collect();
        let hits = self
            .controller
            .unleash_ultimate(player_level, &targets)
            .map_err(js_error)?;
        serde_json::to_string(&hits).map_err(js_error)
    }

    /// Events since the last call, as a JSON array
    pub fn drain_events(&mut self) -> Result<String, JsValue> {
        serde_json::to_string(&self.controller.drain_events()).map_err(js_error)
    }

    pub fn catalog_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.catalog).map_err(js_error)
    }
}

/// Player settings as JSON (defaults when storage is unavailable)
#[wasm_bindgen]
pub fn load_settings() -> Result<String, JsValue> {
    let settings = LocalStore::open()
        .map(|store| Settings::load(&store))
        .unwrap_or_default();
    serde_json::to_string(&settings).map_err(js_error)
}

#[wasm_bindgen]
pub fn save_settings(json: &str) -> Result<bool, JsValue> {
    let settings: Settings = serde_json::from_str(json).map_err(js_error)?;
    Ok(LocalStore::open()
        .map(|mut store| settings.save(&mut store))
        .unwrap_or(false))
}
