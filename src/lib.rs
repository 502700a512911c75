//! Paper Samurai - origami pattern-tracing combat core
//!
//! Core modules:
//! - `sim`: Deterministic combat logic (trace/fold scoring, outcomes, sessions)
//! - `tuning`: Caller-provided combat configuration
//! - `settings`: Player preferences behind a key-value store
//! - `web`: wasm32 facade consumed by the browser UI

pub mod settings;
pub mod sim;
pub mod tuning;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use settings::{MemoryStore, Settings, SettingsStore};
pub use tuning::Tuning;

/// A point on the tracing surface
pub type Point = glam::Vec2;

/// Combat policy constants
pub mod consts {
    /// Reference tracing surface the trace catalog is authored against
    pub const REFERENCE_WIDTH: f32 = 600.0;
    pub const REFERENCE_HEIGHT: f32 = 400.0;

    /// Waypoint capture radius at reference size
    pub const CAPTURE_RADIUS: f32 = 20.0;
    /// Waypoint hits closer than this are graded critical (feedback only)
    pub const CRITICAL_HIT_RADIUS: f32 = 10.0;
    /// Captured path is bounded to the most recent samples
    pub const MAX_CAPTURED_SAMPLES: usize = 100;
    /// Samples considered by the realtime direction heuristic
    pub const REALTIME_WINDOW: usize = 20;
    /// Realtime accuracy stays optimistic below this many samples
    pub const REALTIME_MIN_SAMPLES: usize = 5;
    /// Upper bound of path points evaluated for final accuracy
    pub const MAX_EVALUATED_SAMPLES: usize = 100;
    /// Average distance (reference units) that scores zero
    pub const MAX_ALLOWABLE_DISTANCE: f32 = 50.0;

    /// Fold tolerance as a fraction of surface width
    pub const FOLD_TOLERANCE_FRACTION: f32 = 0.15;
    /// Absolute tolerance floor (surface units)
    pub const FOLD_MIN_TOLERANCE: f32 = 40.0;
    /// Tolerance shrink per declared difficulty step
    pub const FOLD_DIFFICULTY_STEP: f32 = 0.05;
    /// Difficulty never shrinks tolerance below this factor
    pub const FOLD_MIN_DIFFICULTY_FACTOR: f32 = 0.7;
    /// Click history kept for feedback drawing
    pub const MAX_CLICK_HISTORY: usize = 10;
    /// Randomized fold bonus band: base + [0, FOLD_BONUS_BAND)
    pub const FOLD_BONUS_BAND: u32 = 100;
    /// Fold difficulty tiers per fold kind
    pub const FOLD_TIERS: u8 = 5;

    /// Accuracy above this keeps the combo alive
    pub const COMBO_THRESHOLD: u8 = 70;
    /// Accuracy above this is a "great" trace
    pub const GREAT_THRESHOLD: u8 = 90;
    /// Accuracy above this is a critical trace
    pub const CRITICAL_THRESHOLD: u8 = 95;
    /// Per-streak bonus for great traces
    pub const GREAT_COMBO_STEP: f32 = 0.15;
    /// Per-streak bonus for combo traces
    pub const COMBO_STEP: f32 = 0.10;

    /// Accuracy above this opens the key challenge
    pub const KEY_CHALLENGE_THRESHOLD: u8 = 75;
    /// Damage multiplier for a perfect key press
    pub const KEY_BONUS_MULTIPLIER: f32 = 1.3;
    /// Letters the key challenge draws from
    pub const KEY_CHALLENGE_KEYS: [char; 9] = ['Q', 'W', 'E', 'A', 'S', 'D', 'Z', 'X', 'C'];
    /// Reverse damage applied to the acting player on a fumble
    pub const FUMBLE_DAMAGE: u32 = 10;

    /// Ultimate gauge capacity
    pub const CHARGE_MAX: u32 = 100;
    /// Ultimate base damage per player level
    pub const ULTIMATE_DAMAGE_PER_LEVEL: u32 = 150;
    /// Bosses take reduced ultimate damage
    pub const ULTIMATE_BOSS_FACTOR: f32 = 0.7;

    /// Wind splash hits at most this many other targets
    pub const WIND_SPLASH_TARGETS: usize = 3;
    /// Wind splash damage as a fraction of primary damage
    pub const WIND_SPLASH_FACTOR: f32 = 0.6;
    /// Earth attack heals the caster by this much
    pub const EARTH_CASTER_HEAL: u32 = 20;

    /// Burn status
    pub const BURN_DURATION_MS: u32 = 10_000;
    pub const BURN_TICK_MS: u32 = 2_000;
    pub const ULTIMATE_BURN_TICK_MS: u32 = 1_000;
    pub const BURN_TICK_FACTOR: f32 = 0.1;
    /// Slow status
    pub const SLOW_DURATION_MS: u32 = 15_000;
    pub const SLOW_FACTOR: f32 = 0.5;

    /// Countdown tick length
    pub const TICK_MS: u32 = 1_000;
}

/// Round a non-negative payoff to the nearest whole point
#[inline]
pub fn round_points(value: f32) -> u32 {
    value.max(0.0).round() as u32
}
