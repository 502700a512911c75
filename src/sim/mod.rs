//! Deterministic combat module
//!
//! All scoring and payoff logic lives here. This module must stay pure:
//! - Time arrives only as explicit ticks / millisecond deltas
//! - Seeded RNG only, passed in explicitly
//! - No rendering, audio or platform dependencies

pub mod catalog;
pub mod combo;
pub mod countdown;
pub mod events;
pub mod fold;
pub mod geometry;
pub mod key_challenge;
pub mod outcome;
pub mod pattern;
pub mod session;
pub mod status;
pub mod trace;

pub use catalog::{Catalog, CatalogError};
pub use combo::{ComboChange, ComboState, UltimateCharge};
pub use countdown::{Countdown, TerminalCause};
pub use events::{CombatEvent, DamageNumber, NumberStyle, PositionMap, project_burn_tick, project_outcome};
pub use fold::{Click, FoldResult, FoldSession, fold_tolerance};
pub use geometry::{Surface, angle_between_deg, distance, distance_to_polyline, normalize};
pub use key_challenge::{KeyBonus, KeyChallenge};
pub use outcome::{
    FoldContext, HitGrade, KindModifier, ModifierTable, Outcome, OutcomeResolver, ResolverError,
    SplashHit, TargetId, TraceContext, UltimateHit, UltimateTarget,
};
pub use pattern::{AttackKind, Element, FoldKind, FoldPattern, PatternError, TracePattern};
pub use session::{ActiveKind, SessionController, SessionError, SessionPhase, TracePurpose};
pub use status::{ActiveStatus, ElementalStatus, StatusKind, StatusStep};
pub use trace::{SampleFeedback, TraceSession, WaypointHit};
