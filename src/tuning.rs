//! Caller-provided combat configuration
//!
//! Loaded once by the host (JSON from the page, a file, or defaults) and
//! handed to the session controller by value.

use serde::{Deserialize, Serialize};

use crate::sim::geometry::Surface;

/// Combat tuning knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Tracing/fold surface in pixels
    pub surface: Surface,
    /// Fold time limit in seconds when the pattern declares none
    pub fold_time_limit: u32,
    /// Post-trace key window
    pub key_window_ms: u32,
    /// Accrue ultimate charge from resolutions
    pub ultimate_enabled: bool,
    /// Input lock after each successful fold stage
    pub fold_stage_pause_ms: u32,
    /// Hold on the "pattern complete" banner before the outcome is delivered
    pub banner_hold_ms: u32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            surface: Surface::reference(),
            fold_time_limit: 30,
            key_window_ms: 3000,
            ultimate_enabled: true,
            fold_stage_pause_ms: 800,
            banner_hold_ms: 1000,
        }
    }
}

impl Tuning {
    /// Parse tuning JSON; missing fields fall back to defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_surface(mut self, width: f32, height: f32) -> Self {
        self.surface = Surface::new(width, height);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let tuning = Tuning::from_json(r#"{"fold_time_limit": 20, "ultimate_enabled": false}"#).unwrap();
        assert_eq!(tuning.fold_time_limit, 20);
        assert!(!tuning.ultimate_enabled);
        assert_eq!(tuning.key_window_ms, 3000);
        assert_eq!(tuning.surface, Surface::reference());
    }

    #[test]
    fn test_with_surface() {
        let tuning = Tuning::default().with_surface(300.0, 200.0);
        assert_eq!(tuning.surface.scale(), 0.5);
    }
}
