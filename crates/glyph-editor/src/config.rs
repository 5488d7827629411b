//! Editor configuration.
//!
//! Every tunable of the interaction engine lives here. All fields have
//! defaults, so a config file only needs the keys it wants to change.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

// ─── Gestures ─────────────────────────────────────────────────────────────

/// Thresholds used by the gesture recognizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Screen-space distance the pointer must travel after pressing before
    /// a drag starts. Default: **3px**.
    pub drag_threshold: f64,

    /// Maximum time between two clicks of a double-click. Default: **300ms**.
    pub double_click_ms: u64,

    /// Maximum screen distance between two clicks of a double-click.
    /// Default: **5px**.
    pub double_click_distance: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            drag_threshold: 3.0,
            double_click_ms: 300,
            double_click_distance: 5.0,
        }
    }
}

// ─── Snapping ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapConfig {
    pub enabled: bool,
    /// Screen radius for snapping onto another point.
    pub point_radius_px: f64,
    /// Screen radius for snapping onto metric guide lines.
    pub metrics_radius_px: f64,
    /// Shift-drag constrains movement to multiples of this angle.
    pub angle_step_degrees: f64,
    /// Shift-rotate snaps the rotation to multiples of this angle.
    pub rotate_step_degrees: f64,
    /// Rotations this close to a right angle snap onto it.
    pub rotate_reference_tolerance_degrees: f64,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            point_radius_px: 8.0,
            metrics_radius_px: 6.0,
            angle_step_degrees: 45.0,
            rotate_step_degrees: 15.0,
            rotate_reference_tolerance_degrees: 2.0,
        }
    }
}

// ─── Misc ─────────────────────────────────────────────────────────────────

/// Arrow-key nudge distances in font units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NudgeConfig {
    pub small: f64,
    /// With Shift.
    pub large: f64,
    /// With Ctrl/Cmd.
    pub huge: f64,
}

impl Default for NudgeConfig {
    fn default() -> Self {
        Self {
            small: 1.0,
            large: 10.0,
            huge: 100.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomConfig {
    pub min: f64,
    pub max: f64,
    /// Multiplicative step for zoom in/out shortcuts.
    pub step: f64,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            min: 0.05,
            max: 64.0,
            step: 1.25,
        }
    }
}

// ─── Root ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub gesture: GestureConfig,
    pub snap: SnapConfig,
    /// Hit radius in screen pixels; converted to scene units by zoom.
    pub hit_radius_px: f64,
    /// Maximum number of undo entries kept.
    pub undo_depth: usize,
    pub nudge: NudgeConfig,
    pub zoom: ZoomConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            gesture: GestureConfig::default(),
            snap: SnapConfig::default(),
            hit_radius_px: 6.0,
            undo_depth: 200,
            nudge: NudgeConfig::default(),
            zoom: ZoomConfig::default(),
        }
    }
}

impl EditorConfig {
    /// Load a (possibly partial) JSON config. Missing keys keep defaults.
    ///
    /// # Errors
    /// Returns [`ConfigError`] on malformed JSON or out-of-range values.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gesture.drag_threshold < 0.0 {
            return Err(ConfigError::Invalid(
                "gesture.drag_threshold must not be negative".into(),
            ));
        }
        if self.hit_radius_px <= 0.0 {
            return Err(ConfigError::Invalid("hit_radius_px must be positive".into()));
        }
        if self.zoom.min <= 0.0 || self.zoom.min > self.zoom.max {
            return Err(ConfigError::Invalid("zoom range is empty".into()));
        }
        if self.undo_depth == 0 {
            return Err(ConfigError::Invalid("undo_depth must be at least 1".into()));
        }
        Ok(())
    }
}
