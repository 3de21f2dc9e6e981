//! Configuration for the sequencer core.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::SequencerError;

/// How heading/pitch/roll angles are blended between two keyframes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationMode {
    /// Per-axis linear blend of the raw angles. Not gimbal-safe.
    #[default]
    Euler,
    /// Per-axis blend along the shorter arc (deltas wrapped to (-180, 180]).
    ShortestArc,
}

/// Editor-facing sizing, tolerances and timing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencerConfig {
    /// Timeline length in seconds.
    pub duration: f32,
    /// Initial pixel width of the timeline view.
    pub pixel_length: u32,
    /// Hit-test radius around a keyframe marker, in pixels.
    /// Also drives the duplicate-insert tolerance (`kf_tolerance_px * scale`).
    pub kf_tolerance_px: f32,
    /// Radius used by the "remove near time" gesture, in seconds.
    pub remove_tolerance: f32,
    /// Wall-clock interval between playback ticks, in milliseconds.
    pub tick_interval_ms: u32,
    /// Timeline seconds advanced per playback tick.
    pub tick_dt: f32,
    pub rotation_mode: RotationMode,
    /// Spacing of ruler labels in the render model, in pixels.
    pub ruler_spacing_px: u32,
    /// Events retained per component between drains before the oldest are dropped.
    pub max_events_per_tick: usize,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            duration: 15.0,
            pixel_length: 800,
            kf_tolerance_px: 7.0,
            remove_tolerance: 0.1,
            tick_interval_ms: 50,
            tick_dt: 0.1,
            rotation_mode: RotationMode::Euler,
            ruler_spacing_px: 100,
            max_events_per_tick: 1024,
        }
    }
}

impl SequencerConfig {
    /// Real-time playback: each 50 ms tick advances 50 ms of timeline.
    pub fn realtime() -> Self {
        Self {
            tick_interval_ms: 50,
            tick_dt: 0.05,
            ..Self::default()
        }
    }

    pub fn with_duration(mut self, duration: f32) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_pixel_length(mut self, pixel_length: u32) -> Self {
        self.pixel_length = pixel_length;
        self
    }

    pub fn with_rotation_mode(mut self, mode: RotationMode) -> Self {
        self.rotation_mode = mode;
        self
    }

    #[inline]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.tick_interval_ms))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), SequencerError> {
        if !(self.duration.is_finite() && self.duration > 0.0) {
            return Err(SequencerError::InvalidConfig {
                reason: format!("duration must be positive and finite, got {}", self.duration),
            });
        }
        if self.pixel_length == 0 {
            return Err(SequencerError::InvalidConfig {
                reason: "pixel_length must be greater than 0".to_string(),
            });
        }
        if !(self.kf_tolerance_px.is_finite() && self.kf_tolerance_px >= 0.0) {
            return Err(SequencerError::InvalidConfig {
                reason: "kf_tolerance_px must be non-negative".to_string(),
            });
        }
        if !(self.remove_tolerance.is_finite() && self.remove_tolerance >= 0.0) {
            return Err(SequencerError::InvalidConfig {
                reason: "remove_tolerance must be non-negative".to_string(),
            });
        }
        if self.tick_interval_ms == 0 || !(self.tick_dt.is_finite() && self.tick_dt > 0.0) {
            return Err(SequencerError::InvalidConfig {
                reason: "tick interval and tick_dt must be positive".to_string(),
            });
        }
        if self.ruler_spacing_px == 0 || self.max_events_per_tick == 0 {
            return Err(SequencerError::InvalidConfig {
                reason: "ruler spacing and event capacity must be greater than 0".to_string(),
            });
        }
        Ok(())
    }

    /// Parse and validate a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, SequencerError> {
        let cfg: Self = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn to_toml_string(&self) -> Result<String, SequencerError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        SequencerConfig::default().validate().unwrap();
        SequencerConfig::realtime().validate().unwrap();
    }

    #[test]
    fn rejects_zero_duration() {
        let cfg = SequencerConfig::default().with_duration(0.0);
        assert!(matches!(
            cfg.validate(),
            Err(SequencerError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn rejects_zero_pixel_length() {
        let cfg = SequencerConfig::default().with_pixel_length(0);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let cfg = SequencerConfig::from_toml_str(
            r#"
            duration = 30.0
            rotation_mode = "shortest_arc"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.duration, 30.0);
        assert_eq!(cfg.rotation_mode, RotationMode::ShortestArc);
        assert_eq!(cfg.kf_tolerance_px, 7.0);
        assert_eq!(cfg.tick_interval(), Duration::from_millis(50));
    }

    #[test]
    fn toml_round_trip() {
        let cfg = SequencerConfig::default().with_duration(42.0);
        let text = cfg.to_toml_string().unwrap();
        assert_eq!(SequencerConfig::from_toml_str(&text).unwrap(), cfg);
    }

    #[test]
    fn invalid_toml_values_are_rejected() {
        let err = SequencerConfig::from_toml_str("tick_dt = -1.0").unwrap_err();
        assert_eq!(err.category(), "config");
    }
}
