//! Timeline geometry: duration, view width, and pixel/time conversion.

use serde::{Deserialize, Serialize};

use crate::error::SequencerError;

/// Timeline extent and the width of the view it is drawn into.
/// `scale` is seconds per pixel.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    duration: f32,
    pixel_length: u32,
}

impl Timeline {
    pub fn new(duration: f32, pixel_length: u32) -> Result<Self, SequencerError> {
        let mut tl = Self {
            duration: 1.0,
            pixel_length: 1,
        };
        tl.set_duration(duration)?;
        tl.set_pixel_length(pixel_length)?;
        Ok(tl)
    }

    #[inline]
    pub fn duration(&self) -> f32 {
        self.duration
    }

    #[inline]
    pub fn pixel_length(&self) -> u32 {
        self.pixel_length
    }

    pub fn set_duration(&mut self, duration: f32) -> Result<(), SequencerError> {
        if !(duration.is_finite() && duration > 0.0) {
            return Err(SequencerError::InvalidConfig {
                reason: format!("timeline duration must be positive, got {duration}"),
            });
        }
        self.duration = duration;
        Ok(())
    }

    /// Resize the view.
    pub fn set_pixel_length(&mut self, pixel_length: u32) -> Result<(), SequencerError> {
        if pixel_length == 0 {
            return Err(SequencerError::InvalidConfig {
                reason: "timeline pixel length must be greater than 0".to_string(),
            });
        }
        self.pixel_length = pixel_length;
        Ok(())
    }

    /// Seconds per pixel.
    #[inline]
    pub fn scale(&self) -> f32 {
        self.duration / self.pixel_length as f32
    }

    #[inline]
    pub fn pixel_to_time(&self, x: f32) -> f32 {
        x * self.scale()
    }

    #[inline]
    pub fn time_to_pixel(&self, time: f32) -> f32 {
        time / self.scale()
    }

    /// Clamp to `[0, duration]`. NaN maps to 0.
    #[inline]
    pub fn clamp_time(&self, time: f32) -> f32 {
        if time.is_nan() {
            return 0.0;
        }
        time.clamp(0.0, self.duration)
    }

    /// Convert a pixel offset into a time tolerance.
    #[inline]
    pub fn pixels_to_seconds(&self, px: f32) -> f32 {
        px * self.scale()
    }
}

/// Format seconds as `HH:MM:SS` (whole seconds, truncated) for ruler labels.
pub fn format_time(seconds: f32) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds as u64
    } else {
        0
    };
    let (m, s) = (total / 60, total % 60);
    let (h, m) = (m / 60, m % 60);
    format!("{h:02}:{m:02}:{s:02}")
}
