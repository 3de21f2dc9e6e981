//! Error types for the sequencer core

use serde::{Deserialize, Serialize};

use crate::ids::KeyframeId;

/// Error type for store, interpolation, and editor operations.
///
/// None of these are fatal: every failing operation leaves the keyframe store
/// in its last valid state.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum SequencerError {
    /// A keyframe already sits within the duplicate tolerance of the requested time
    #[error("Keyframe {existing} already exists within tolerance of t={time}")]
    DuplicateTime { time: f32, existing: KeyframeId },

    /// Keyframe id not present in the store
    #[error("Keyframe not found: {id}")]
    NotFound { id: KeyframeId },

    /// Every keyframe id has been handed out or reserved by a loaded document
    #[error("No keyframe ids left to allocate")]
    IdsExhausted,

    /// Interpolation or playback requested on a store without keyframes
    #[error("Keyframe store is empty")]
    EmptyStore,

    /// A user-entered transform field failed to parse
    #[error("Invalid value for {field}: {input:?}")]
    InvalidTransformValue { field: String, input: String },

    /// Time outside the timeline range
    #[error("Time {time} is out of range [{start}, {end}]")]
    TimeOutOfRange { time: f32, start: f32, end: f32 },

    /// Non-finite time value
    #[error("Invalid time value: {time}")]
    InvalidTime { time: f32 },

    /// Configuration failed validation
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// Document or config (de)serialization failure
    #[error("Serialization error: {reason}")]
    Serialization { reason: String },
}

impl SequencerError {
    /// Recoverable errors are the ones an editor reports and carries on from
    /// without any further action (the caller may re-prompt or ignore).
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::DuplicateTime { .. }
                | Self::NotFound { .. }
                | Self::InvalidTransformValue { .. }
                | Self::TimeOutOfRange { .. }
        )
    }

    /// Get error category for logging
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::DuplicateTime { .. } | Self::NotFound { .. } | Self::IdsExhausted => "store",
            Self::EmptyStore => "precondition",
            Self::InvalidTransformValue { .. }
            | Self::TimeOutOfRange { .. }
            | Self::InvalidTime { .. } => "validation",
            Self::InvalidConfig { .. } => "config",
            Self::Serialization { .. } => "serialization",
        }
    }
}

impl From<serde_json::Error> for SequencerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            reason: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for SequencerError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            reason: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for SequencerError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_recoverability() {
        let dup = SequencerError::DuplicateTime {
            time: 5.0,
            existing: KeyframeId(1),
        };
        assert!(dup.is_recoverable());
        assert!(!SequencerError::EmptyStore.is_recoverable());
        assert!(!SequencerError::IdsExhausted.is_recoverable());
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(
            SequencerError::NotFound { id: KeyframeId(3) }.category(),
            "store"
        );
        assert_eq!(SequencerError::EmptyStore.category(), "precondition");
        assert_eq!(
            SequencerError::InvalidTime { time: f32::NAN }.category(),
            "validation"
        );
    }

    #[test]
    fn test_display() {
        let err = SequencerError::NotFound { id: KeyframeId(3) };
        assert_eq!(err.to_string(), "Keyframe not found: kf3");
    }

    #[test]
    fn test_serialization() {
        let error = SequencerError::InvalidTransformValue {
            field: "pos.x".into(),
            input: "abc".into(),
        };
        let serialized = serde_json::to_string(&error).unwrap();
        let deserialized: SequencerError = serde_json::from_str(&serialized).unwrap();
        assert_eq!(error, deserialized);
    }
}
