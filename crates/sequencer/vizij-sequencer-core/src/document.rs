use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::SequencerError;
use crate::store::{Keyframe, KeyframeStore};

pub const DOCUMENT_VERSION: u32 = 1;

fn default_version() -> u32 {
    DOCUMENT_VERSION
}

/// Saved keyframe sequence: the timeline length plus every keyframe.
///
/// JSON shape:
/// ```json
/// { "version": 1, "duration": 15.0,
///   "keyframes": [ { "id": 0, "time": 2.5, "pose": { "root": { "pos": [..], "hpr": [..], "scale": [..] }, "joints": { .. } } } ] }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SequenceDocument {
    #[serde(default = "default_version")]
    pub version: u32,
    pub duration: f32,
    #[serde(default)]
    pub keyframes: Vec<Keyframe>,
}

impl SequenceDocument {
    /// Snapshot a store.
    pub fn from_store(store: &KeyframeStore) -> Self {
        Self {
            version: DOCUMENT_VERSION,
            duration: store.duration(),
            keyframes: store.keyframes().to_vec(),
        }
    }

    /// Check version, duration, keyframe times and id uniqueness.
    pub fn validate(&self) -> Result<(), SequencerError> {
        if self.version > DOCUMENT_VERSION {
            return Err(SequencerError::Serialization {
                reason: format!(
                    "document version {} is newer than supported version {DOCUMENT_VERSION}",
                    self.version
                ),
            });
        }
        if !(self.duration.is_finite() && self.duration > 0.0) {
            return Err(SequencerError::Serialization {
                reason: format!("duration must be positive, got {}", self.duration),
            });
        }
        let mut seen = HashSet::with_capacity(self.keyframes.len());
        for kf in &self.keyframes {
            if !kf.time.is_finite() {
                return Err(SequencerError::InvalidTime { time: kf.time });
            }
            if kf.time < 0.0 || kf.time > self.duration {
                return Err(SequencerError::TimeOutOfRange {
                    time: kf.time,
                    start: 0.0,
                    end: self.duration,
                });
            }
            if !seen.insert(kf.id) {
                return Err(SequencerError::Serialization {
                    reason: format!("duplicate keyframe id {}", kf.id),
                });
            }
        }
        Ok(())
    }

    pub fn to_json_string(&self) -> Result<String, SequencerError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Parse and validate a saved sequence. Keyframes come back sorted by time.
pub fn parse_sequence_document_json(s: &str) -> Result<SequenceDocument, SequencerError> {
    let mut doc: SequenceDocument = serde_json::from_str(s)?;
    doc.validate()?;
    doc.keyframes.sort_by(|a, b| a.time.total_cmp(&b.time));
    Ok(doc)
}
