//! Vizij Sequencer Core (engine-agnostic)
//!
//! Keyframe timeline and transform sequencer for editors: time-sorted pose
//! keyframes, piecewise-linear sampling, pointer-driven timeline editing, a
//! fixed-step playback clock and a one-shot sequence player. Scenes, widgets
//! and windowing stay with the host behind the `SceneGraph` and
//! `TimelineRenderer` traits.

pub mod config;
pub mod controller;
pub mod document;
pub mod error;
pub mod events;
pub mod ids;
pub mod input;
pub mod interp;
pub mod playback;
pub mod render;
pub mod sampling;
pub mod scene;
pub mod sequence;
pub mod session;
pub mod store;
pub mod timeline;
pub mod transform;

// Re-exports for hosts
pub use config::{RotationMode, SequencerConfig};
pub use controller::{DragState, TimelineController};
pub use document::{parse_sequence_document_json, SequenceDocument, DOCUMENT_VERSION};
pub use error::SequencerError;
pub use events::{EventQueue, TimelineEvent};
pub use ids::KeyframeId;
pub use input::{Action, InputEvent, KeyBindings};
pub use playback::{PlaybackScheduler, PlaybackState, TickOutcome};
pub use render::{MarkerView, RulerLabel, TimelineRenderer, TimelineView};
pub use sampling::{find_segment, pose_at};
pub use scene::{apply_pose, capture_pose, MemoryScene, SceneGraph};
pub use sequence::{build_segments, Segment, SegmentKind, SequencePlayer};
pub use session::EditorSession;
pub use store::{Keyframe, KeyframeStore};
pub use timeline::{format_time, Timeline};
pub use transform::{Pose, Transform, TransformTarget};

pub type Result<T> = core::result::Result<T, SequencerError>;
