//! Semantic events emitted by the store, the controller and the players.
//!
//! Components buffer events in an `EventQueue`; hosts drain them once per
//! frame (usually through `EditorSession::drain_events`) and forward them to
//! their UI layer.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::ids::KeyframeId;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum TimelineEvent {
    KeyframeCreated {
        id: KeyframeId,
        time: f32,
    },
    KeyframeRemoved {
        id: KeyframeId,
    },
    KeyframeChanged {
        id: KeyframeId,
        time: f32,
    },
    KeyframesCleared,
    SelectionChanged {
        selected: Option<KeyframeId>,
    },
    CursorMoved {
        time: f32,
    },
    PlaybackStarted {
        time: f32,
    },
    PlaybackStopped {
        time: f32,
    },
    PlaybackEnded {
        time: f32,
    },
    SequenceStarted {
        segments: usize,
    },
    SequenceFinished,
}

impl TimelineEvent {
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::KeyframeCreated { .. } => "keyframe_created",
            Self::KeyframeRemoved { .. } => "keyframe_removed",
            Self::KeyframeChanged { .. } => "keyframe_changed",
            Self::KeyframesCleared => "keyframes_cleared",
            Self::SelectionChanged { .. } => "selection_changed",
            Self::CursorMoved { .. } => "cursor_moved",
            Self::PlaybackStarted { .. } => "playback_started",
            Self::PlaybackStopped { .. } => "playback_stopped",
            Self::PlaybackEnded { .. } => "playback_ended",
            Self::SequenceStarted { .. } => "sequence_started",
            Self::SequenceFinished => "sequence_finished",
        }
    }

    /// Events that describe a change to the keyframe store.
    #[inline]
    pub fn is_modification_event(&self) -> bool {
        matches!(
            self,
            Self::KeyframeCreated { .. }
                | Self::KeyframeRemoved { .. }
                | Self::KeyframeChanged { .. }
                | Self::KeyframesCleared
        )
    }

    #[inline]
    pub fn is_playback_event(&self) -> bool {
        matches!(
            self,
            Self::PlaybackStarted { .. }
                | Self::PlaybackStopped { .. }
                | Self::PlaybackEnded { .. }
                | Self::SequenceStarted { .. }
                | Self::SequenceFinished
        )
    }
}

/// Bounded FIFO of pending events. When full, the oldest event is dropped.
#[derive(Clone, Debug)]
pub struct EventQueue {
    events: VecDeque<TimelineEvent>,
    capacity: usize,
    dropped: u64,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::with_capacity(1024)
    }
}

impl EventQueue {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: VecDeque::new(),
            capacity: capacity.max(1),
            dropped: 0,
        }
    }

    pub fn push(&mut self, event: TimelineEvent) {
        if self.events.len() >= self.capacity {
            self.events.pop_front();
            self.dropped += 1;
            log::warn!(
                "event queue full (capacity {}), dropped oldest event",
                self.capacity
            );
        }
        self.events.push_back(event);
    }

    pub fn drain(&mut self) -> Vec<TimelineEvent> {
        self.events.drain(..).collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Total number of events discarded because of overflow.
    #[inline]
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimelineEvent> {
        self.events.iter()
    }
}
