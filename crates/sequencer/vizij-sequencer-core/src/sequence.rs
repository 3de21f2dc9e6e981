//! One-shot playback of the whole keyframe sequence.
//!
//! The keyframes are snapshotted into a list of segments covering
//! `[0, duration]`: a leading hold up to the first keyframe, one blend per
//! consecutive pair, and a trailing hold after the last keyframe. The player
//! walks the segments as the host feeds it elapsed time.

use serde::{Deserialize, Serialize};

use crate::config::RotationMode;
use crate::error::SequencerError;
use crate::events::{EventQueue, TimelineEvent};
use crate::interp::functions::lerp_pose;
use crate::scene::{apply_pose, SceneGraph};
use crate::store::Keyframe;
use crate::transform::Pose;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    /// Constant pose over the whole segment.
    Hold,
    /// Linear blend from `from` to `to`.
    Interpolate,
}

/// A timed piece of the sequence. `start`/`end` are absolute timeline seconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub kind: SegmentKind,
    pub start: f32,
    pub end: f32,
    pub from: Pose,
    pub to: Pose,
}

impl Segment {
    fn hold(start: f32, end: f32, pose: &Pose) -> Self {
        Self {
            kind: SegmentKind::Hold,
            start,
            end,
            from: pose.clone(),
            to: pose.clone(),
        }
    }

    #[inline]
    pub fn duration(&self) -> f32 {
        self.end - self.start
    }

    /// Pose at absolute time `time`, clamped to the segment.
    pub fn pose_at(&self, time: f32, mode: RotationMode) -> Pose {
        match self.kind {
            SegmentKind::Hold => self.from.clone(),
            SegmentKind::Interpolate => {
                let span = self.duration();
                let t = if span > 0.0 {
                    ((time - self.start) / span).clamp(0.0, 1.0)
                } else {
                    1.0
                };
                lerp_pose(&self.from, &self.to, t, mode)
            }
        }
    }
}

/// Build the segment list for a sorted keyframe slice.
/// Zero-length segments are skipped. Empty input is `EmptyStore`.
pub fn build_segments(
    keyframes: &[Keyframe],
    duration: f32,
) -> Result<Vec<Segment>, SequencerError> {
    let (Some(first), Some(last)) = (keyframes.first(), keyframes.last()) else {
        return Err(SequencerError::EmptyStore);
    };
    let mut segments = Vec::with_capacity(keyframes.len() + 1);
    if first.time > 0.0 {
        segments.push(Segment::hold(0.0, first.time, &first.pose));
    }
    for pair in keyframes.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        if b.time > a.time {
            segments.push(Segment {
                kind: SegmentKind::Interpolate,
                start: a.time,
                end: b.time,
                from: a.pose.clone(),
                to: b.pose.clone(),
            });
        }
    }
    if last.time < duration {
        segments.push(Segment::hold(last.time, duration, &last.pose));
    }
    Ok(segments)
}

#[derive(Debug, Clone)]
pub struct SequencePlayer {
    segments: Vec<Segment>,
    final_pose: Option<Pose>,
    current: usize,
    elapsed: f32,
    active: bool,
    rotation_mode: RotationMode,
    events: EventQueue,
}

impl Default for SequencePlayer {
    fn default() -> Self {
        Self::new(RotationMode::default())
    }
}

impl SequencePlayer {
    pub fn new(rotation_mode: RotationMode) -> Self {
        Self {
            segments: Vec::new(),
            final_pose: None,
            current: 0,
            elapsed: 0.0,
            active: false,
            rotation_mode,
            events: EventQueue::default(),
        }
    }

    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.events = EventQueue::with_capacity(capacity);
        self
    }

    #[inline]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Index of the segment being played.
    #[inline]
    pub fn current_segment(&self) -> Option<usize> {
        self.active.then_some(self.current)
    }

    /// Start playing `keyframes` from time 0.
    ///
    /// A sequence already in flight is finished first (snapped to its final
    /// pose). When the new sequence cannot be built, the running one is left alone.
    pub fn play(
        &mut self,
        keyframes: &[Keyframe],
        duration: f32,
        scene: &mut dyn SceneGraph,
    ) -> Result<usize, SequencerError> {
        let segments = build_segments(keyframes, duration)?;
        if self.active {
            log::debug!("sequence restarted; finishing previous run");
            self.finish(scene);
        }
        self.final_pose = keyframes.last().map(|k| k.pose.clone());
        self.segments = segments;
        self.current = 0;
        self.elapsed = 0.0;
        self.active = true;
        let count = self.segments.len();
        self.events
            .push(TimelineEvent::SequenceStarted { segments: count });
        log::debug!("sequence started with {count} segment(s)");

        match self.segments.first() {
            Some(seg) => apply_pose(scene, &seg.from),
            None => self.finish(scene),
        }
        Ok(count)
    }

    /// Advance by `dt` seconds and apply the resulting pose.
    /// Returns whether the sequence is still running.
    pub fn update(&mut self, dt: f32, scene: &mut dyn SceneGraph) -> bool {
        if !self.active {
            return false;
        }
        if dt.is_finite() && dt > 0.0 {
            self.elapsed += dt;
        }
        while let Some(seg) = self.segments.get(self.current) {
            if self.elapsed < seg.end {
                break;
            }
            apply_pose(scene, &seg.to);
            self.current += 1;
        }
        match self.segments.get(self.current) {
            Some(seg) => {
                let pose = seg.pose_at(self.elapsed, self.rotation_mode);
                apply_pose(scene, &pose);
                true
            }
            None => {
                self.finish(scene);
                false
            }
        }
    }

    /// Snap to the final pose and stop. No-op when idle.
    pub fn finish(&mut self, scene: &mut dyn SceneGraph) {
        if !self.active {
            return;
        }
        if let Some(pose) = &self.final_pose {
            apply_pose(scene, pose);
        }
        self.active = false;
        self.current = self.segments.len();
        self.events.push(TimelineEvent::SequenceFinished);
        log::debug!("sequence finished at elapsed={}", self.elapsed);
    }

    /// Stop where it is, without snapping.
    pub fn cancel(&mut self) {
        if self.active {
            log::debug!("sequence cancelled at elapsed={}", self.elapsed);
        }
        self.active = false;
    }

    /// Pose the current segment list yields at `elapsed`, without touching state.
    pub fn pose_at_elapsed(&self, elapsed: f32) -> Option<Pose> {
        let seg = self
            .segments
            .iter()
            .find(|s| elapsed < s.end)
            .or_else(|| self.segments.last())?;
        Some(seg.pose_at(elapsed, self.rotation_mode))
    }

    pub fn drain_events(&mut self) -> Vec<TimelineEvent> {
        self.events.drain()
    }
}
