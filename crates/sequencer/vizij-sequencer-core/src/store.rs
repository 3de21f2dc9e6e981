//! Time-sorted keyframe storage.
//!
//! The store owns the keyframes of one editing session, keeps them sorted by
//! time after every mutation, rejects near-duplicate inserts, and normalizes
//! joint sets so that every keyframe carries the same joints in the same order.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::config::RotationMode;
use crate::error::SequencerError;
use crate::events::{EventQueue, TimelineEvent};
use crate::ids::{IdAllocator, KeyframeId};
use crate::sampling::pose_at;
use crate::transform::{Pose, Transform, TransformTarget};

/// A pose snapshot at a point on the timeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub id: KeyframeId,
    /// Seconds from the start of the timeline.
    pub time: f32,
    pub pose: Pose,
}

#[derive(Debug, Clone)]
pub struct KeyframeStore {
    keyframes: Vec<Keyframe>,
    duration: f32,
    /// Minimum spacing (seconds) enforced by `add`.
    duplicate_tolerance: f32,
    /// Union of joint names across keyframes, in first-seen order.
    joint_names: IndexSet<String>,
    rotation_mode: RotationMode,
    ids: IdAllocator,
    events: EventQueue,
}

impl KeyframeStore {
    pub fn new(duration: f32, duplicate_tolerance: f32) -> Self {
        Self {
            keyframes: Vec::new(),
            duration: duration.max(0.0),
            duplicate_tolerance: duplicate_tolerance.max(0.0),
            joint_names: IndexSet::new(),
            rotation_mode: RotationMode::default(),
            ids: IdAllocator::new(),
            events: EventQueue::default(),
        }
    }

    pub fn with_rotation_mode(mut self, mode: RotationMode) -> Self {
        self.rotation_mode = mode;
        self
    }

    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.events = EventQueue::with_capacity(capacity);
        self
    }

    #[inline]
    pub fn duration(&self) -> f32 {
        self.duration
    }

    #[inline]
    pub fn duplicate_tolerance(&self) -> f32 {
        self.duplicate_tolerance
    }

    #[inline]
    pub fn rotation_mode(&self) -> RotationMode {
        self.rotation_mode
    }

    pub fn set_duplicate_tolerance(&mut self, tolerance: f32) {
        self.duplicate_tolerance = if tolerance.is_finite() {
            tolerance.max(0.0)
        } else {
            0.0
        };
    }

    /// Change the timeline length. Keyframes beyond the new end are pulled back onto it.
    ///
    /// Fails with `DuplicateTime`, leaving the store untouched, when a pulled-in
    /// keyframe would land within the duplicate tolerance of another one.
    pub fn set_duration(&mut self, duration: f32) -> Result<(), SequencerError> {
        if !(duration.is_finite() && duration > 0.0) {
            return Err(SequencerError::InvalidTime { time: duration });
        }
        let moved = self.keyframes.partition_point(|k| k.time <= duration);
        if let [pulled, rest @ ..] = &self.keyframes[moved..] {
            let existing = if rest.is_empty() {
                moved
                    .checked_sub(1)
                    .map(|i| &self.keyframes[i])
                    .filter(|k| {
                        let gap = duration - k.time;
                        gap <= 0.0 || gap < self.duplicate_tolerance
                    })
                    .map(|k| k.id)
            } else {
                Some(pulled.id)
            };
            if let Some(existing) = existing {
                log::warn!("refusing duration {duration}: keyframes would collapse onto {existing}");
                return Err(SequencerError::DuplicateTime {
                    time: duration,
                    existing,
                });
            }
        }
        self.duration = duration;
        for kf in self.keyframes.iter_mut().filter(|k| k.time > duration) {
            kf.time = duration;
            self.events.push(TimelineEvent::KeyframeChanged {
                id: kf.id,
                time: duration,
            });
        }
        Ok(())
    }

    /// Insert a new keyframe.
    ///
    /// Fails with `DuplicateTime` when another keyframe lies strictly closer
    /// than the duplicate tolerance, with `TimeOutOfRange` outside
    /// `[0, duration]`, and with `IdsExhausted` once no fresh id is left.
    /// Joint sets are normalized before insertion.
    pub fn add(&mut self, time: f32, pose: Pose) -> Result<KeyframeId, SequencerError> {
        if !time.is_finite() {
            return Err(SequencerError::InvalidTime { time });
        }
        if time < 0.0 || time > self.duration {
            return Err(SequencerError::TimeOutOfRange {
                time,
                start: 0.0,
                end: self.duration,
            });
        }
        if let Some(existing) = self
            .keyframes
            .iter()
            .find(|k| (k.time - time).abs() < self.duplicate_tolerance)
        {
            log::warn!(
                "rejecting keyframe at t={time}: {} sits at t={}",
                existing.id,
                existing.time
            );
            return Err(SequencerError::DuplicateTime {
                time,
                existing: existing.id,
            });
        }

        if self.ids.peek().is_none() {
            log::warn!("rejecting keyframe at t={time}: keyframe ids exhausted");
            return Err(SequencerError::IdsExhausted);
        }

        let pose = self.normalize_joints(time, pose)?;
        let id = self
            .ids
            .alloc_keyframe()
            .ok_or(SequencerError::IdsExhausted)?;
        let pos = self.keyframes.partition_point(|k| k.time <= time);
        self.keyframes.insert(pos, Keyframe { id, time, pose });
        log::debug!("added keyframe {id} at t={time} (index {pos})");
        self.events.push(TimelineEvent::KeyframeCreated { id, time });
        Ok(id)
    }

    /// Fill joints the store knows but `pose` lacks (sampled from the existing
    /// keyframes at `time`), and back-fill joints only `pose` carries into
    /// every existing keyframe as a hold.
    fn normalize_joints(&mut self, time: f32, pose: Pose) -> Result<Pose, SequencerError> {
        let needs_fill = self
            .joint_names
            .iter()
            .any(|name| !pose.joints.contains_key(name));
        let sampled = if needs_fill && !self.keyframes.is_empty() {
            Some(pose_at(&self.keyframes, time, self.rotation_mode)?)
        } else {
            None
        };

        for (name, tf) in &pose.joints {
            if self.joint_names.insert(name.clone()) {
                for kf in &mut self.keyframes {
                    kf.pose.joints.insert(name.clone(), *tf);
                }
            }
        }

        let mut joints = IndexMap::with_capacity(self.joint_names.len());
        for name in &self.joint_names {
            let tf = pose
                .joints
                .get(name)
                .copied()
                .or_else(|| sampled.as_ref().and_then(|s| s.joints.get(name).copied()))
                .unwrap_or(Transform::IDENTITY);
            joints.insert(name.clone(), tf);
        }
        Ok(Pose {
            root: pose.root,
            joints,
        })
    }

    /// Remove a keyframe by id. The store is unchanged when the id is unknown.
    pub fn remove_by_id(&mut self, id: KeyframeId) -> Result<Keyframe, SequencerError> {
        let idx = self
            .index_of(id)
            .ok_or(SequencerError::NotFound { id })?;
        let removed = self.keyframes.remove(idx);
        log::debug!("removed keyframe {id} at t={}", removed.time);
        self.events.push(TimelineEvent::KeyframeRemoved { id });
        self.forget_joints_if_empty();
        Ok(removed)
    }

    /// Remove every keyframe with `|time - target| <= tolerance`.
    pub fn remove_near(&mut self, target: f32, tolerance: f32) -> Vec<KeyframeId> {
        let mut removed = Vec::new();
        self.keyframes.retain(|k| {
            let hit = (k.time - target).abs() <= tolerance;
            if hit {
                removed.push(k.id);
            }
            !hit
        });
        for id in &removed {
            self.events.push(TimelineEvent::KeyframeRemoved { id: *id });
        }
        if !removed.is_empty() {
            log::debug!("removed {} keyframe(s) near t={target}", removed.len());
        }
        self.forget_joints_if_empty();
        removed
    }

    /// Remove the latest keyframe in time, if any.
    pub fn remove_last(&mut self) -> Option<Keyframe> {
        let removed = self.keyframes.pop()?;
        self.events
            .push(TimelineEvent::KeyframeRemoved { id: removed.id });
        self.forget_joints_if_empty();
        Some(removed)
    }

    /// Move a keyframe in time. The new time is clamped to `[0, duration]`;
    /// the clamped value is returned.
    pub fn update_time(&mut self, id: KeyframeId, new_time: f32) -> Result<f32, SequencerError> {
        if new_time.is_nan() {
            return Err(SequencerError::InvalidTime { time: new_time });
        }
        let idx = self
            .index_of(id)
            .ok_or(SequencerError::NotFound { id })?;
        let time = new_time.clamp(0.0, self.duration);
        let mut kf = self.keyframes.remove(idx);
        kf.time = time;
        let pos = self.keyframes.partition_point(|k| k.time <= time);
        self.keyframes.insert(pos, kf);
        self.events.push(TimelineEvent::KeyframeChanged { id, time });
        Ok(time)
    }

    /// Replace one transform of a keyframe's pose. A joint the store has not
    /// seen yet is added to every keyframe with this value.
    pub fn set_transform(
        &mut self,
        id: KeyframeId,
        target: &TransformTarget,
        transform: Transform,
    ) -> Result<(), SequencerError> {
        let idx = self
            .index_of(id)
            .ok_or(SequencerError::NotFound { id })?;
        match target {
            TransformTarget::Root => self.keyframes[idx].pose.root = transform,
            TransformTarget::Joint(name) => {
                if self.joint_names.insert(name.clone()) {
                    for kf in &mut self.keyframes {
                        kf.pose.joints.insert(name.clone(), transform);
                    }
                } else {
                    self.keyframes[idx]
                        .pose
                        .joints
                        .insert(name.clone(), transform);
                }
            }
        }
        let time = self.keyframes[idx].time;
        self.events.push(TimelineEvent::KeyframeChanged { id, time });
        Ok(())
    }

    /// Remove all keyframes. Ids keep counting up afterwards.
    pub fn clear(&mut self) {
        self.keyframes.clear();
        self.joint_names.clear();
        log::debug!("cleared keyframe store");
        self.events.push(TimelineEvent::KeyframesCleared);
    }

    /// Replace the contents with previously saved keyframes.
    ///
    /// Ids must be unique and times inside `[0, duration]`. Poses are taken
    /// as-is; joints missing from some keyframes fall back to one-sided holds
    /// during sampling.
    pub fn load_keyframes(&mut self, mut keyframes: Vec<Keyframe>) -> Result<(), SequencerError> {
        let mut seen = HashSet::with_capacity(keyframes.len());
        for kf in &keyframes {
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
        keyframes.sort_by(|a, b| a.time.total_cmp(&b.time));

        if !self.keyframes.is_empty() {
            self.clear();
        }
        self.joint_names.clear();
        for kf in &keyframes {
            self.ids.reserve_past(kf.id);
            for name in kf.pose.joints.keys() {
                self.joint_names.insert(name.clone());
            }
            self.events.push(TimelineEvent::KeyframeCreated {
                id: kf.id,
                time: kf.time,
            });
        }
        self.keyframes = keyframes;
        Ok(())
    }

    fn forget_joints_if_empty(&mut self) {
        if self.keyframes.is_empty() {
            self.joint_names.clear();
        }
    }

    /// First keyframe (in ascending time order) whose marker lies within
    /// `tolerance_px` pixels of `pixel_x`. The lowest time wins a tie.
    pub fn find_nearest_within_pixels(
        &self,
        pixel_x: f32,
        tolerance_px: f32,
        scale: f32,
    ) -> Option<KeyframeId> {
        if !(scale > 0.0) {
            return None;
        }
        self.keyframes
            .iter()
            .find(|k| (pixel_x - k.time / scale).abs() <= tolerance_px)
            .map(|k| k.id)
    }

    #[inline]
    pub fn index_of(&self, id: KeyframeId) -> Option<usize> {
        self.keyframes.iter().position(|k| k.id == id)
    }

    #[inline]
    pub fn get(&self, id: KeyframeId) -> Option<&Keyframe> {
        self.keyframes.iter().find(|k| k.id == id)
    }

    #[inline]
    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    #[inline]
    pub fn ids(&self) -> Vec<KeyframeId> {
        self.keyframes.iter().map(|k| k.id).collect()
    }

    #[inline]
    pub fn first(&self) -> Option<&Keyframe> {
        self.keyframes.first()
    }

    #[inline]
    pub fn last(&self) -> Option<&Keyframe> {
        self.keyframes.last()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    pub fn joint_names(&self) -> impl Iterator<Item = &str> {
        self.joint_names.iter().map(|s| s.as_str())
    }

    /// Sample the pose at `time` with the store's rotation mode.
    pub fn pose_at(&self, time: f32) -> Result<Pose, SequencerError> {
        pose_at(&self.keyframes, time, self.rotation_mode)
    }

    pub fn drain_events(&mut self) -> Vec<TimelineEvent> {
        self.events.drain()
    }

    pub fn pending_events(&self) -> &EventQueue {
        &self.events
    }
}
