//! Pointer-driven timeline editing.
//!
//! `TimelineController` owns the keyframe store, the timeline geometry, the
//! playback clock and the selection/drag state. Pointer positions come in as
//! pixel offsets from the left edge of the timeline view.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::SequencerConfig;
use crate::error::SequencerError;
use crate::events::{EventQueue, TimelineEvent};
use crate::ids::KeyframeId;
use crate::playback::{PlaybackScheduler, PlaybackState, TickOutcome};
use crate::scene::{apply_pose, capture_pose, SceneGraph};
use crate::store::{Keyframe, KeyframeStore};
use crate::timeline::Timeline;
use crate::transform::Pose;

/// What a held pointer is currently dragging.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DragState {
    #[default]
    Idle,
    DraggingKeyframe(KeyframeId),
    DraggingCursor,
}

impl DragState {
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::DraggingKeyframe(_) => "dragging_keyframe",
            Self::DraggingCursor => "dragging_cursor",
        }
    }

    #[inline]
    pub fn is_dragging(&self) -> bool {
        !matches!(self, Self::Idle)
    }
}

#[derive(Debug, Clone)]
pub struct TimelineController {
    timeline: Timeline,
    store: KeyframeStore,
    playback: PlaybackScheduler,
    selected: Option<KeyframeId>,
    drag: DragState,
    /// Last pointer x while the pointer is over the view.
    hover_x: Option<f32>,
    kf_tolerance_px: f32,
    remove_tolerance: f32,
    events: EventQueue,
}

impl TimelineController {
    pub fn new(cfg: &SequencerConfig) -> Result<Self, SequencerError> {
        cfg.validate()?;
        let timeline = Timeline::new(cfg.duration, cfg.pixel_length)?;
        let store = KeyframeStore::new(cfg.duration, cfg.kf_tolerance_px * timeline.scale())
            .with_rotation_mode(cfg.rotation_mode)
            .with_event_capacity(cfg.max_events_per_tick);
        Ok(Self {
            timeline,
            store,
            playback: PlaybackScheduler::from_config(cfg),
            selected: None,
            drag: DragState::Idle,
            hover_x: None,
            kf_tolerance_px: cfg.kf_tolerance_px,
            remove_tolerance: cfg.remove_tolerance,
            events: EventQueue::with_capacity(cfg.max_events_per_tick),
        })
    }

    #[inline]
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    #[inline]
    pub fn store(&self) -> &KeyframeStore {
        &self.store
    }

    /// Direct store access for pose edits and bulk loads.
    /// Selection is re-validated by the next controller call that uses it.
    #[inline]
    pub fn store_mut(&mut self) -> &mut KeyframeStore {
        &mut self.store
    }

    #[inline]
    pub fn playback(&self) -> &PlaybackScheduler {
        &self.playback
    }

    #[inline]
    pub fn playback_state(&self) -> PlaybackState {
        self.playback.state()
    }

    #[inline]
    pub fn selected(&self) -> Option<KeyframeId> {
        self.selected
    }

    #[inline]
    pub fn drag_state(&self) -> DragState {
        self.drag
    }

    #[inline]
    pub fn hover_x(&self) -> Option<f32> {
        self.hover_x
    }

    /// Current cursor (and playback) time.
    #[inline]
    pub fn cursor_time(&self) -> f32 {
        self.playback.current_time()
    }

    #[inline]
    pub fn kf_tolerance_px(&self) -> f32 {
        self.kf_tolerance_px
    }

    /// Move the cursor, clamped to the timeline.
    pub fn set_cursor_time(&mut self, time: f32) -> f32 {
        let time = self.timeline.clamp_time(time);
        self.playback.seek(time);
        self.events.push(TimelineEvent::CursorMoved { time });
        time
    }

    fn set_selected(&mut self, selected: Option<KeyframeId>) {
        if self.selected != selected {
            self.selected = selected;
            self.events.push(TimelineEvent::SelectionChanged { selected });
        }
    }

    /// Drop the selection if its keyframe no longer exists.
    fn revalidate_selection(&mut self) {
        if let Some(id) = self.selected {
            if self.store.get(id).is_none() {
                self.set_selected(None);
            }
        }
        if let DragState::DraggingKeyframe(id) = self.drag {
            if self.store.get(id).is_none() {
                self.drag = DragState::Idle;
            }
        }
    }

    /// Press at pixel `x`: moves the cursor, then grabs the keyframe under the
    /// pointer or starts dragging the cursor. Replaces any drag in progress.
    pub fn pointer_down(&mut self, x: f32) -> DragState {
        self.hover_x = Some(x);
        self.set_cursor_time(self.timeline.pixel_to_time(x));
        let hit = self
            .store
            .find_nearest_within_pixels(x, self.kf_tolerance_px, self.timeline.scale());
        self.set_selected(hit);
        self.drag = match hit {
            Some(id) => DragState::DraggingKeyframe(id),
            None => DragState::DraggingCursor,
        };
        log::debug!("pointer down x={x} -> {}", self.drag.name());
        self.drag
    }

    pub fn pointer_move(&mut self, x: f32) -> Result<(), SequencerError> {
        self.hover_x = Some(x);
        match self.drag {
            DragState::Idle => Ok(()),
            DragState::DraggingCursor => {
                self.set_cursor_time(self.timeline.pixel_to_time(x));
                Ok(())
            }
            DragState::DraggingKeyframe(id) => {
                let time = self.timeline.clamp_time(self.timeline.pixel_to_time(x));
                match self.store.update_time(id, time) {
                    Ok(time) => {
                        self.set_cursor_time(time);
                        Ok(())
                    }
                    Err(e) => {
                        self.drag = DragState::Idle;
                        Err(e)
                    }
                }
            }
        }
    }

    /// Release. The selection survives.
    pub fn pointer_up(&mut self) {
        self.drag = DragState::Idle;
    }

    pub fn pointer_enter(&mut self, x: f32) {
        self.hover_x = Some(x);
    }

    pub fn pointer_leave(&mut self) {
        self.hover_x = None;
    }

    /// Delete the selected keyframe. `Ok(None)` when nothing is selected.
    pub fn delete_selected(&mut self) -> Result<Option<Keyframe>, SequencerError> {
        let Some(id) = self.selected else {
            return Ok(None);
        };
        self.set_selected(None);
        if self.drag == DragState::DraggingKeyframe(id) {
            self.drag = DragState::Idle;
        }
        self.store.remove_by_id(id).map(Some)
    }

    /// Remove the latest keyframe in time.
    pub fn remove_last(&mut self) -> Option<Keyframe> {
        let removed = self.store.remove_last();
        self.revalidate_selection();
        removed
    }

    /// Remove keyframes within the configured radius of the cursor.
    pub fn remove_near_cursor(&mut self) -> Vec<KeyframeId> {
        let removed = self
            .store
            .remove_near(self.cursor_time(), self.remove_tolerance);
        self.revalidate_selection();
        removed
    }

    /// Start or stop the playback clock. Returns whether it is now playing.
    pub fn toggle_playback(&mut self) -> bool {
        self.playback.toggle(self.timeline.duration())
    }

    pub fn start_playback(&mut self) -> bool {
        self.playback.start(self.timeline.duration())
    }

    pub fn stop_playback(&mut self) -> bool {
        self.playback.stop()
    }

    /// Capture the scene's current pose into a keyframe at the cursor.
    pub fn add_keyframe(&mut self, scene: &dyn SceneGraph) -> Result<KeyframeId, SequencerError> {
        let pose = capture_pose(scene);
        self.add_keyframe_with_pose(pose)
    }

    pub fn add_keyframe_with_pose(&mut self, pose: Pose) -> Result<KeyframeId, SequencerError> {
        self.store.add(self.cursor_time(), pose)
    }

    pub fn clear_keyframes(&mut self) {
        self.drag = DragState::Idle;
        self.set_selected(None);
        self.store.clear();
    }

    /// Move the cursor and preview the sampled pose. An empty store only moves the cursor.
    pub fn scrub(&mut self, time: f32, scene: &mut dyn SceneGraph) -> Result<f32, SequencerError> {
        let time = self.set_cursor_time(time);
        self.apply_at(time, scene)?;
        Ok(time)
    }

    fn apply_at(&self, time: f32, scene: &mut dyn SceneGraph) -> Result<(), SequencerError> {
        if self.store.is_empty() {
            return Ok(());
        }
        let pose = self.store.pose_at(time)?;
        apply_pose(scene, &pose);
        Ok(())
    }

    /// Resize the view. The duplicate-insert tolerance follows the new scale.
    pub fn set_pixel_length(&mut self, pixel_length: u32) -> Result<(), SequencerError> {
        self.timeline.set_pixel_length(pixel_length)?;
        self.refresh_tolerance();
        Ok(())
    }

    /// Change the timeline length. Keyframes and the cursor are pulled inside the new range.
    /// Nothing changes when the store refuses the new length.
    pub fn set_duration(&mut self, duration: f32) -> Result<(), SequencerError> {
        let mut timeline = self.timeline;
        timeline.set_duration(duration)?;
        self.store.set_duration(duration)?;
        self.timeline = timeline;
        self.refresh_tolerance();
        if self.cursor_time() > duration {
            self.set_cursor_time(duration);
        }
        Ok(())
    }

    fn refresh_tolerance(&mut self) {
        self.store
            .set_duplicate_tolerance(self.kf_tolerance_px * self.timeline.scale());
    }

    /// One fixed playback step. Applies the pose at the new time.
    pub fn tick(&mut self, scene: &mut dyn SceneGraph) -> Result<TickOutcome, SequencerError> {
        let outcome = self.playback.tick(self.timeline.duration());
        if let Some(time) = outcome.time() {
            self.apply_at(time, scene)?;
        }
        Ok(outcome)
    }

    /// Run every playback step covered by `elapsed` wall-clock time,
    /// applying only the final pose.
    pub fn advance(
        &mut self,
        elapsed: Duration,
        scene: &mut dyn SceneGraph,
    ) -> Result<Vec<TickOutcome>, SequencerError> {
        let outcomes = self.playback.advance(elapsed, self.timeline.duration());
        if let Some(time) = outcomes.iter().rev().find_map(TickOutcome::time) {
            self.apply_at(time, scene)?;
        }
        Ok(outcomes)
    }

    /// Replace the store contents (document load). Resets selection and drag.
    pub fn load_keyframes(
        &mut self,
        duration: f32,
        keyframes: Vec<Keyframe>,
    ) -> Result<(), SequencerError> {
        let mut timeline = self.timeline;
        timeline.set_duration(duration)?;
        let mut store = self.store.clone();
        // Old keyframes must not constrain the new length.
        store.clear();
        store.set_duration(duration)?;
        store.load_keyframes(keyframes)?;

        self.timeline = timeline;
        self.store = store;
        self.refresh_tolerance();
        self.drag = DragState::Idle;
        self.set_selected(None);
        let cursor = self.timeline.clamp_time(self.cursor_time());
        self.set_cursor_time(cursor);
        Ok(())
    }

    /// Pending events from the controller, the store and the playback clock.
    pub fn drain_events(&mut self) -> Vec<TimelineEvent> {
        let mut out = self.events.drain();
        out.extend(self.store.drain_events());
        out.extend(self.playback.drain_events());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::MemoryScene;
    use crate::transform::Transform;

    // 10 s over 1000 px: 0.01 s per pixel, duplicate tolerance 0.07 s.
    fn controller() -> TimelineController {
        let cfg = SequencerConfig::default()
            .with_duration(10.0)
            .with_pixel_length(1000);
        TimelineController::new(&cfg).unwrap()
    }

    fn add_at(c: &mut TimelineController, time: f32, x: f32) -> KeyframeId {
        c.set_cursor_time(time);
        c.add_keyframe_with_pose(Pose::new(Transform::from_pos([x, 0.0, 0.0])))
            .unwrap()
    }

    #[test]
    fn click_on_marker_selects_and_drags() {
        let mut c = controller();
        let id = add_at(&mut c, 2.0, 0.0);
        assert_eq!(c.pointer_down(203.0), DragState::DraggingKeyframe(id));
        assert_eq!(c.selected(), Some(id));
        c.pointer_move(450.0).unwrap();
        assert!((c.store().get(id).unwrap().time - 4.5).abs() < 1e-5);
        assert!((c.cursor_time() - 4.5).abs() < 1e-5);
        c.pointer_up();
        assert_eq!(c.drag_state(), DragState::Idle);
        assert_eq!(c.selected(), Some(id));
    }

    #[test]
    fn click_on_empty_space_drags_cursor_and_clears_selection() {
        let mut c = controller();
        let id = add_at(&mut c, 2.0, 0.0);
        c.pointer_down(200.0);
        c.pointer_up();
        assert_eq!(c.selected(), Some(id));
        assert_eq!(c.pointer_down(600.0), DragState::DraggingCursor);
        assert_eq!(c.selected(), None);
        c.pointer_move(700.0).unwrap();
        assert!((c.cursor_time() - 7.0).abs() < 1e-5);
        assert!((c.store().get(id).unwrap().time - 2.0).abs() < 1e-6);
    }

    #[test]
    fn moving_without_a_drag_only_tracks_hover() {
        let mut c = controller();
        c.pointer_enter(10.0);
        c.pointer_move(300.0).unwrap();
        assert_eq!(c.hover_x(), Some(300.0));
        assert_eq!(c.cursor_time(), 0.0);
        c.pointer_leave();
        assert_eq!(c.hover_x(), None);
    }

    #[test]
    fn delete_selected_without_selection_is_noop() {
        let mut c = controller();
        add_at(&mut c, 1.0, 0.0);
        assert_eq!(c.delete_selected().unwrap(), None);
        assert_eq!(c.store().len(), 1);
    }

    #[test]
    fn delete_selected_removes_and_clears_selection() {
        let mut c = controller();
        let id = add_at(&mut c, 1.0, 0.0);
        c.pointer_down(100.0);
        c.pointer_up();
        let removed = c.delete_selected().unwrap().unwrap();
        assert_eq!(removed.id, id);
        assert_eq!(c.selected(), None);
        assert!(c.store().is_empty());
    }

    #[test]
    fn resize_updates_duplicate_tolerance() {
        let mut c = controller();
        assert!((c.store().duplicate_tolerance() - 0.07).abs() < 1e-6);
        c.set_pixel_length(500).unwrap();
        assert!((c.store().duplicate_tolerance() - 0.14).abs() < 1e-6);
        assert!(c.set_pixel_length(0).is_err());
    }

    #[test]
    fn scrub_applies_interpolated_pose() {
        let mut c = controller();
        add_at(&mut c, 0.0, 0.0);
        add_at(&mut c, 10.0, 10.0);
        let mut scene = MemoryScene::new();
        c.scrub(2.5, &mut scene).unwrap();
        assert!((scene.root.pos[0] - 2.5).abs() < 1e-5);
        assert!((c.cursor_time() - 2.5).abs() < 1e-6);
    }

    #[test]
    fn scrub_on_empty_store_moves_cursor_only() {
        let mut c = controller();
        let mut scene = MemoryScene::new();
        assert_eq!(c.scrub(3.0, &mut scene).unwrap(), 3.0);
        assert_eq!(scene.writes, 0);
    }

    #[test]
    fn remove_last_clears_stale_selection() {
        let mut c = controller();
        add_at(&mut c, 1.0, 0.0);
        let late = add_at(&mut c, 5.0, 0.0);
        c.pointer_down(500.0);
        c.pointer_up();
        assert_eq!(c.selected(), Some(late));
        assert_eq!(c.remove_last().map(|k| k.id), Some(late));
        assert_eq!(c.selected(), None);
    }

    #[test]
    fn selection_events_only_on_change() {
        let mut c = controller();
        c.drain_events();
        c.pointer_down(500.0);
        c.pointer_up();
        c.pointer_down(600.0);
        let selections = c
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, TimelineEvent::SelectionChanged { .. }))
            .count();
        assert_eq!(selections, 0);
    }
}
