//! Editor session: the object hosts construct once and drive every frame.
//!
//! ```ignore
//! let mut session = EditorSession::new(SequencerConfig::default())?;
//! // per window event
//! session.handle_input(&event, gizmo.is_dragging(), &mut scene)?;
//! // every `config.tick_interval()`
//! session.tick(&mut scene)?;
//! session.render(&mut widget);
//! for ev in session.drain_events() { ui.notify(ev); }
//! ```

use crate::config::SequencerConfig;
use crate::controller::TimelineController;
use crate::document::{parse_sequence_document_json, SequenceDocument};
use crate::error::SequencerError;
use crate::events::TimelineEvent;
use crate::ids::KeyframeId;
use crate::input::{Action, InputEvent, KeyBindings};
use crate::playback::TickOutcome;
use crate::render::{TimelineRenderer, TimelineView};
use crate::scene::SceneGraph;
use crate::sequence::SequencePlayer;
use crate::transform::{Transform, TransformTarget};

#[derive(Debug, Clone)]
pub struct EditorSession {
    config: SequencerConfig,
    controller: TimelineController,
    sequence: SequencePlayer,
    bindings: KeyBindings,
}

impl EditorSession {
    pub fn new(config: SequencerConfig) -> Result<Self, SequencerError> {
        let controller = TimelineController::new(&config)?;
        let sequence = SequencePlayer::new(config.rotation_mode)
            .with_event_capacity(config.max_events_per_tick);
        Ok(Self {
            config,
            controller,
            sequence,
            bindings: KeyBindings::default(),
        })
    }

    pub fn with_bindings(mut self, bindings: KeyBindings) -> Self {
        self.bindings = bindings;
        self
    }

    #[inline]
    pub fn config(&self) -> &SequencerConfig {
        &self.config
    }

    #[inline]
    pub fn controller(&self) -> &TimelineController {
        &self.controller
    }

    #[inline]
    pub fn controller_mut(&mut self) -> &mut TimelineController {
        &mut self.controller
    }

    #[inline]
    pub fn sequence(&self) -> &SequencePlayer {
        &self.sequence
    }

    #[inline]
    pub fn bindings(&self) -> &KeyBindings {
        &self.bindings
    }

    #[inline]
    pub fn bindings_mut(&mut self) -> &mut KeyBindings {
        &mut self.bindings
    }

    /// Route one input event.
    ///
    /// Pointer events are dropped while `pointer_captured` is set (another
    /// widget owns the pointer); keys still dispatch. Returns the action a key
    /// resolved to, if any.
    pub fn handle_input(
        &mut self,
        event: &InputEvent,
        pointer_captured: bool,
        scene: &mut dyn SceneGraph,
    ) -> Result<Option<Action>, SequencerError> {
        if pointer_captured && event.is_pointer() {
            return Ok(None);
        }
        match event {
            InputEvent::PointerDown { x } => {
                self.controller.pointer_down(*x);
            }
            InputEvent::PointerMove { x } => self.controller.pointer_move(*x)?,
            InputEvent::PointerUp => self.controller.pointer_up(),
            InputEvent::PointerEnter { x } => self.controller.pointer_enter(*x),
            InputEvent::PointerLeave => self.controller.pointer_leave(),
            InputEvent::Resize { pixel_length } => {
                self.controller.set_pixel_length(*pixel_length)?;
                self.config.pixel_length = *pixel_length;
            }
            InputEvent::KeyDown { key } => {
                let Some(action) = self.bindings.lookup(key) else {
                    return Ok(None);
                };
                self.perform(action, scene)?;
                return Ok(Some(action));
            }
        }
        Ok(None)
    }

    /// Run one editor action.
    pub fn perform(
        &mut self,
        action: Action,
        scene: &mut dyn SceneGraph,
    ) -> Result<(), SequencerError> {
        log::debug!("perform {}", action.name());
        match action {
            Action::TogglePlayback => {
                // The clock takes over from a running sequence at its final pose.
                if !self.controller.playback().is_playing() {
                    self.sequence.finish(scene);
                }
                self.controller.toggle_playback();
            }
            Action::DeleteSelected => {
                self.controller.delete_selected()?;
            }
            Action::AddKeyframe => {
                self.controller.add_keyframe(scene)?;
            }
            Action::RemoveLastKeyframe => {
                self.controller.remove_last();
            }
            Action::PlaySequence => {
                // One driver at a time: the timeline clock yields to the sequence.
                self.controller.stop_playback();
                let duration = self.controller.timeline().duration();
                self.sequence
                    .play(self.controller.store().keyframes(), duration, scene)?;
            }
            Action::ClearKeyframes => {
                self.controller.clear_keyframes();
            }
        }
        Ok(())
    }

    /// One fixed step: advance the timeline clock, then the sequence by `tick_dt`.
    pub fn tick(&mut self, scene: &mut dyn SceneGraph) -> Result<TickOutcome, SequencerError> {
        let outcome = self.controller.tick(scene)?;
        if self.sequence.is_active() {
            self.sequence.update(self.config.tick_dt, scene);
        }
        Ok(outcome)
    }

    /// Parse nine text fields (pos, hpr, scale) and apply them to `target`.
    /// The scene is untouched when any field is invalid.
    pub fn apply_transform_edit(
        &mut self,
        scene: &mut dyn SceneGraph,
        target: &TransformTarget,
        fields: [&str; 9],
    ) -> Result<Transform, SequencerError> {
        let transform = Transform::parse_fields(fields)?;
        scene.set_transform(target, transform);
        Ok(transform)
    }

    /// Parse nine text fields and write them into the selected keyframe.
    /// `Ok(None)` when nothing is selected.
    pub fn edit_selected_keyframe(
        &mut self,
        target: &TransformTarget,
        fields: [&str; 9],
    ) -> Result<Option<KeyframeId>, SequencerError> {
        let transform = Transform::parse_fields(fields)?;
        let Some(id) = self.controller.selected() else {
            return Ok(None);
        };
        self.controller
            .store_mut()
            .set_transform(id, target, transform)?;
        Ok(Some(id))
    }

    pub fn view(&self) -> TimelineView {
        TimelineView::build(&self.controller, self.config.ruler_spacing_px)
    }

    pub fn render(&self, renderer: &mut dyn TimelineRenderer) {
        self.view().draw(renderer);
    }

    pub fn drain_events(&mut self) -> Vec<TimelineEvent> {
        let mut out = self.controller.drain_events();
        out.extend(self.sequence.drain_events());
        out
    }

    pub fn save_document(&self) -> Result<String, SequencerError> {
        SequenceDocument::from_store(self.controller.store()).to_json_string()
    }

    /// Replace the keyframes (and timeline length) with a saved document.
    /// A running sequence is cancelled. On error nothing changes.
    pub fn load_document(&mut self, json: &str) -> Result<(), SequencerError> {
        let doc = parse_sequence_document_json(json)?;
        self.controller.load_keyframes(doc.duration, doc.keyframes)?;
        self.sequence.cancel();
        self.config.duration = doc.duration;
        log::debug!(
            "loaded document with {} keyframe(s), duration {}",
            self.controller.store().len(),
            doc.duration
        );
        Ok(())
    }

    pub fn load_bindings_toml(&mut self, s: &str) -> Result<(), SequencerError> {
        self.bindings = KeyBindings::from_toml_str(s)?;
        Ok(())
    }

    pub fn bindings_toml(&self) -> Result<String, SequencerError> {
        self.bindings.to_toml_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::MemoryScene;
    use crate::transform::Pose;

    fn session() -> EditorSession {
        let cfg = SequencerConfig::default()
            .with_duration(10.0)
            .with_pixel_length(1000);
        EditorSession::new(cfg).unwrap()
    }

    #[test]
    fn rejects_invalid_config() {
        let cfg = SequencerConfig::default().with_pixel_length(0);
        assert!(EditorSession::new(cfg).is_err());
    }

    #[test]
    fn key_dispatches_bound_action() {
        let mut s = session();
        let mut scene = MemoryScene::with_joints(["arm"]);
        let key = InputEvent::KeyDown { key: "K".into() };
        assert_eq!(
            s.handle_input(&key, false, &mut scene).unwrap(),
            Some(Action::AddKeyframe)
        );
        assert_eq!(s.controller().store().len(), 1);
        let unbound = InputEvent::KeyDown { key: "z".into() };
        assert_eq!(s.handle_input(&unbound, false, &mut scene).unwrap(), None);
    }

    #[test]
    fn captured_pointer_is_ignored_but_keys_still_work() {
        let mut s = session();
        let mut scene = MemoryScene::new();
        s.handle_input(&InputEvent::PointerDown { x: 500.0 }, true, &mut scene)
            .unwrap();
        assert_eq!(s.controller().cursor_time(), 0.0);
        let space = InputEvent::KeyDown { key: "space".into() };
        s.handle_input(&space, true, &mut scene).unwrap();
        assert!(s.controller().playback().is_playing());
    }

    #[test]
    fn invalid_transform_edit_leaves_scene_alone() {
        let mut s = session();
        let mut scene = MemoryScene::new();
        let err = s
            .apply_transform_edit(
                &mut scene,
                &TransformTarget::Root,
                ["1", "2", "abc", "0", "0", "0", "1", "1", "1"],
            )
            .unwrap_err();
        assert!(matches!(err, SequencerError::InvalidTransformValue { .. }));
        assert_eq!(scene.writes, 0);

        let tf = s
            .apply_transform_edit(
                &mut scene,
                &TransformTarget::Root,
                ["1", "2", "3", "90", "0", "0", "1", "1", "1"],
            )
            .unwrap();
        assert_eq!(scene.root, tf);
    }

    #[test]
    fn edit_selected_keyframe_updates_store() {
        let mut s = session();
        let mut scene = MemoryScene::new();
        let fields = ["4", "0", "0", "0", "0", "0", "1", "1", "1"];
        assert_eq!(s.edit_selected_keyframe(&TransformTarget::Root, fields).unwrap(), None);

        s.perform(Action::AddKeyframe, &mut scene).unwrap();
        s.handle_input(&InputEvent::PointerDown { x: 0.0 }, false, &mut scene)
            .unwrap();
        let id = s
            .edit_selected_keyframe(&TransformTarget::Root, fields)
            .unwrap()
            .unwrap();
        assert_eq!(s.controller().store().get(id).unwrap().pose.root.pos[0], 4.0);
    }

    #[test]
    fn play_sequence_stops_timeline_clock() {
        let mut s = session();
        let mut scene = MemoryScene::new();
        s.perform(Action::AddKeyframe, &mut scene).unwrap();
        s.perform(Action::TogglePlayback, &mut scene).unwrap();
        s.perform(Action::PlaySequence, &mut scene).unwrap();
        assert!(!s.controller().playback().is_playing());
        assert!(s.sequence().is_active());
    }

    #[test]
    fn starting_the_clock_ends_a_running_sequence() {
        let mut s = session();
        let mut scene = MemoryScene::new();
        s.controller_mut()
            .add_keyframe_with_pose(Pose::new(Transform::IDENTITY))
            .unwrap();
        s.controller_mut().set_cursor_time(10.0);
        s.controller_mut()
            .add_keyframe_with_pose(Pose::new(Transform::from_pos([10.0, 0.0, 0.0])))
            .unwrap();

        s.perform(Action::PlaySequence, &mut scene).unwrap();
        s.tick(&mut scene).unwrap();
        assert!(s.sequence().is_active());

        s.controller_mut().set_cursor_time(5.0);
        s.perform(Action::TogglePlayback, &mut scene).unwrap();
        assert!(!s.sequence().is_active());
        assert!(s.controller().playback().is_playing());

        let writes = scene.writes;
        s.tick(&mut scene).unwrap();
        assert_eq!(scene.writes - writes, 1);
        assert!((scene.root.pos[0] - 5.1).abs() < 1e-4);
    }

    #[test]
    fn play_sequence_on_empty_store_fails() {
        let mut s = session();
        let mut scene = MemoryScene::new();
        assert_eq!(
            s.perform(Action::PlaySequence, &mut scene),
            Err(SequencerError::EmptyStore)
        );
    }
}
