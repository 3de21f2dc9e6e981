use vizij_sequencer_core::{
    DragState, MemoryScene, SequencerConfig, TimelineController, TimelineEvent, Transform,
};

fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

// 10 s over 1000 px: 0.01 s per pixel.
fn controller() -> TimelineController {
    let cfg = SequencerConfig::default()
        .with_duration(10.0)
        .with_pixel_length(1000);
    TimelineController::new(&cfg).expect("valid config")
}

#[test]
fn pixel_time_round_trip() {
    let c = controller();
    let tl = c.timeline();
    for t in [0.0f32, 0.01, 1.5, 3.333, 9.99, 10.0] {
        approx(tl.pixel_to_time(tl.time_to_pixel(t)), t, 1e-4);
    }
}

#[test]
fn drag_keyframe_past_left_edge_clamps_to_zero() {
    let mut c = controller();
    let mut scene = MemoryScene::with_joints(["neck"]);
    c.set_cursor_time(2.0);
    let id = c.add_keyframe(&scene).unwrap();

    assert_eq!(c.pointer_down(200.0), DragState::DraggingKeyframe(id));
    c.pointer_move(-100.0).unwrap();
    c.pointer_up();
    assert_eq!(c.store().get(id).unwrap().time, 0.0);
    assert_eq!(c.cursor_time(), 0.0);

    scene.root = Transform::from_pos([5.0, 0.0, 0.0]);
    c.set_cursor_time(2.0);
    c.add_keyframe(&scene).unwrap();
    assert_eq!(c.store().len(), 2);
}

#[test]
fn hit_test_uses_pixel_tolerance() {
    let mut c = controller();
    c.set_cursor_time(5.0);
    let id = c.add_keyframe(&MemoryScene::new()).unwrap();

    assert_eq!(c.pointer_down(506.0), DragState::DraggingKeyframe(id));
    c.pointer_up();
    assert_eq!(c.pointer_down(509.0), DragState::DraggingCursor);
    assert_eq!(c.selected(), None);
}

#[test]
fn lowest_time_wins_overlapping_markers() {
    let mut c = controller();
    let scene = MemoryScene::new();
    c.set_cursor_time(1.0);
    let early = c.add_keyframe(&scene).unwrap();
    c.set_cursor_time(1.08);
    c.add_keyframe(&scene).unwrap();
    assert_eq!(c.pointer_down(104.0), DragState::DraggingKeyframe(early));
}

#[test]
fn new_drag_replaces_the_old_one() {
    let mut c = controller();
    let scene = MemoryScene::new();
    c.set_cursor_time(3.0);
    let id = c.add_keyframe(&scene).unwrap();
    c.pointer_down(300.0);
    // No pointer_up: the next press starts a fresh drag.
    assert_eq!(c.pointer_down(800.0), DragState::DraggingCursor);
    c.pointer_move(900.0).unwrap();
    approx(c.store().get(id).unwrap().time, 3.0, 1e-6);
    approx(c.cursor_time(), 9.0, 1e-5);
}

#[test]
fn add_at_occupied_time_is_rejected_and_reported() {
    let mut c = controller();
    let scene = MemoryScene::new();
    c.set_cursor_time(4.0);
    c.add_keyframe(&scene).unwrap();
    c.set_cursor_time(4.05);
    let err = c.add_keyframe(&scene).unwrap_err();
    assert_eq!(err.category(), "store");
    assert_eq!(c.store().len(), 1);
}

#[test]
fn clear_resets_selection() {
    let mut c = controller();
    let scene = MemoryScene::new();
    c.set_cursor_time(1.0);
    c.add_keyframe(&scene).unwrap();
    c.pointer_down(100.0);
    c.pointer_up();
    assert!(c.selected().is_some());
    c.drain_events();

    c.clear_keyframes();
    assert!(c.store().is_empty());
    assert_eq!(c.selected(), None);
    assert_eq!(
        c.drain_events(),
        vec![
            TimelineEvent::SelectionChanged { selected: None },
            TimelineEvent::KeyframesCleared,
        ]
    );
}

#[test]
fn remove_near_cursor_uses_configured_radius() {
    let mut c = controller();
    let scene = MemoryScene::new();
    for t in [2.0f32, 2.5, 6.0] {
        c.set_cursor_time(t);
        c.add_keyframe(&scene).unwrap();
    }
    c.set_cursor_time(2.45);
    let removed = c.remove_near_cursor();
    assert_eq!(removed.len(), 1);
    assert_eq!(c.store().len(), 2);
}

#[test]
fn shrinking_duration_pulls_keyframes_and_cursor_in() {
    let mut c = controller();
    let scene = MemoryScene::new();
    c.set_cursor_time(9.0);
    let id = c.add_keyframe(&scene).unwrap();
    c.set_duration(5.0).unwrap();
    assert_eq!(c.store().get(id).unwrap().time, 5.0);
    assert_eq!(c.cursor_time(), 5.0);
    approx(c.timeline().scale(), 0.005, 1e-7);
}

#[test]
fn shrinking_duration_never_stacks_keyframes() {
    let mut c = controller();
    let scene = MemoryScene::new();
    for t in [8.0f32, 9.0] {
        c.set_cursor_time(t);
        c.add_keyframe(&scene).unwrap();
    }
    c.set_cursor_time(9.0);

    let err = c.set_duration(5.0).unwrap_err();
    assert_eq!(err.category(), "store");
    assert_eq!(c.timeline().duration(), 10.0);
    assert_eq!(c.cursor_time(), 9.0);
    let times: Vec<f32> = c.store().keyframes().iter().map(|k| k.time).collect();
    assert_eq!(times, vec![8.0, 9.0]);
}
