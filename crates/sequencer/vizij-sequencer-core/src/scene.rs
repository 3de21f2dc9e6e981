//! Scene-graph seam.
//!
//! The core never owns scene nodes. Hosts (engine adapters, tests) implement
//! `SceneGraph` and pass it into the controller and players, which read the
//! live pose on "add keyframe" and write sampled poses back during scrubbing
//! and playback.

use indexmap::IndexMap;

use crate::transform::{Pose, Transform, TransformTarget};

/// Narrow read/write access to the animated actor.
pub trait SceneGraph {
    /// Current transform of the root or a joint. `None` if the target does not exist.
    fn get_transform(&self, target: &TransformTarget) -> Option<Transform>;

    /// Apply a transform immediately.
    fn set_transform(&mut self, target: &TransformTarget, transform: Transform);

    /// Names of every joint that should be captured into keyframes, in a stable order.
    fn enumerate_targets(&self) -> Vec<String>;
}

/// Snapshot the root and every enumerated joint.
/// Joints the scene lists but cannot resolve are skipped.
pub fn capture_pose(scene: &dyn SceneGraph) -> Pose {
    let root = scene
        .get_transform(&TransformTarget::Root)
        .unwrap_or(Transform::IDENTITY);
    let mut pose = Pose::new(root);
    for name in scene.enumerate_targets() {
        match scene.get_transform(&TransformTarget::Joint(name.clone())) {
            Some(tf) => {
                pose.joints.insert(name, tf);
            }
            None => log::warn!("scene listed joint {name} but returned no transform; skipping"),
        }
    }
    pose
}

/// Push every transform of `pose` into the scene.
pub fn apply_pose(scene: &mut dyn SceneGraph, pose: &Pose) {
    for (target, tf) in pose.targets() {
        scene.set_transform(&target, *tf);
    }
}

/// Plain in-memory scene: a root transform and an ordered joint table.
/// Useful for headless tools and tests.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MemoryScene {
    pub root: Transform,
    pub joints: IndexMap<String, Transform>,
    /// Number of `set_transform` calls received.
    pub writes: usize,
}

impl MemoryScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_joints<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            joints: names
                .into_iter()
                .map(|n| (n.into(), Transform::IDENTITY))
                .collect(),
            ..Self::default()
        }
    }

    /// Current state as a pose.
    pub fn pose(&self) -> Pose {
        Pose {
            root: self.root,
            joints: self.joints.clone(),
        }
    }
}

impl SceneGraph for MemoryScene {
    fn get_transform(&self, target: &TransformTarget) -> Option<Transform> {
        match target {
            TransformTarget::Root => Some(self.root),
            TransformTarget::Joint(name) => self.joints.get(name).copied(),
        }
    }

    fn set_transform(&mut self, target: &TransformTarget, transform: Transform) {
        self.writes += 1;
        match target {
            TransformTarget::Root => self.root = transform,
            TransformTarget::Joint(name) => {
                self.joints.insert(name.clone(), transform);
            }
        }
    }

    fn enumerate_targets(&self) -> Vec<String> {
        self.joints.keys().cloned().collect()
    }
}
