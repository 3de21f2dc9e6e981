//! Transforms, transform targets, and poses.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::SequencerError;

/// Position / heading-pitch-roll (degrees) / scale triple for one scene node.
/// Missing fields deserialize to their identity values.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transform {
    pub pos: [f32; 3],
    pub hpr: [f32; 3],
    pub scale: [f32; 3],
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Names of the nine editable fields, in `Transform::parse_fields` order.
pub const TRANSFORM_FIELDS: [&str; 9] = [
    "pos.x", "pos.y", "pos.z", "hpr.h", "hpr.p", "hpr.r", "scale.x", "scale.y", "scale.z",
];

impl Transform {
    pub const IDENTITY: Transform = Transform {
        pos: [0.0; 3],
        hpr: [0.0; 3],
        scale: [1.0; 3],
    };

    pub fn new(pos: [f32; 3], hpr: [f32; 3], scale: [f32; 3]) -> Self {
        Self { pos, hpr, scale }
    }

    pub fn from_pos(pos: [f32; 3]) -> Self {
        Self {
            pos,
            ..Self::IDENTITY
        }
    }

    /// Parse nine text fields (pos xyz, hpr, scale xyz) as typed into an editor panel.
    ///
    /// The first field that fails to parse is reported; no partial transform is returned.
    pub fn parse_fields(fields: [&str; 9]) -> Result<Self, SequencerError> {
        let mut out = [0.0f32; 9];
        for (i, raw) in fields.iter().enumerate() {
            let parsed = raw.trim().parse::<f32>().ok().filter(|v| v.is_finite());
            out[i] = parsed.ok_or_else(|| SequencerError::InvalidTransformValue {
                field: TRANSFORM_FIELDS[i].to_string(),
                input: raw.to_string(),
            })?;
        }
        Ok(Self {
            pos: [out[0], out[1], out[2]],
            hpr: [out[3], out[4], out[5]],
            scale: [out[6], out[7], out[8]],
        })
    }

    /// Render the nine fields with two decimals, the inverse of `parse_fields`
    /// up to rounding.
    pub fn to_fields(&self) -> [String; 9] {
        let v = [
            self.pos[0],
            self.pos[1],
            self.pos[2],
            self.hpr[0],
            self.hpr[1],
            self.hpr[2],
            self.scale[0],
            self.scale[1],
            self.scale[2],
        ];
        v.map(|x| format!("{x:.2}"))
    }
}

/// Something in the scene a transform can be read from or written to.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransformTarget {
    /// The actor itself.
    Root,
    /// A named joint (bone) of the actor.
    Joint(String),
}

impl TransformTarget {
    pub fn joint(name: impl Into<String>) -> Self {
        Self::Joint(name.into())
    }
}

impl fmt::Display for TransformTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => f.write_str("root"),
            Self::Joint(name) => write!(f, "joint:{name}"),
        }
    }
}

/// Full snapshot of the root and every tracked joint at one instant.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub root: Transform,
    #[serde(default)]
    pub joints: IndexMap<String, Transform>,
}

impl Pose {
    pub fn new(root: Transform) -> Self {
        Self {
            root,
            joints: IndexMap::new(),
        }
    }

    pub fn with_joint(mut self, name: impl Into<String>, transform: Transform) -> Self {
        self.joints.insert(name.into(), transform);
        self
    }

    pub fn get(&self, target: &TransformTarget) -> Option<&Transform> {
        match target {
            TransformTarget::Root => Some(&self.root),
            TransformTarget::Joint(name) => self.joints.get(name),
        }
    }

    /// Iterate root first, then joints in their stored order.
    pub fn targets(&self) -> impl Iterator<Item = (TransformTarget, &Transform)> {
        std::iter::once((TransformTarget::Root, &self.root)).chain(
            self.joints
                .iter()
                .map(|(name, tf)| (TransformTarget::Joint(name.clone()), tf)),
        )
    }
}
