//! Interpolation helpers.
//!
//! v1 is piecewise linear on every transform component, with an optional
//! shortest-arc mode for heading/pitch/roll.

pub mod functions;

pub use functions::{lerp_f32, lerp_pose, lerp_transform, lerp_vec3};
