//! Interpolation helpers:
//! - lerp_f32 / lerp_vec3 (component-wise)
//! - lerp_angle_deg (shortest-arc angle blend)
//! - lerp_transform / lerp_pose (whole-pose blend with joint fallback)

use crate::config::RotationMode;
use crate::transform::{Pose, Transform};

/// Linear interpolation of scalars: `a*(1-t) + b*t`.
#[inline]
pub fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    a * (1.0 - t) + b * t
}

#[inline]
pub fn lerp_vec3(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    [
        lerp_f32(a[0], b[0], t),
        lerp_f32(a[1], b[1], t),
        lerp_f32(a[2], b[2], t),
    ]
}

/// Wrap an angle difference into (-180, 180].
#[inline]
fn wrap_delta_deg(delta: f32) -> f32 {
    let mut d = delta % 360.0;
    if d > 180.0 {
        d -= 360.0;
    } else if d <= -180.0 {
        d += 360.0;
    }
    d
}

/// Blend two angles (degrees) along the shorter arc.
/// The result is `a + wrapped(b - a) * t`, so it is not normalized to [0, 360).
#[inline]
pub fn lerp_angle_deg(a: f32, b: f32, t: f32) -> f32 {
    a + wrap_delta_deg(b - a) * t
}

#[inline]
pub fn lerp_hpr(a: [f32; 3], b: [f32; 3], t: f32, mode: RotationMode) -> [f32; 3] {
    match mode {
        RotationMode::Euler => lerp_vec3(a, b, t),
        RotationMode::ShortestArc => [
            lerp_angle_deg(a[0], b[0], t),
            lerp_angle_deg(a[1], b[1], t),
            lerp_angle_deg(a[2], b[2], t),
        ],
    }
}

#[inline]
pub fn lerp_transform(a: &Transform, b: &Transform, t: f32, mode: RotationMode) -> Transform {
    Transform {
        pos: lerp_vec3(a.pos, b.pos, t),
        hpr: lerp_hpr(a.hpr, b.hpr, t, mode),
        scale: lerp_vec3(a.scale, b.scale, t),
    }
}

/// Blend two poses.
///
/// Joints carried by both poses are interpolated. A joint carried by only one
/// side keeps that side's value unchanged. Output joint order follows `a`, then
/// any joints only `b` knows about.
pub fn lerp_pose(a: &Pose, b: &Pose, t: f32, mode: RotationMode) -> Pose {
    let mut out = Pose::new(lerp_transform(&a.root, &b.root, t, mode));
    for (name, ta) in &a.joints {
        let value = match b.joints.get(name) {
            Some(tb) => lerp_transform(ta, tb, t, mode),
            None => *ta,
        };
        out.joints.insert(name.clone(), value);
    }
    for (name, tb) in &b.joints {
        if !out.joints.contains_key(name) {
            out.joints.insert(name.clone(), *tb);
        }
    }
    out
}
