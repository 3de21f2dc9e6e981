//! Pose sampling over a time-sorted keyframe slice.
//!
//! Model:
//! - Keyframes are sorted ascending by absolute time (seconds).
//! - Before the first keyframe the first pose is held; after the last, the last pose.
//! - Between two keyframes every transform component is blended linearly.
//!
//! API:
//! - find_segment(&[Keyframe], time) -> (i0, i1, local_t)
//! - pose_at(&[Keyframe], time, mode) -> Result<Pose>

use crate::config::RotationMode;
use crate::error::SequencerError;
use crate::interp::functions::lerp_pose;
use crate::store::Keyframe;
use crate::transform::Pose;

/// Find the segment [i, i+1] that contains `time`, and return (i, i+1, local_t),
/// where local_t is normalized to [0, 1] between keyframes[i].time .. keyframes[i+1].time.
/// Edge cases:
/// - If time <= first.time (or is NaN), returns (0, 0, 0).
/// - If time >= last.time, returns (last, last, 0).
/// - A zero-length segment yields local_t = 0.
///
/// `keyframes` must be non-empty.
pub fn find_segment(keyframes: &[Keyframe], time: f32) -> (usize, usize, f32) {
    let n = keyframes.len();
    if n == 0 {
        return (0, 0, 0.0);
    }
    if n == 1 || time.is_nan() || time <= keyframes[0].time {
        return (0, 0, 0.0);
    }
    if time >= keyframes[n - 1].time {
        return (n - 1, n - 1, 0.0);
    }
    // Number of keyframes at or before `time`; at least 1 and at most n - 1 here.
    let idx = keyframes.partition_point(|k| k.time <= time);
    let i0 = idx - 1;
    let i1 = idx;
    let t0 = keyframes[i0].time;
    let t1 = keyframes[i1].time;
    let span = t1 - t0;
    let lt = if span > 0.0 {
        ((time - t0) / span).clamp(0.0, 1.0)
    } else {
        0.0
    };
    (i0, i1, lt)
}

/// Sample the pose at an absolute time.
///
/// Returns `EmptyStore` when there is nothing to sample. Boundary keyframes are
/// returned verbatim (no blending), so values outside the keyed range are exact.
pub fn pose_at(
    keyframes: &[Keyframe],
    time: f32,
    mode: RotationMode,
) -> Result<Pose, SequencerError> {
    if keyframes.is_empty() {
        return Err(SequencerError::EmptyStore);
    }
    let (i0, i1, lt) = find_segment(keyframes, time);
    if i0 == i1 {
        return Ok(keyframes[i0].pose.clone());
    }
    Ok(lerp_pose(
        &keyframes[i0].pose,
        &keyframes[i1].pose,
        lt,
        mode,
    ))
}
