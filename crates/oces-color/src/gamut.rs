//! Gamut clipping with hue restoration.

use oces_core::{clamp_f3, order3, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TransformError};

/// Re-impose the hue of `pre` on `post`.
///
/// The largest and smallest channels of `post` (ranked by `pre`) are kept;
/// the middle channel is placed so that its position between them matches
/// the original. Used after per-channel tone mapping, which skews hue.
pub fn restore_hue(pre: Vec3, post: Vec3) -> Vec3 {
    let [hi, mid, lo] = order3(pre);
    let p = pre.to_array();
    let mut q = post.to_array();
    let chroma = p[hi] - p[lo];
    let hue_factor = if chroma == 0.0 {
        0.0
    } else {
        (p[mid] - p[lo]) / chroma
    };
    q[mid] = hue_factor * (q[hi] - q[lo]) + q[lo];
    Vec3::from_array(q)
}

/// Clamp `rgb` to `[lo, hi]` while keeping as much of its hue as possible.
///
/// When a channel overshoots `hi`, the overshoot of the dominant channel is
/// spread over the others in proportion to their distance from `lo`
/// relative to it, which scales the color down along its own hue line. The
/// result is blended with the plain clamp by `strength` (1.0 keeps the
/// original channel ratios, 0.0 is a plain clamp). Undershoot alone is
/// plainly clamped; in-range input is returned untouched.
///
/// # Panics
///
/// Panics if `lo > hi` or either bound is NaN. [`GamutClip::validate`]
/// rules both out for compiled transforms.
pub fn smart_clip(rgb: Vec3, lo: f32, hi: f32, strength: f32) -> Vec3 {
    let clamped = clamp_f3(rgb, lo, hi);
    if clamped == rgb || !rgb.is_finite() {
        return clamped;
    }
    if rgb.x == rgb.y && rgb.y == rgb.z {
        return clamped;
    }

    let delta = (rgb - clamped).to_array();
    let dominant = order3(Vec3::from_array(delta))[0];
    if delta[dominant] <= 0.0 {
        return clamped;
    }

    let base = Vec3::splat(lo);
    let factor = (hi - lo) / (rgb.to_array()[dominant] - lo);
    let mut scaled = clamp_f3(base + (rgb - base) * factor, lo, hi).to_array();
    scaled[dominant] = hi;
    let scaled = Vec3::from_array(scaled);
    clamp_f3(clamped + (scaled - clamped) * strength, lo, hi)
}

/// Stage four configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GamutClip {
    #[serde(default)]
    pub lo: f32,
    #[serde(default = "unit")]
    pub hi: f32,
    /// Blend between plain clamping (0.0) and full hue preservation (1.0).
    #[serde(default = "unit")]
    pub hue_restore: f32,
}

fn unit() -> f32 {
    1.0
}

impl GamutClip {
    pub const UNIT_CUBE: Self = Self {
        lo: 0.0,
        hi: 1.0,
        hue_restore: 1.0,
    };

    /// Plain per-channel clamp to the unit cube.
    pub const PLAIN: Self = Self {
        lo: 0.0,
        hi: 1.0,
        hue_restore: 0.0,
    };

    pub fn validate(&self) -> Result<()> {
        if !self.lo.is_finite() {
            return Err(TransformError::out_of_range("clip lower bound", self.lo));
        }
        if !(self.hi.is_finite() && self.hi > self.lo) {
            return Err(TransformError::out_of_range("clip upper bound", self.hi));
        }
        if !(0.0..=1.0).contains(&self.hue_restore) {
            return Err(TransformError::out_of_range(
                "hue restore strength",
                self.hue_restore,
            ));
        }
        Ok(())
    }

    #[inline]
    pub fn apply(&self, rgb: Vec3) -> Vec3 {
        smart_clip(rgb, self.lo, self.hi, self.hue_restore)
    }
}

impl Default for GamutClip {
    fn default() -> Self {
        Self::UNIT_CUBE
    }
}
