//! Fixed-size linear algebra for the per-pixel path.
//!
//! Matrices follow glam's column-vector convention: `m * v` maps a color
//! triple. Derivations run in `f64` ([`DMat3`]) and are embedded into an
//! `f32` [`Mat4`] once, before any pixel is evaluated.

use crate::error::{CoreError, Result};

pub use glam::{DMat3, DVec3, Mat4, Vec3};

/// Below this magnitude a determinant is treated as zero.
const SINGULAR_EPSILON: f64 = 1e-12;

/// Multiply a color triple by a 4x4 matrix (homogeneous, w = 1).
///
/// The bottom row is assumed to be `[0, 0, 0, 1]`. No perspective divide.
#[inline]
pub fn mult_f3_f44(v: Vec3, m: &Mat4) -> Vec3 {
    m.transform_point3(v)
}

/// Embed a 3x3 matrix in the upper-left block of a 4x4 identity.
#[inline]
pub fn embed(m: DMat3) -> Mat4 {
    Mat4::from_mat3(m.as_mat3())
}

/// Invert a 3x3 matrix, failing when it is (numerically) singular.
pub fn invert(m: DMat3) -> Result<DMat3> {
    let det = m.determinant();
    if !det.is_finite() || det.abs() < SINGULAR_EPSILON {
        return Err(CoreError::SingularMatrix(det));
    }
    Ok(m.inverse())
}

/// Largest absolute element-wise difference between two matrices.
pub fn max_abs_diff(a: &DMat3, b: &DMat3) -> f64 {
    a.to_cols_array()
        .iter()
        .zip(b.to_cols_array().iter())
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f64::max)
}

/// Whether `m` is the identity within `epsilon`.
pub fn is_identity(m: &DMat3, epsilon: f64) -> bool {
    max_abs_diff(m, &DMat3::IDENTITY) <= epsilon
}

/// Clamp every channel to `[lo, hi]`.
///
/// NaN channels stay NaN so later stages can reject them.
///
/// # Panics
///
/// Panics if `lo > hi` or either bound is NaN.
#[inline]
pub fn clamp_f3(v: Vec3, lo: f32, hi: f32) -> Vec3 {
    Vec3::new(v.x.clamp(lo, hi), v.y.clamp(lo, hi), v.z.clamp(lo, hi))
}

/// Channel indices ordered from largest to smallest value.
///
/// Ties keep the lower index first.
#[inline]
pub fn order3(v: Vec3) -> [usize; 3] {
    let c = v.to_array();
    let mut idx = [0usize, 1, 2];
    // Three-element insertion sort, stable on ties.
    for i in 1..3 {
        let mut j = i;
        while j > 0 && c[idx[j]] > c[idx[j - 1]] {
            idx.swap(j, j - 1);
            j -= 1;
        }
    }
    idx
}
