//! OCES Core - Foundation types for device-transform evaluation
//!
//! This crate provides the fundamental types used throughout the engine:
//! - Fixed-size linear algebra (3-vectors, 4x4 matrices, clamping)
//! - RGBA pixels and zero-copy views over interleaved float buffers
//! - The shared error type

pub mod error;
pub mod linalg;
pub mod pixel;

pub use error::{CoreError, Result};
pub use linalg::{clamp_f3, mult_f3_f44, order3, DMat3, DVec3, Mat4, Vec3};
pub use pixel::Pixel;

/// Numeric limits shared by the transform stages.
pub mod limits {
    /// Smallest positive value fed into a logarithm.
    pub const LOG_FLOOR: f32 = 1e-10;

    /// Tolerance used when comparing derived matrices.
    pub const MATRIX_EPSILON: f64 = 1e-6;

    /// Largest supported quantization bit depth.
    pub const MAX_BIT_DEPTH: u32 = 16;
}
