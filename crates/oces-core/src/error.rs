//! Error types for the core crate.

use thiserror::Error;

/// Errors raised by the core primitives.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("matrix is singular (determinant {0:e})")]
    SingularMatrix(f64),

    #[error("buffer of {len} floats is not a whole number of {channels}-channel pixels")]
    BufferLayout { len: usize, channels: usize },
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
