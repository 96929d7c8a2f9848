//! Transform errors.

use oces_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("invalid gamut: {0}")]
    InvalidGamut(String),
    #[error("{what} out of range: {value}")]
    OutOfRange { what: &'static str, value: f32 },
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("unknown transform: {0}")]
    UnknownTransform(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl TransformError {
    pub(crate) fn out_of_range(what: &'static str, value: f32) -> Self {
        Self::OutOfRange { what, value }
    }
}

pub type Result<T> = std::result::Result<T, TransformError>;
