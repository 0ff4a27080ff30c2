//! FILENAME: frame/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrameError {
    #[error("Duplicate index key: ({0})")]
    DuplicateKey(String),

    #[error("Index key has {actual} values but the series has {expected} dimensions")]
    KeyLength { expected: usize, actual: usize },

    #[error("Dimension not found: {0}")]
    MissingDimension(String),

    #[error("Dimension mismatch: expected [{expected}], got [{actual}]")]
    DimensionMismatch { expected: String, actual: String },

    #[error("Unknown dimension: {0:?}")]
    UnknownDimension(String),

    #[error("Dimension is reserved and cannot be an extra column: {0}")]
    ReservedDimension(String),

    #[error("Time value {0} does not match the frame's time domain")]
    TimeMismatch(String),

    #[error("Invalid hierarchy level: {0:?}")]
    InvalidLevel(String),

    #[error("Invalid filter pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, FrameError>;
