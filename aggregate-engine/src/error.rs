//! FILENAME: aggregate-engine/src/error.rs

use frame::FrameError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AggregateError {
    /// Conflicting or unsupported argument combination.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("'{0}' is not a known method")]
    UnknownMethod(String),

    /// Weight and data do not share the same index.
    #[error("Inconsistent index: {0}")]
    InconsistentIndex(String),

    /// A recomputed aggregate disagrees with a value already in the data.
    #[error("Aggregated values of {variable} are inconsistent with existing data at {count} points")]
    InconsistentAggregate { variable: String, count: usize },

    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),
}

pub type Result<T> = std::result::Result<T, AggregateError>;
