//! FILENAME: frame/src/lib.rs
//! PURPOSE: Main library entry point for the long-format data container.
//! CONTEXT: Re-exports the index types, the indexed series, hierarchy helpers
//! and `IamFrame` for use by the aggregation engine.

pub mod dimension;
pub mod error;
pub mod filter;
pub mod frame;
pub mod hierarchy;
pub mod series;

// Re-export commonly used types at the crate root
pub use dimension::{format_dims, format_key, Dimension, IndexKey, KeyValue, BASE_DIMENSIONS};
pub use error::{FrameError, Result};
pub use filter::{Filter, FilterMatcher, Level, Pattern};
pub use frame::{IamFrame, Row, TimeDomain};
pub use hierarchy::SEPARATOR;
pub use series::{project_key, IndexedSeries};
