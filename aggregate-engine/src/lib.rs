//! FILENAME: aggregate-engine/src/lib.rs
//! Aggregation subsystem for long-format IAMC data.
//!
//! This crate provides the aggregation engine on top of the `frame`
//! container. It depends on `frame` only for the index types, the indexed
//! series and row selection.
//!
//! Layers:
//! - `definition`: Serializable configuration (what an aggregation IS)
//! - `method`: Reduction functions and their resolution
//! - `reduce` / `weighted`: Grouped reductions over indexed series
//! - `variable` / `recursive` / `region` / `time`: The aggregators
//! - `check`: Consistency checks against reported values
//! - `engine`: Batch entry point over definitions

pub mod definition;
pub mod error;
pub mod method;
pub mod reduce;
pub mod weighted;
pub mod variable;
pub mod recursive;
pub mod region;
pub mod time;
pub mod check;
pub mod engine;

pub use definition::*;
pub use error::{AggregateError, Result};
pub use method::{resolve_method, Method};
pub use reduce::group_and_reduce;
pub use weighted::aggregate_weighted;
pub use variable::aggregate_variable;
pub use recursive::aggregate_recursive;
pub use region::aggregate_region;
pub use time::aggregate_time;
pub use check::{
    check_aggregate, check_aggregate_region, check_internal_consistency, describe, CheckKind,
    Discrepancies, Discrepancy,
};
pub use engine::{apply_definition, run_definitions};
