//! FILENAME: frame/src/dimension.rs
//! PURPOSE: Index dimensions and key values of the long data format.
//! CONTEXT: Every observation is keyed by an ordered tuple of dimension values.
//! `Dimension` names a position in that tuple, `KeyValue` is one coordinate
//! and `IndexKey` is the whole tuple.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::FrameError;

/// An index tuple. Eight inline slots cover the base dimensions, the time
/// dimension and two extra columns without touching the heap.
pub type IndexKey = SmallVec<[KeyValue; 8]>;

// ============================================================================
// DIMENSION
// ============================================================================

/// A named position in the index tuple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Dimension {
    Model,
    Scenario,
    Region,
    Variable,
    Unit,
    /// Integer year time dimension.
    Year,
    /// Datetime time dimension.
    Time,
    /// Time-slice label within a year (e.g. "summer").
    Subannual,
    Version,
    /// Any other user-declared column.
    Extra(String),
}

/// The dimensions every frame carries, in canonical order, before the time
/// dimension.
pub const BASE_DIMENSIONS: [Dimension; 5] = [
    Dimension::Model,
    Dimension::Scenario,
    Dimension::Region,
    Dimension::Variable,
    Dimension::Unit,
];

impl Dimension {
    pub fn as_str(&self) -> &str {
        match self {
            Dimension::Model => "model",
            Dimension::Scenario => "scenario",
            Dimension::Region => "region",
            Dimension::Variable => "variable",
            Dimension::Unit => "unit",
            Dimension::Year => "year",
            Dimension::Time => "time",
            Dimension::Subannual => "subannual",
            Dimension::Version => "version",
            Dimension::Extra(name) => name,
        }
    }

    /// Whether this is one of the two time dimensions.
    pub fn is_time(&self) -> bool {
        matches!(self, Dimension::Year | Dimension::Time)
    }

    /// Whether this dimension may only appear at its fixed canonical slot.
    pub fn is_reserved(&self) -> bool {
        BASE_DIMENSIONS.contains(self) || self.is_time()
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dimension {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let dim = match s.trim() {
            "" => return Err(FrameError::UnknownDimension(s.to_string())),
            "model" => Dimension::Model,
            "scenario" => Dimension::Scenario,
            "region" => Dimension::Region,
            "variable" => Dimension::Variable,
            "unit" => Dimension::Unit,
            "year" => Dimension::Year,
            "time" => Dimension::Time,
            "subannual" => Dimension::Subannual,
            "version" => Dimension::Version,
            other => Dimension::Extra(other.to_string()),
        };
        Ok(dim)
    }
}

impl From<Dimension> for String {
    fn from(dim: Dimension) -> Self {
        dim.as_str().to_string()
    }
}

impl TryFrom<String> for Dimension {
    type Error = FrameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Renders a dimension list as `a, b, c` for error messages.
pub fn format_dims(dims: &[Dimension]) -> String {
    dims.iter()
        .map(Dimension::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

// ============================================================================
// KEY VALUE
// ============================================================================

/// One coordinate of an index key.
///
/// Years and versions are `Int`; datetime time keys are `Datetime`; every
/// other dimension holds `Text`. The derived ordering sorts integers before
/// datetimes before text, which only matters for mixed columns.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyValue {
    Int(i64),
    Datetime(NaiveDateTime),
    Text(String),
}

impl KeyValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            KeyValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValue::Int(i) => write!(f, "{}", i),
            KeyValue::Datetime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            KeyValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for KeyValue {
    fn from(value: &str) -> Self {
        KeyValue::Text(value.to_string())
    }
}

impl From<String> for KeyValue {
    fn from(value: String) -> Self {
        KeyValue::Text(value)
    }
}

impl From<&String> for KeyValue {
    fn from(value: &String) -> Self {
        KeyValue::Text(value.clone())
    }
}

impl From<i64> for KeyValue {
    fn from(value: i64) -> Self {
        KeyValue::Int(value)
    }
}

impl From<i32> for KeyValue {
    fn from(value: i32) -> Self {
        KeyValue::Int(value as i64)
    }
}

impl From<NaiveDateTime> for KeyValue {
    fn from(value: NaiveDateTime) -> Self {
        KeyValue::Datetime(value)
    }
}

/// Renders an index key as `a, b, c` for error and log messages.
pub fn format_key(key: &[KeyValue]) -> String {
    key.iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
