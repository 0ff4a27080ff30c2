//! FILENAME: frame/src/filter.rs
//! PURPOSE: Row selection by dimension values and glob patterns.
//! CONTEXT: Text criteria are glob patterns where `*` matches any run of
//! characters (including the hierarchy separator); everything else is
//! literal. A `Level` restricts matched variables to a number of hierarchy
//! levels below the pattern, e.g. `A|*` at level 0 selects direct children
//! of `A` only.

use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::dimension::{Dimension, IndexKey, KeyValue};
use crate::error::{FrameError, Result};
use crate::hierarchy::SEPARATOR;

// ============================================================================
// LEVEL
// ============================================================================

/// Depth restriction on matched variables, counted as additional hierarchy
/// separators beyond those in the pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Level {
    Exact(usize),
    AtMost(usize),
    AtLeast(usize),
}

impl Level {
    /// Direct children of a `V|*` pattern.
    pub const DIRECT: Level = Level::Exact(0);

    pub fn accepts(&self, extra: usize) -> bool {
        match *self {
            Level::Exact(n) => extra == n,
            Level::AtMost(n) => extra <= n,
            Level::AtLeast(n) => extra >= n,
        }
    }
}

/// Parses `"1"`, `"1-"` (at most) and `"1+"` (at least).
impl FromStr for Level {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let parse = |digits: &str| {
            digits
                .parse::<usize>()
                .map_err(|_| FrameError::InvalidLevel(s.to_string()))
        };
        if let Some(digits) = s.strip_suffix('-') {
            Ok(Level::AtMost(parse(digits)?))
        } else if let Some(digits) = s.strip_suffix('+') {
            Ok(Level::AtLeast(parse(digits)?))
        } else {
            Ok(Level::Exact(parse(s)?))
        }
    }
}

// ============================================================================
// PATTERN
// ============================================================================

/// A compiled glob pattern over text coordinates.
#[derive(Debug, Clone)]
pub struct Pattern {
    raw: String,
    regex: Regex,
    separators: usize,
}

impl Pattern {
    pub fn new(raw: &str) -> Result<Self> {
        let body = raw
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*");
        let regex = Regex::new(&format!("^{}$", body))?;
        Ok(Pattern {
            raw: raw.to_string(),
            regex,
            separators: raw.matches(SEPARATOR).count(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }

    /// Matches and checks that `value` has the number of extra hierarchy
    /// levels the `level` asks for.
    pub fn is_match_at(&self, value: &str, level: Option<Level>) -> bool {
        if !self.is_match(value) {
            return false;
        }
        match level {
            None => true,
            Some(level) => {
                let separators = value.matches(SEPARATOR).count();
                separators >= self.separators && level.accepts(separators - self.separators)
            }
        }
    }
}

// ============================================================================
// FILTER
// ============================================================================

/// Declarative row selection: a list of (dimension, accepted values)
/// clauses combined with AND. Values within a clause combine with OR.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    clauses: Vec<(Dimension, Vec<KeyValue>)>,
    level: Option<Level>,
}

impl Filter {
    pub fn new() -> Self {
        Filter::default()
    }

    /// Adds a clause for `dim`. Text values are glob patterns; integer and
    /// datetime values match exactly.
    pub fn with<I, V>(mut self, dim: Dimension, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<KeyValue>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.clauses.push((dim, values));
        self
    }

    pub fn model<I, S>(self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.with(Dimension::Model, values.into_iter().map(|s| s.as_ref().to_string()))
    }

    pub fn scenario<I, S>(self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.with(Dimension::Scenario, values.into_iter().map(|s| s.as_ref().to_string()))
    }

    pub fn region<I, S>(self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.with(Dimension::Region, values.into_iter().map(|s| s.as_ref().to_string()))
    }

    pub fn variable<I, S>(self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.with(Dimension::Variable, values.into_iter().map(|s| s.as_ref().to_string()))
    }

    pub fn unit<I, S>(self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.with(Dimension::Unit, values.into_iter().map(|s| s.as_ref().to_string()))
    }

    /// Restricts the depth of matched variables relative to the variable
    /// patterns (or to the top level when no variable clause is given).
    pub fn level(mut self, level: Level) -> Self {
        self.level = Some(level);
        self
    }

    /// Compiles the filter against a concrete dimension list.
    pub fn compile(&self, dims: &[Dimension]) -> Result<FilterMatcher> {
        let mut clauses = Vec::with_capacity(self.clauses.len());
        let mut has_variable_clause = false;

        for (dim, values) in &self.clauses {
            let pos = dims
                .iter()
                .position(|d| d == dim)
                .ok_or_else(|| FrameError::MissingDimension(dim.to_string()))?;
            let is_variable = *dim == Dimension::Variable;
            has_variable_clause |= is_variable;

            let criteria = values
                .iter()
                .map(|value| match value {
                    KeyValue::Text(raw) => Ok(Criterion::Pattern(Pattern::new(raw)?)),
                    other => Ok(Criterion::Exact(other.clone())),
                })
                .collect::<Result<Vec<_>>>()?;

            let level = if is_variable { self.level } else { None };
            clauses.push(Clause { pos, criteria, level });
        }

        // A level without variable patterns counts separators from the top.
        if let (Some(level), false) = (self.level, has_variable_clause) {
            if let Some(pos) = dims.iter().position(|d| *d == Dimension::Variable) {
                clauses.push(Clause {
                    pos,
                    criteria: vec![Criterion::Pattern(Pattern::new("*")?)],
                    level: Some(level),
                });
            }
        }

        Ok(FilterMatcher { clauses })
    }
}

#[derive(Debug, Clone)]
enum Criterion {
    Pattern(Pattern),
    Exact(KeyValue),
}

impl Criterion {
    fn matches(&self, value: &KeyValue, level: Option<Level>) -> bool {
        match (self, value) {
            (Criterion::Exact(expected), value) => expected == value,
            (Criterion::Pattern(p), KeyValue::Text(text)) => p.is_match_at(text, level),
            (Criterion::Pattern(p), other) => p.is_match(&other.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
struct Clause {
    pos: usize,
    criteria: Vec<Criterion>,
    level: Option<Level>,
}

/// A filter bound to key positions, ready to test keys.
#[derive(Debug, Clone)]
pub struct FilterMatcher {
    clauses: Vec<Clause>,
}

impl FilterMatcher {
    pub fn matches(&self, key: &IndexKey) -> bool {
        self.clauses.iter().all(|clause| {
            let value = &key[clause.pos];
            clause
                .criteria
                .iter()
                .any(|c| c.matches(value, clause.level))
        })
    }
}
