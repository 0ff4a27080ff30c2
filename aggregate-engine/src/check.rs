//! FILENAME: aggregate-engine/src/check.rs
//! PURPOSE: Consistency checks between reported values and their aggregates.
//! CONTEXT: A check recomputes an aggregate, outer-joins it with the rows
//! already reported for the same variable and keeps the keys where the two
//! are not close. A value missing on either side counts as a discrepancy.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use frame::{Dimension, IamFrame, IndexKey, IndexedSeries, KeyValue};

use crate::definition::{Components, MethodId, RegionAggregation, Tolerance, VariableTarget};
use crate::error::Result;
use crate::region::aggregate_region;
use crate::variable::aggregate_variable;

const LOG_TARGET: &str = "AGGREGATE";

// ============================================================================
// REPORT TYPES
// ============================================================================

/// One key where the reported value and the aggregate disagree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discrepancy {
    pub key: IndexKey,
    /// Value reported in the data.
    pub existing: Option<f64>,
    /// Freshly computed aggregate.
    pub aggregate: Option<f64>,
}

/// All discrepancies found by one check, sorted by key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discrepancies {
    pub dims: Vec<Dimension>,
    pub rows: Vec<Discrepancy>,
}

impl Discrepancies {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Which aggregate a discrepancy was found against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckKind {
    /// Sum of the variable's components.
    Aggregate,
    /// Sum over subregions.
    Regional,
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckKind::Aggregate => write!(f, "aggregate"),
            CheckKind::Regional => write!(f, "regional"),
        }
    }
}

// ============================================================================
// CHECKS
// ============================================================================

/// Compares `variable` with the aggregate of its components, scaled by
/// `multiplier`.
pub fn check_aggregate(
    frame: &IamFrame,
    variable: &str,
    components: Option<&[String]>,
    method: &MethodId,
    multiplier: f64,
    tolerance: &Tolerance,
) -> Result<Option<Discrepancies>> {
    let existing = frame.select_variables(&[variable]);
    if existing.is_empty() {
        log::info!(target: LOG_TARGET, "variable '{}' does not exist in the data", variable);
        return Ok(None);
    }

    let target = VariableTarget::One(variable.to_string());
    let Some(aggregate) = aggregate_variable(frame, &target, components, method)? else {
        return Ok(None);
    };
    let aggregate = aggregate.map_values(|v| v * multiplier);

    Ok(report(variable, CheckKind::Aggregate, &existing, &aggregate, tolerance))
}

/// Compares `args.variable` at `args.region` with the aggregate over its
/// subregions (plus region-level components, if requested).
pub fn check_aggregate_region(
    frame: &IamFrame,
    args: &RegionAggregation,
    tolerance: &Tolerance,
) -> Result<Option<Discrepancies>> {
    let variables = args.variable.names();
    let existing = frame
        .select_variables(&variables)
        .select(|k| k[2].as_text() == Some(args.region.as_str()));
    if existing.is_empty() {
        log::info!(
            target: LOG_TARGET,
            "variable '{}' does not exist in region '{}'",
            variables.join(", "),
            args.region
        );
        return Ok(None);
    }

    let Some(aggregate) = aggregate_region(frame, args)? else {
        return Ok(None);
    };

    Ok(report(&variables.join(", "), CheckKind::Regional, &existing, &aggregate, tolerance))
}

/// Runs the aggregate check for every variable with components and the
/// regional check towards `World` for every variable. With `components` set,
/// region-level components are auto-detected. The map is empty when the
/// data is consistent.
pub fn check_internal_consistency(
    frame: &IamFrame,
    components: bool,
    tolerance: &Tolerance,
) -> Result<BTreeMap<(String, CheckKind), Discrepancies>> {
    let mut inconsistent = BTreeMap::new();

    for variable in frame.variables() {
        if let Some(diff) = check_aggregate(frame, &variable, None, &MethodId::default(), 1.0, tolerance)? {
            inconsistent.insert((variable.clone(), CheckKind::Aggregate), diff);
        }

        let args = RegionAggregation::new(variable.as_str()).components(if components {
            Components::Auto
        } else {
            Components::Off
        });
        if let Some(diff) = check_aggregate_region(frame, &args, tolerance)? {
            inconsistent.insert((variable, CheckKind::Regional), diff);
        }
    }

    Ok(inconsistent)
}

/// Outer join of `existing` and `aggregate` keeping the keys that are not
/// close.
fn report(
    label: &str,
    kind: CheckKind,
    existing: &IndexedSeries,
    aggregate: &IndexedSeries,
    tolerance: &Tolerance,
) -> Option<Discrepancies> {
    let mut joined: BTreeMap<&IndexKey, (Option<f64>, Option<f64>)> = BTreeMap::new();
    for (key, value) in existing.iter() {
        joined.entry(key).or_default().0 = Some(value);
    }
    for (key, value) in aggregate.iter() {
        joined.entry(key).or_default().1 = Some(value);
    }

    let rows: Vec<Discrepancy> = joined
        .into_iter()
        .filter(|(_, pair)| match *pair {
            (Some(a), Some(b)) => !tolerance.is_close(a, b),
            _ => true,
        })
        .map(|(key, (existing, aggregate))| Discrepancy {
            key: key.clone(),
            existing,
            aggregate,
        })
        .collect();

    if rows.is_empty() {
        return None;
    }
    log::info!(
        target: LOG_TARGET,
        "{} of '{}' is inconsistent at {} points",
        kind,
        label,
        rows.len()
    );
    Some(Discrepancies {
        dims: existing.dims().to_vec(),
        rows,
    })
}

/// Key of a discrepancy as printable labels.
pub fn describe(dims: &[Dimension], key: &[KeyValue]) -> String {
    dims.iter()
        .zip(key)
        .map(|(d, v)| format!("{}={}", d, v))
        .collect::<Vec<_>>()
        .join(", ")
}
