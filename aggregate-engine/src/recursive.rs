//! FILENAME: aggregate-engine/src/recursive.rs
//! PURPOSE: Bottom-up aggregation of a whole variable subtree.
//! CONTEXT: Levels are processed from the deepest descendants up to the
//! direct children of the root. Each level aggregates the parents of the
//! variables at that depth against a working frame that already holds the
//! results of all deeper levels, so partial sums propagate upward.

use std::collections::BTreeSet;

use frame::{hierarchy, IamFrame, IndexedSeries};

use crate::definition::{AggregationConfig, MethodId, Tolerance, VariableTarget};
use crate::error::{AggregateError, Result};
use crate::method::resolve_method;
use crate::variable::aggregate_with;

const LOG_TARGET: &str = "AGGREGATE";

/// Aggregates every intermediate level below `variable` and `variable`
/// itself. Results are returned deepest level first.
///
/// Unless `config.skip_validate` is set, each computed aggregate is compared
/// with the value already stored at the same key; a mismatch fails with
/// `InconsistentAggregate`. Aggregates that already exist and agree are not
/// returned again. With validation skipped every computed aggregate is
/// returned, so merging it back requires `append_overwrite`.
pub fn aggregate_recursive(
    frame: &IamFrame,
    variable: &str,
    method: &MethodId,
    config: &AggregationConfig,
) -> Result<Option<IndexedSeries>> {
    let method = resolve_method(method)?;

    let descendants = frame.variable_components(variable, None);
    let Some(max_depth) = descendants.iter().map(|v| hierarchy::depth(v)).max() else {
        log::info!(
            target: LOG_TARGET,
            "cannot aggregate variable '{}' recursively because it has no components",
            variable
        );
        return Ok(None);
    };
    let root_depth = hierarchy::depth(variable);

    let mut working = frame.clone();
    let mut levels: Vec<IndexedSeries> = Vec::new();

    for depth in ((root_depth + 1)..=max_depth).rev() {
        let parents: BTreeSet<String> = working
            .variable_components(variable, None)
            .iter()
            .filter(|v| hierarchy::depth(v) == depth)
            .filter_map(|v| hierarchy::parent(v))
            .map(str::to_string)
            .collect();
        if parents.is_empty() {
            continue;
        }
        log::debug!(
            target: LOG_TARGET,
            "aggregating depth {} into {} parents of '{}'",
            depth,
            parents.len(),
            variable
        );

        let target = VariableTarget::Many(parents.into_iter().collect());
        let Some(level) = aggregate_with(&working, &target, None, &method)? else {
            continue;
        };

        let fresh = if config.skip_validate {
            level.clone()
        } else {
            validate(frame, variable, &level, &config.tolerance)?
        };
        working = working.append_overwrite(&level)?;
        levels.push(fresh);
    }

    Ok(Some(IndexedSeries::concat(&levels)?))
}

/// Fails if any aggregate disagrees with existing data and returns the
/// aggregates not yet present in `frame`.
fn validate(
    frame: &IamFrame,
    variable: &str,
    level: &IndexedSeries,
    tolerance: &Tolerance,
) -> Result<IndexedSeries> {
    let mut mismatches = 0;
    for (key, value) in level.iter() {
        if let Some(existing) = frame.get(key) {
            if !tolerance.is_close(existing, value) {
                mismatches += 1;
            }
        }
    }
    if mismatches > 0 {
        return Err(AggregateError::InconsistentAggregate {
            variable: variable.to_string(),
            count: mismatches,
        });
    }
    Ok(level.select(|key| frame.get(key).is_none()))
}
