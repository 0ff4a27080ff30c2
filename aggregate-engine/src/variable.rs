//! FILENAME: aggregate-engine/src/variable.rs
//! PURPOSE: Aggregates child variables into their parent.
//! CONTEXT: Children are relabeled to the parent name and merged with an
//! empty grouping, so every non-variable key of the children yields one
//! parent value. Several parents are handled in a single relabel pass.

use rustc_hash::FxHashMap;

use frame::{Dimension, IamFrame, IndexedSeries, Level};

use crate::definition::{MethodId, VariableTarget};
use crate::error::{AggregateError, Result};
use crate::method::{resolve_method, Method};
use crate::reduce::group_and_reduce;

const LOG_TARGET: &str = "AGGREGATE";

/// Aggregates `variable` from its components. Explicit `components` are only
/// allowed for a single variable; without them the direct children present
/// in `frame` are used. Returns `None` when no variable has components.
pub fn aggregate_variable(
    frame: &IamFrame,
    variable: &VariableTarget,
    components: Option<&[String]>,
    method: &MethodId,
) -> Result<Option<IndexedSeries>> {
    let method = resolve_method(method)?;
    aggregate_with(frame, variable, components, &method)
}

pub(crate) fn aggregate_with(
    frame: &IamFrame,
    variable: &VariableTarget,
    components: Option<&[String]>,
    method: &Method,
) -> Result<Option<IndexedSeries>> {
    let explicit = components.filter(|c| !c.is_empty());
    if explicit.is_some() && variable.as_single().is_none() {
        return Err(AggregateError::InvalidArgument(
            "aggregating a list of variables with explicit components is not supported".to_string(),
        ));
    }

    let mut mapping: FxHashMap<String, String> = FxHashMap::default();
    for parent in variable.names() {
        let children = match explicit {
            Some(list) => list.to_vec(),
            None => frame.variable_components(parent, Some(Level::DIRECT)),
        };
        if children.is_empty() {
            log::info!(
                target: LOG_TARGET,
                "cannot aggregate variable '{}' because it has no components",
                parent
            );
            continue;
        }
        for child in children {
            mapping.insert(child, parent.to_string());
        }
    }

    if mapping.is_empty() {
        return Ok(None);
    }

    let children: Vec<&String> = mapping.keys().collect();
    let relabeled = frame
        .select_variables(&children)
        .relabel(&Dimension::Variable, &mapping)?;
    Ok(Some(group_and_reduce(&relabeled, &[], method)))
}
