//! FILENAME: aggregate-engine/src/time.rs
//! PURPOSE: Collapses subannual time slices into one annual value.
//! CONTEXT: The labels of a time-slice column (e.g. `summer`, `winter`) are
//! spread into parallel values per remaining key, reduced row by row and
//! written back under a single label such as `year`.

use std::collections::BTreeSet;

use frame::{IamFrame, IndexedSeries, KeyValue};

use crate::definition::TimeAggregation;
use crate::error::{AggregateError, Result};
use crate::method::resolve_method;
use crate::reduce::group_and_reduce;

const LOG_TARGET: &str = "AGGREGATE";

/// Aggregates `args.variable` across the labels of `args.column`. Returns
/// `None` when no row matches.
pub fn aggregate_time(frame: &IamFrame, args: &TimeAggregation) -> Result<Option<IndexedSeries>> {
    let method = resolve_method(&args.method)?;

    if !frame.extra_cols().contains(&args.column) {
        return Err(AggregateError::InvalidArgument(format!(
            "time aggregation column '{}' is not an extra column of the data",
            args.column
        )));
    }
    let position = frame.data().require(&args.column)?;

    let components: BTreeSet<KeyValue> = match &args.components {
        Some(list) => list.iter().cloned().collect(),
        None => frame
            .data()
            .level_values(&args.column)?
            .into_iter()
            .filter(|label| *label != args.value)
            .collect(),
    };

    let variables = args.variable.names();
    let selected = frame
        .select_variables(&variables)
        .select(|k| components.contains(&k[position]));
    if selected.is_empty() {
        log::info!(
            target: LOG_TARGET,
            "cannot aggregate variable '{}' to '{}' because no {} component is reported",
            variables.join(", "),
            args.value,
            args.column
        );
        return Ok(None);
    }

    // Grouping without the column is the pivot: one reduced value per key.
    let reduced = group_and_reduce(&selected, std::slice::from_ref(&args.column), &method);
    let restored = reduced.insert_dim(position, args.column.clone(), args.value.clone())?;
    Ok(Some(restored))
}
