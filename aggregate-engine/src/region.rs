//! FILENAME: aggregate-engine/src/region.rs
//! PURPOSE: Aggregates a variable over subregions into a parent region.
//! CONTEXT: The subregion aggregate is either a plain grouped reduction over
//! the region dimension or a weighted average. Optionally, components that
//! are only reported at the parent region (e.g. international bunkers under
//! World) are added on top with zero fill.

use rustc_hash::FxHashMap;

use frame::{Dimension, IamFrame, IndexedSeries, KeyValue, Level};

use crate::definition::{Components, Reduction, RegionAggregation};
use crate::error::{AggregateError, Result};
use crate::method::{resolve_method, Method};
use crate::reduce::group_and_reduce;
use crate::weighted::aggregate_weighted;

const LOG_TARGET: &str = "AGGREGATE";

/// Aggregates `args.variable` over subregions into `args.region`. The result
/// carries the full frame key with the region set to the target. Returns
/// `None` when no subregion reports the variable.
pub fn aggregate_region(frame: &IamFrame, args: &RegionAggregation) -> Result<Option<IndexedSeries>> {
    let method = resolve_method(&args.method)?;
    let has_components = args.components != Components::Off;

    if has_components && args.variable.as_single().is_none() {
        return Err(AggregateError::InvalidArgument(
            "aggregating a list of variables with components is not supported".to_string(),
        ));
    }
    if has_components && args.weight.is_some() {
        return Err(AggregateError::InvalidArgument(
            "using weights and components in one operation is not supported".to_string(),
        ));
    }

    let variables = args.variable.names();
    let subregions = match &args.subregions {
        Some(list) if !list.is_empty() => list.clone(),
        _ => frame.all_other_regions(&args.region, &variables),
    };
    if subregions.is_empty() {
        log::info!(
            target: LOG_TARGET,
            "cannot aggregate variable '{}' to '{}' because it does not exist in any subregion",
            variables.join(", "),
            args.region
        );
        return Ok(None);
    }

    let in_subregions = |key: &[KeyValue]| {
        key[2].as_text().map_or(false, |r| subregions.iter().any(|s| s == r))
    };
    let data = frame.select_variables(&variables).select(|k| in_subregions(k.as_slice()));

    let mut aggregate = match &args.weight {
        Some(weight) => {
            let weights = frame.select_variables(&[weight]).select(|k| in_subregions(k.as_slice()));
            aggregate_weighted(&data, &weights, &method, args.drop_negative_weights)?
        }
        None => group_and_reduce(&data, &[Dimension::Region], &method),
    };

    if let Some(variable) = args.variable.as_single() {
        let components = region_components(frame, variable, &args.region, &subregions, &args.components);
        if !components.is_empty() {
            let extra = region_level(frame, variable, &args.region, &components)?;
            aggregate = aggregate.add_fill_zero(&extra)?;
        }
    }

    let position = frame.data().require(&Dimension::Region)?;
    let restored = aggregate.insert_dim(position, Dimension::Region, KeyValue::from(args.region.as_str()))?;
    Ok(Some(restored))
}

/// Components to add at the region level. `Auto` keeps the direct children
/// reported at `region` that no subregion reports.
fn region_components(
    frame: &IamFrame,
    variable: &str,
    region: &str,
    subregions: &[String],
    components: &Components,
) -> Vec<String> {
    match components {
        Components::Off => Vec::new(),
        Components::Explicit(list) => list.clone(),
        Components::Auto => {
            let children = frame.variable_components(variable, Some(Level::DIRECT));
            let rows = frame.select_variables(&children);
            let reported = |child: &str, at: &dyn Fn(&str) -> bool| {
                rows.iter()
                    .any(|(k, _)| k[3].as_text() == Some(child) && k[2].as_text().map_or(false, at))
            };
            children
                .iter()
                .filter(|c| reported(c.as_str(), &|r| r == region))
                .filter(|c| !reported(c.as_str(), &|r| subregions.iter().any(|s| s == r)))
                .cloned()
                .collect()
        }
    }
}

/// The region-level components relabeled to `variable` and summed, with the
/// region dimension collapsed.
fn region_level(
    frame: &IamFrame,
    variable: &str,
    region: &str,
    components: &[String],
) -> Result<IndexedSeries> {
    let mapping: FxHashMap<String, String> = components
        .iter()
        .map(|c| (c.clone(), variable.to_string()))
        .collect();
    let rows = frame
        .select_variables(components)
        .select(|k| k[2].as_text() == Some(region));
    let relabeled = rows.relabel(&Dimension::Variable, &mapping)?;
    Ok(group_and_reduce(&relabeled, &[Dimension::Region], &Method::Builtin(Reduction::Sum)))
}
