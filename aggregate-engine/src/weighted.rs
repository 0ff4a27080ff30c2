//! FILENAME: aggregate-engine/src/weighted.rs
//! PURPOSE: Weighted average of a variable across regions.
//! CONTEXT: The weight is another variable reported on the same regions and
//! time points as the data. Its variable and unit are dropped before
//! matching, so each data row pairs with exactly one weight:
//!
//! ```text
//! result = sum_region(data * weight) / sum_region(weight)
//! ```
//!
//! The numerator keeps the data's variable and unit, the denominator groups
//! over the remaining dimensions only.

use rustc_hash::{FxHashMap, FxHashSet};

use frame::{format_key, project_key, Dimension, IndexKey, IndexedSeries};

use crate::definition::Reduction;
use crate::error::{AggregateError, Result};
use crate::method::Method;

const LOG_TARGET: &str = "AGGREGATE";

/// Aggregates `data` over regions, weighted by `weight`. Both series carry
/// the full frame key and cover the same subregions.
pub fn aggregate_weighted(
    data: &IndexedSeries,
    weight: &IndexedSeries,
    method: &Method,
    drop_negative_weights: bool,
) -> Result<IndexedSeries> {
    if !method.is_sum() {
        return Err(AggregateError::InvalidArgument(format!(
            "only method 'sum' allowed for weighted average, got '{}'",
            method
        )));
    }

    let var_unit = [Dimension::Variable, Dimension::Unit];
    let data_region = data.require(&Dimension::Region)?;
    data.require(&Dimension::Variable)?;
    weight.require(&Dimension::Variable)?;

    // Key positions on both sides once variable and unit are gone.
    let data_shared = data.positions_without(&var_unit);
    let weight_shared = weight.positions_without(&var_unit);
    let weights: FxHashMap<IndexKey, f64> = weight
        .iter()
        .map(|(k, v)| (project_key(k, &weight_shared), v))
        .collect();

    let data_keys: Vec<IndexKey> = data.iter().map(|(k, _)| project_key(k, &data_shared)).collect();
    let distinct: FxHashSet<&IndexKey> = data_keys.iter().collect();
    let same_index = distinct.len() == weights.len() && distinct.iter().all(|k| weights.contains_key(*k));
    if !same_index {
        return Err(AggregateError::InconsistentIndex(
            "weight and data are not reported on the same index".to_string(),
        ));
    }

    // Numerator keeps everything but region; denominator also drops
    // variable and unit.
    let numerator_positions = data.positions_without(&[Dimension::Region]);
    let denominator_positions: Vec<usize> = data_shared
        .iter()
        .copied()
        .filter(|&p| p != data_region)
        .collect();

    let weight_region = weight.require(&Dimension::Region)?;
    let weight_denominator: Vec<usize> = weight_shared
        .iter()
        .copied()
        .filter(|&p| p != weight_region)
        .collect();

    // Each weight enters its denominator group once, however many data
    // variables share it.
    let mut denominators: FxHashMap<IndexKey, Vec<f64>> = FxHashMap::default();
    let mut dropped = Vec::new();
    for (key, w) in weight.iter() {
        if drop_negative_weights && w < 0.0 {
            dropped.push(format_key(&project_key(key, &weight_shared)));
            continue;
        }
        denominators
            .entry(project_key(key, &weight_denominator))
            .or_default()
            .push(w);
    }

    let mut numerators: FxHashMap<IndexKey, Vec<f64>> = FxHashMap::default();
    for ((key, value), shared) in data.iter().zip(&data_keys) {
        let w = weights.get(shared).copied().unwrap_or(f64::NAN);
        if drop_negative_weights && w < 0.0 {
            continue;
        }
        numerators
            .entry(project_key(key, &numerator_positions))
            .or_default()
            .push(value * w);
    }

    if !dropped.is_empty() {
        log::warn!(
            target: LOG_TARGET,
            "dropping {} negative weights: {}",
            dropped.len(),
            dropped.join(", ")
        );
    }

    // Position of each denominator dimension inside a numerator key.
    let numerator_dims: Vec<Dimension> = numerator_positions
        .iter()
        .map(|&p| data.dims()[p].clone())
        .collect();
    let lookup_positions: Vec<usize> = denominator_positions
        .iter()
        .filter_map(|&p| numerator_dims.iter().position(|d| *d == data.dims()[p]))
        .collect();

    let mut entries: Vec<(IndexKey, f64)> = numerators
        .into_iter()
        .filter_map(|(key, products)| {
            let total = denominators.get(&project_key(&key, &lookup_positions))?;
            let value = Reduction::Sum.apply(&products) / Reduction::Sum.apply(total);
            Some((key, value))
        })
        .collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    Ok(IndexedSeries::from_entries(numerator_dims, entries)?)
}
