//! FILENAME: frame/src/series.rs
//! PURPOSE: The indexed series, the working representation of all aggregations.
//! CONTEXT: A series is a list of (index key, value) entries over a fixed list
//! of dimensions. Entries keep insertion order. Keys are normally unique, but
//! relabeling may produce duplicates on purpose: grouping with an empty `by`
//! merges them. Every operation returns a new series.

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;

use crate::dimension::{format_dims, Dimension, IndexKey, KeyValue};
use crate::error::{FrameError, Result};

/// Values indexed by a tuple of dimension coordinates.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IndexedSeries {
    dims: Vec<Dimension>,
    entries: Vec<(IndexKey, f64)>,
}

/// Builds a key holding only the coordinates at `positions`.
pub fn project_key(key: &[KeyValue], positions: &[usize]) -> IndexKey {
    positions.iter().map(|&p| key[p].clone()).collect()
}

impl IndexedSeries {
    /// Creates an empty series over `dims`.
    pub fn new(dims: Vec<Dimension>) -> Self {
        IndexedSeries {
            dims,
            entries: Vec::new(),
        }
    }

    /// Creates a series from entries, checking every key against `dims`.
    pub fn from_entries<I>(dims: Vec<Dimension>, entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (IndexKey, f64)>,
    {
        let mut series = IndexedSeries::new(dims);
        for (key, value) in entries {
            series.push(key, value)?;
        }
        Ok(series)
    }

    pub fn dims(&self) -> &[Dimension] {
        &self.dims
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&IndexKey, f64)> + '_ {
        self.entries.iter().map(|(k, v)| (k, *v))
    }

    /// Appends an entry. Does not check for duplicate keys.
    pub fn push(&mut self, key: IndexKey, value: f64) -> Result<()> {
        if key.len() != self.dims.len() {
            return Err(FrameError::KeyLength {
                expected: self.dims.len(),
                actual: key.len(),
            });
        }
        self.entries.push((key, value));
        Ok(())
    }

    /// Value of the entry at `index` in insertion order.
    pub fn value_at(&self, index: usize) -> Option<f64> {
        self.entries.get(index).map(|(_, v)| *v)
    }

    pub(crate) fn set_value(&mut self, index: usize, value: f64) {
        if let Some(entry) = self.entries.get_mut(index) {
            entry.1 = value;
        }
    }

    /// Position of a dimension in the key tuple.
    pub fn position(&self, dim: &Dimension) -> Option<usize> {
        self.dims.iter().position(|d| d == dim)
    }

    /// Position of a dimension, failing if the series does not carry it.
    pub fn require(&self, dim: &Dimension) -> Result<usize> {
        self.position(dim)
            .ok_or_else(|| FrameError::MissingDimension(dim.to_string()))
    }

    /// Positions of all dimensions not listed in `drop`, in order.
    pub fn positions_without(&self, drop: &[Dimension]) -> Vec<usize> {
        self.dims
            .iter()
            .enumerate()
            .filter(|(_, d)| !drop.contains(d))
            .map(|(i, _)| i)
            .collect()
    }

    /// Value of the first entry with this key.
    pub fn get(&self, key: &[KeyValue]) -> Option<f64> {
        self.entries
            .iter()
            .find(|(k, _)| k.as_slice() == key)
            .map(|(_, v)| *v)
    }

    /// Distinct coordinates of one dimension, sorted.
    pub fn level_values(&self, dim: &Dimension) -> Result<Vec<KeyValue>> {
        let pos = self.require(dim)?;
        let values: BTreeSet<&KeyValue> = self.entries.iter().map(|(k, _)| &k[pos]).collect();
        Ok(values.into_iter().cloned().collect())
    }

    /// Keeps the entries whose key satisfies `predicate`.
    pub fn select<F>(&self, predicate: F) -> Self
    where
        F: Fn(&IndexKey) -> bool,
    {
        IndexedSeries {
            dims: self.dims.clone(),
            entries: self
                .entries
                .iter()
                .filter(|(k, _)| predicate(k))
                .cloned()
                .collect(),
        }
    }

    /// Applies `f` to every value.
    pub fn map_values<F>(&self, f: F) -> Self
    where
        F: Fn(f64) -> f64,
    {
        IndexedSeries {
            dims: self.dims.clone(),
            entries: self.entries.iter().map(|(k, v)| (k.clone(), f(*v))).collect(),
        }
    }

    /// Rewrites the text coordinate of `dim` through `mapping`. Coordinates
    /// without a mapping entry are kept. Distinct keys may collapse onto the
    /// same key; group with an empty `by` to merge them.
    pub fn relabel(&self, dim: &Dimension, mapping: &FxHashMap<String, String>) -> Result<Self> {
        let pos = self.require(dim)?;
        let entries = self
            .entries
            .iter()
            .map(|(key, value)| {
                let mut key = key.clone();
                let target = match &key[pos] {
                    KeyValue::Text(label) => mapping.get(label).cloned(),
                    _ => None,
                };
                if let Some(target) = target {
                    key[pos] = KeyValue::Text(target);
                }
                (key, *value)
            })
            .collect();
        Ok(IndexedSeries {
            dims: self.dims.clone(),
            entries,
        })
    }

    /// Partitions entries by the key without the `by` dimensions and reduces
    /// each partition with `reduce`. Dimensions in `by` that the series does
    /// not carry are ignored. The result is sorted by key.
    pub fn group_by<F>(&self, by: &[Dimension], reduce: F) -> Self
    where
        F: Fn(&[f64]) -> f64,
    {
        let positions = self.positions_without(by);
        let mut groups: FxHashMap<IndexKey, Vec<f64>> = FxHashMap::default();
        for (key, value) in &self.entries {
            groups
                .entry(project_key(key, &positions))
                .or_default()
                .push(*value);
        }

        let mut grouped: Vec<(IndexKey, Vec<f64>)> = groups.into_iter().collect();
        grouped.sort_by(|a, b| a.0.cmp(&b.0));

        IndexedSeries {
            dims: positions.iter().map(|&p| self.dims[p].clone()).collect(),
            entries: grouped
                .into_iter()
                .map(|(key, values)| {
                    let reduced = reduce(&values);
                    (key, reduced)
                })
                .collect(),
        }
    }

    /// Concatenates series over identical dimensions, preserving order.
    pub fn concat<'a, I>(parts: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a IndexedSeries>,
    {
        let mut iter = parts.into_iter();
        let mut result = match iter.next() {
            Some(first) => first.clone(),
            None => return Ok(IndexedSeries::default()),
        };
        for part in iter {
            result.check_same_dims(part)?;
            result.entries.extend(part.entries.iter().cloned());
        }
        Ok(result)
    }

    /// Union of two series, summing values present in both and treating
    /// missing entries as zero. The result is sorted by key.
    pub fn add_fill_zero(&self, other: &IndexedSeries) -> Result<Self> {
        self.check_same_dims(other)?;
        let combined = IndexedSeries::concat([self, other])?;
        Ok(combined.group_by(&[], |values| values.iter().sum()))
    }

    /// Inserts a new dimension holding the same coordinate in every key.
    pub fn insert_dim(&self, position: usize, dim: Dimension, value: KeyValue) -> Result<Self> {
        if self.dims.contains(&dim) {
            return Err(FrameError::DimensionMismatch {
                expected: format_dims(&self.dims),
                actual: format!("{} (already present)", dim),
            });
        }
        let position = position.min(self.dims.len());
        let mut dims = self.dims.clone();
        dims.insert(position, dim);
        let entries = self
            .entries
            .iter()
            .map(|(k, v)| {
                let mut key = k.clone();
                key.insert(position, value.clone());
                (key, *v)
            })
            .collect();
        Ok(IndexedSeries { dims, entries })
    }

    pub(crate) fn check_same_dims(&self, other: &IndexedSeries) -> Result<()> {
        if self.dims != other.dims {
            return Err(self.mismatch(&other.dims));
        }
        Ok(())
    }

    fn mismatch(&self, actual: &[Dimension]) -> FrameError {
        FrameError::DimensionMismatch {
            expected: format_dims(&self.dims),
            actual: format_dims(actual),
        }
    }
}
