//! FILENAME: frame/src/frame.rs
//! PURPOSE: The in-memory container of long-format observations.
//! CONTEXT: `IamFrame` owns one `IndexedSeries` with unique keys over the
//! canonical dimension order (model, scenario, region, variable, unit, time,
//! extra columns). It provides the selection and discovery queries the
//! aggregation engine needs and merges computed series back in. All methods
//! take `&self` and return new values.

use std::collections::{BTreeMap, BTreeSet};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::dimension::{format_key, Dimension, IndexKey, KeyValue, BASE_DIMENSIONS};
use crate::error::{FrameError, Result};
use crate::filter::{Filter, Level};
use crate::hierarchy;
use crate::series::IndexedSeries;

/// Which time dimension the frame is indexed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeDomain {
    Year,
    Datetime,
}

impl TimeDomain {
    pub fn dimension(&self) -> Dimension {
        match self {
            TimeDomain::Year => Dimension::Year,
            TimeDomain::Datetime => Dimension::Time,
        }
    }

    fn accepts(&self, value: &KeyValue) -> bool {
        matches!(
            (self, value),
            (TimeDomain::Year, KeyValue::Int(_)) | (TimeDomain::Datetime, KeyValue::Datetime(_))
        )
    }
}

/// One observation in record form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub model: String,
    pub scenario: String,
    pub region: String,
    pub variable: String,
    pub unit: String,
    /// Year (integer) or ISO datetime.
    pub time: KeyValue,
    /// Values of the frame's extra columns, keyed by column name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, KeyValue>,
    pub value: f64,
}

impl Row {
    pub fn new(
        model: &str,
        scenario: &str,
        region: &str,
        variable: &str,
        unit: &str,
        time: impl Into<KeyValue>,
        value: f64,
    ) -> Self {
        Row {
            model: model.to_string(),
            scenario: scenario.to_string(),
            region: region.to_string(),
            variable: variable.to_string(),
            unit: unit.to_string(),
            time: time.into(),
            extra: BTreeMap::new(),
            value,
        }
    }

    /// Sets an extra column value.
    pub fn with_extra(mut self, dim: Dimension, value: impl Into<KeyValue>) -> Self {
        self.extra.insert(dim.to_string(), value.into());
        self
    }
}

/// Long-format container with unique index keys.
#[derive(Debug, Clone)]
pub struct IamFrame {
    time_domain: TimeDomain,
    extra_cols: Vec<Dimension>,
    data: IndexedSeries,
    positions: FxHashMap<IndexKey, usize>,
}

impl IamFrame {
    /// Creates an empty frame. Extra columns follow the time dimension in the
    /// given order.
    pub fn new(time_domain: TimeDomain, extra_cols: Vec<Dimension>) -> Result<Self> {
        for dim in &extra_cols {
            if dim.is_reserved() {
                return Err(FrameError::ReservedDimension(dim.to_string()));
            }
        }
        let mut dims: Vec<Dimension> = BASE_DIMENSIONS.to_vec();
        dims.push(time_domain.dimension());
        dims.extend(extra_cols.iter().cloned());

        Ok(IamFrame {
            time_domain,
            extra_cols,
            data: IndexedSeries::new(dims),
            positions: FxHashMap::default(),
        })
    }

    /// Builds a frame from rows, rejecting duplicate keys.
    pub fn from_rows<I>(time_domain: TimeDomain, extra_cols: Vec<Dimension>, rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = Row>,
    {
        let mut frame = IamFrame::new(time_domain, extra_cols)?;
        for row in rows {
            frame.push_row(row)?;
        }
        Ok(frame)
    }

    pub fn extra_cols(&self) -> &[Dimension] {
        &self.extra_cols
    }

    pub fn dims(&self) -> &[Dimension] {
        self.data.dims()
    }

    pub fn data(&self) -> &IndexedSeries {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, key: &[KeyValue]) -> Option<f64> {
        let key: IndexKey = key.iter().cloned().collect();
        self.positions
            .get(&key)
            .and_then(|&i| self.data.value_at(i))
    }

    /// Adds one observation.
    pub fn push_row(&mut self, row: Row) -> Result<()> {
        if !self.time_domain.accepts(&row.time) {
            return Err(FrameError::TimeMismatch(row.time.to_string()));
        }
        let mut key: IndexKey = IndexKey::new();
        key.push(KeyValue::Text(row.model));
        key.push(KeyValue::Text(row.scenario));
        key.push(KeyValue::Text(row.region));
        key.push(KeyValue::Text(row.variable));
        key.push(KeyValue::Text(row.unit));
        key.push(row.time);
        for dim in &self.extra_cols {
            let value = row
                .extra
                .get(dim.as_str())
                .cloned()
                .ok_or_else(|| FrameError::MissingDimension(dim.to_string()))?;
            key.push(value);
        }
        self.insert(key, row.value, false)
    }

    /// All observations in record form, in storage order.
    pub fn rows(&self) -> Vec<Row> {
        let time_pos = BASE_DIMENSIONS.len();
        self.data
            .iter()
            .map(|(key, value)| {
                let text = |i: usize| key[i].to_string();
                let extra = self
                    .extra_cols
                    .iter()
                    .enumerate()
                    .map(|(i, dim)| (dim.to_string(), key[time_pos + 1 + i].clone()))
                    .collect();
                Row {
                    model: text(0),
                    scenario: text(1),
                    region: text(2),
                    variable: text(3),
                    unit: text(4),
                    time: key[time_pos].clone(),
                    extra,
                    value,
                }
            })
            .collect()
    }

    // ========================================================================
    // DISCOVERY
    // ========================================================================

    /// Distinct text coordinates of a dimension, sorted.
    pub fn labels(&self, dim: &Dimension) -> Result<Vec<String>> {
        Ok(self
            .data
            .level_values(dim)?
            .into_iter()
            .map(|v| v.to_string())
            .collect())
    }

    pub fn variables(&self) -> Vec<String> {
        self.base_labels(3)
    }

    pub fn regions(&self) -> Vec<String> {
        self.base_labels(2)
    }

    fn base_labels(&self, pos: usize) -> Vec<String> {
        let labels: BTreeSet<&KeyValue> = self.data.iter().map(|(k, _)| &k[pos]).collect();
        labels.into_iter().map(|v| v.to_string()).collect()
    }

    /// Descendants of `variable` present in the frame. `Some(Level::DIRECT)`
    /// yields direct children only; `None` yields all descendants.
    pub fn variable_components(&self, variable: &str, level: Option<Level>) -> Vec<String> {
        self.variables()
            .into_iter()
            .filter(|v| match hierarchy::levels_below(v, variable) {
                Some(below) => level.map_or(true, |l| l.accepts(below - 1)),
                None => false,
            })
            .collect()
    }

    /// Regions other than `region` holding data for any of `variables`.
    pub fn all_other_regions<S: AsRef<str>>(&self, region: &str, variables: &[S]) -> Vec<String> {
        let regions: BTreeSet<&str> = self
            .data
            .iter()
            .filter(|(k, _)| {
                let variable = k[3].as_text().unwrap_or_default();
                variables.iter().any(|v| v.as_ref() == variable)
            })
            .filter_map(|(k, _)| k[2].as_text())
            .filter(|r| *r != region)
            .collect();
        regions.into_iter().map(str::to_string).collect()
    }

    // ========================================================================
    // SELECTION
    // ========================================================================

    /// The rows matching `filter`, as a new frame.
    pub fn filter(&self, filter: &Filter) -> Result<IamFrame> {
        let selected = self.select(filter)?;
        let mut frame = IamFrame::new(self.time_domain, self.extra_cols.clone())?;
        frame.positions = selected
            .iter()
            .enumerate()
            .map(|(i, (k, _))| (k.clone(), i))
            .collect();
        frame.data = selected;
        Ok(frame)
    }

    /// The rows matching `filter`, as a series.
    pub fn select(&self, filter: &Filter) -> Result<IndexedSeries> {
        let matcher = filter.compile(self.dims())?;
        Ok(self.data.select(|key| matcher.matches(key)))
    }

    /// Rows whose variable is exactly one of `variables`.
    pub fn select_variables<S: AsRef<str>>(&self, variables: &[S]) -> IndexedSeries {
        self.data.select(|key| {
            let variable = key[3].as_text().unwrap_or_default();
            variables.iter().any(|v| v.as_ref() == variable)
        })
    }

    // ========================================================================
    // MERGING
    // ========================================================================

    /// Returns a new frame with `series` appended. Fails on keys already
    /// present (in the frame or twice in the series).
    pub fn append(&self, series: &IndexedSeries) -> Result<IamFrame> {
        self.merge(series, false)
    }

    /// Returns a new frame with `series` appended, replacing the values of
    /// keys that already exist.
    pub fn append_overwrite(&self, series: &IndexedSeries) -> Result<IamFrame> {
        self.merge(series, true)
    }

    fn merge(&self, series: &IndexedSeries, overwrite: bool) -> Result<IamFrame> {
        self.data.check_same_dims(series)?;
        let time_pos = BASE_DIMENSIONS.len();
        let mut frame = self.clone();
        for (key, value) in series.iter() {
            if !self.time_domain.accepts(&key[time_pos]) {
                return Err(FrameError::TimeMismatch(key[time_pos].to_string()));
            }
            frame.insert(key.clone(), value, overwrite)?;
        }
        Ok(frame)
    }

    fn insert(&mut self, key: IndexKey, value: f64, overwrite: bool) -> Result<()> {
        if let Some(&i) = self.positions.get(&key) {
            if !overwrite {
                return Err(FrameError::DuplicateKey(format_key(&key)));
            }
            self.data.set_value(i, value);
            return Ok(());
        }
        self.positions.insert(key.clone(), self.data.len());
        self.data.push(key, value)
    }
}
