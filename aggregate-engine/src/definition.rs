//! FILENAME: aggregate-engine/src/definition.rs
//! Aggregation Definition - The arguments of an aggregation call.
//!
//! This module contains the types that DESCRIBE an aggregation: which
//! reduction to apply, which variables and regions are involved and how
//! components are chosen. The serializable parts are designed to be:
//! - Loaded from JSON as a batch of definitions
//! - Immutable snapshots of user intent, resolved once at call entry

use std::fmt;
use std::sync::Arc;

use frame::{Dimension, KeyValue};
use serde::{Deserialize, Serialize};

// ============================================================================
// REDUCTION METHODS
// ============================================================================

/// Built-in reduction functions applied to each group of values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reduction {
    Sum,
    Mean,
    Min,
    Max,
    Median,
    #[serde(rename = "prod")]
    Product,
}

impl Default for Reduction {
    fn default() -> Self {
        Reduction::Sum
    }
}

/// Signature of a user-supplied reduction.
pub type ReduceFn = dyn Fn(&[f64]) -> f64 + Send + Sync;

/// A user-supplied reduction with a display name for logs and errors.
#[derive(Clone)]
pub struct CustomReduction {
    pub name: String,
    pub func: Arc<ReduceFn>,
}

impl CustomReduction {
    pub fn new<F>(name: &str, func: F) -> Self
    where
        F: Fn(&[f64]) -> f64 + Send + Sync + 'static,
    {
        CustomReduction {
            name: name.to_string(),
            func: Arc::new(func),
        }
    }
}

impl fmt::Debug for CustomReduction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomReduction")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// How a caller names the reduction: by string, by built-in variant, or as
/// a function value. Resolved into a `Method` before any data is touched.
#[derive(Debug, Clone)]
pub enum MethodId {
    Name(String),
    Builtin(Reduction),
    Custom(CustomReduction),
}

impl Default for MethodId {
    fn default() -> Self {
        MethodId::Builtin(Reduction::Sum)
    }
}

impl From<&str> for MethodId {
    fn from(name: &str) -> Self {
        MethodId::Name(name.to_string())
    }
}

impl From<String> for MethodId {
    fn from(name: String) -> Self {
        MethodId::Name(name)
    }
}

impl From<Reduction> for MethodId {
    fn from(reduction: Reduction) -> Self {
        MethodId::Builtin(reduction)
    }
}

impl From<CustomReduction> for MethodId {
    fn from(custom: CustomReduction) -> Self {
        MethodId::Custom(custom)
    }
}

// ============================================================================
// TARGETS AND COMPONENTS
// ============================================================================

/// One variable or a set of variables to aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariableTarget {
    One(String),
    Many(Vec<String>),
}

impl VariableTarget {
    pub fn names(&self) -> Vec<&str> {
        match self {
            VariableTarget::One(v) => vec![v.as_str()],
            VariableTarget::Many(vs) => vs.iter().map(String::as_str).collect(),
        }
    }

    pub fn as_single(&self) -> Option<&str> {
        match self {
            VariableTarget::One(v) => Some(v),
            VariableTarget::Many(_) => None,
        }
    }
}

impl From<&str> for VariableTarget {
    fn from(v: &str) -> Self {
        VariableTarget::One(v.to_string())
    }
}

impl From<String> for VariableTarget {
    fn from(v: String) -> Self {
        VariableTarget::One(v)
    }
}

impl From<Vec<String>> for VariableTarget {
    fn from(vs: Vec<String>) -> Self {
        VariableTarget::Many(vs)
    }
}

impl From<Vec<&str>> for VariableTarget {
    fn from(vs: Vec<&str>) -> Self {
        VariableTarget::Many(vs.into_iter().map(str::to_string).collect())
    }
}

/// Region-level components added on top of a subregion aggregate.
/// Serialized as `false`, `true` or a list of variable names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ComponentsRepr", into = "ComponentsRepr")]
pub enum Components {
    /// Subregions only.
    Off,
    /// Children reported at the region but not in any subregion.
    Auto,
    Explicit(Vec<String>),
}

impl Default for Components {
    fn default() -> Self {
        Components::Off
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ComponentsRepr {
    Flag(bool),
    List(Vec<String>),
}

impl From<ComponentsRepr> for Components {
    fn from(repr: ComponentsRepr) -> Self {
        match repr {
            ComponentsRepr::Flag(false) => Components::Off,
            ComponentsRepr::Flag(true) => Components::Auto,
            ComponentsRepr::List(list) => Components::Explicit(list),
        }
    }
}

impl From<Components> for ComponentsRepr {
    fn from(components: Components) -> Self {
        match components {
            Components::Off => ComponentsRepr::Flag(false),
            Components::Auto => ComponentsRepr::Flag(true),
            Components::Explicit(list) => ComponentsRepr::List(list),
        }
    }
}

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Closeness thresholds: `|a - b| <= atol + rtol * |b|`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tolerance {
    pub rtol: f64,
    pub atol: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Tolerance {
            rtol: 1e-5,
            atol: 1e-8,
        }
    }
}

impl Tolerance {
    /// Whether `actual` is close to `expected`. NaN is never close.
    pub fn is_close(&self, actual: f64, expected: f64) -> bool {
        (actual - expected).abs() <= self.atol + self.rtol * expected.abs()
    }
}

/// Settings shared by every call of a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Reduction used when a definition names none.
    pub method: Reduction,
    pub tolerance: Tolerance,
    /// Skip comparing recursive intermediate aggregates with existing data.
    pub skip_validate: bool,
    /// Replace existing values instead of failing on duplicate keys.
    pub overwrite: bool,
}

// ============================================================================
// CALL ARGUMENTS
// ============================================================================

fn default_region() -> String {
    "World".to_string()
}

fn default_true() -> bool {
    true
}

fn default_time_column() -> Dimension {
    Dimension::Subannual
}

fn default_time_value() -> KeyValue {
    KeyValue::Text("year".to_string())
}

/// Arguments of a region aggregation.
#[derive(Debug, Clone)]
pub struct RegionAggregation {
    pub variable: VariableTarget,
    /// Target region.
    pub region: String,
    /// Regions to aggregate; all other regions with data when `None`.
    pub subregions: Option<Vec<String>>,
    pub components: Components,
    pub method: MethodId,
    /// Variable holding the weights, if weighted.
    pub weight: Option<String>,
    pub drop_negative_weights: bool,
}

impl RegionAggregation {
    pub fn new(variable: impl Into<VariableTarget>) -> Self {
        RegionAggregation {
            variable: variable.into(),
            region: default_region(),
            subregions: None,
            components: Components::Off,
            method: MethodId::default(),
            weight: None,
            drop_negative_weights: true,
        }
    }

    pub fn region(mut self, region: &str) -> Self {
        self.region = region.to_string();
        self
    }

    pub fn subregions<I, S>(mut self, subregions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subregions = Some(subregions.into_iter().map(Into::into).collect());
        self
    }

    pub fn components(mut self, components: Components) -> Self {
        self.components = components;
        self
    }

    pub fn method(mut self, method: impl Into<MethodId>) -> Self {
        self.method = method.into();
        self
    }

    pub fn weight(mut self, weight: &str) -> Self {
        self.weight = Some(weight.to_string());
        self
    }

    pub fn drop_negative_weights(mut self, drop: bool) -> Self {
        self.drop_negative_weights = drop;
        self
    }
}

/// Arguments of a subannual-to-annual aggregation.
#[derive(Debug, Clone)]
pub struct TimeAggregation {
    pub variable: VariableTarget,
    /// The time-slice column to collapse.
    pub column: Dimension,
    /// Label given to the aggregate in `column`.
    pub value: KeyValue,
    /// Labels to aggregate; every label other than `value` when `None`.
    pub components: Option<Vec<KeyValue>>,
    pub method: MethodId,
}

impl TimeAggregation {
    pub fn new(variable: impl Into<VariableTarget>) -> Self {
        TimeAggregation {
            variable: variable.into(),
            column: default_time_column(),
            value: default_time_value(),
            components: None,
            method: MethodId::default(),
        }
    }

    pub fn column(mut self, column: Dimension) -> Self {
        self.column = column;
        self
    }

    pub fn value(mut self, value: impl Into<KeyValue>) -> Self {
        self.value = value.into();
        self
    }

    pub fn components<I, V>(mut self, components: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<KeyValue>,
    {
        self.components = Some(components.into_iter().map(Into::into).collect());
        self
    }

    pub fn method(mut self, method: impl Into<MethodId>) -> Self {
        self.method = method.into();
        self
    }
}

// ============================================================================
// SERIALIZABLE DEFINITIONS
// ============================================================================

/// One aggregation call in serializable form. Method names are resolved
/// when the definition runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AggregationDefinition {
    Variable {
        variable: VariableTarget,
        #[serde(default)]
        components: Option<Vec<String>>,
        #[serde(default)]
        method: Option<String>,
        #[serde(default)]
        recursive: bool,
    },
    Region {
        variable: VariableTarget,
        #[serde(default = "default_region")]
        region: String,
        #[serde(default)]
        subregions: Option<Vec<String>>,
        #[serde(default)]
        components: Components,
        #[serde(default)]
        method: Option<String>,
        #[serde(default)]
        weight: Option<String>,
        #[serde(default = "default_true")]
        drop_negative_weights: bool,
    },
    Time {
        variable: VariableTarget,
        #[serde(default = "default_time_column")]
        column: Dimension,
        #[serde(default = "default_time_value")]
        value: KeyValue,
        #[serde(default)]
        components: Option<Vec<KeyValue>>,
        #[serde(default)]
        method: Option<String>,
    },
}
