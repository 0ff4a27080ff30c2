//! FILENAME: aggregate-engine/src/method.rs
//! PURPOSE: Resolves method identifiers into callable reductions.
//! CONTEXT: Every aggregator resolves its `MethodId` once at entry. After that
//! the grouping code only sees `Method::apply`, so an unknown name fails
//! before any data is selected.

use std::fmt;

use crate::definition::{CustomReduction, MethodId, Reduction};
use crate::error::{AggregateError, Result};

// ============================================================================
// BUILT-IN REDUCTIONS
// ============================================================================

impl Reduction {
    /// Looks up a reduction by name. `avg` is an alias of `mean`.
    pub fn from_name(name: &str) -> Option<Reduction> {
        match name {
            "sum" => Some(Reduction::Sum),
            "mean" | "avg" => Some(Reduction::Mean),
            "min" => Some(Reduction::Min),
            "max" => Some(Reduction::Max),
            "median" => Some(Reduction::Median),
            "prod" => Some(Reduction::Product),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Reduction::Sum => "sum",
            Reduction::Mean => "mean",
            Reduction::Min => "min",
            Reduction::Max => "max",
            Reduction::Median => "median",
            Reduction::Product => "prod",
        }
    }

    /// Reduces `values`, skipping NaN. Sum and product of nothing are 0 and 1;
    /// the other reductions of nothing are NaN.
    pub fn apply(&self, values: &[f64]) -> f64 {
        let mut valid: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();

        match self {
            Reduction::Sum => valid.iter().sum(),
            Reduction::Product => valid.iter().product(),
            _ if valid.is_empty() => f64::NAN,
            Reduction::Mean => valid.iter().sum::<f64>() / valid.len() as f64,
            Reduction::Min => valid.iter().copied().fold(f64::INFINITY, f64::min),
            Reduction::Max => valid.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Reduction::Median => {
                valid.sort_by(|a, b| a.total_cmp(b));
                let mid = valid.len() / 2;
                if valid.len() % 2 == 0 {
                    (valid[mid - 1] + valid[mid]) / 2.0
                } else {
                    valid[mid]
                }
            }
        }
    }
}

// ============================================================================
// RESOLVED METHOD
// ============================================================================

/// A reduction ready to be applied to groups of values.
#[derive(Debug, Clone)]
pub enum Method {
    Builtin(Reduction),
    Custom(CustomReduction),
}

impl Method {
    pub fn apply(&self, values: &[f64]) -> f64 {
        match self {
            Method::Builtin(reduction) => reduction.apply(values),
            Method::Custom(custom) => (custom.func)(values),
        }
    }

    /// Weighted aggregation is only defined for the builtin sum.
    pub fn is_sum(&self) -> bool {
        matches!(self, Method::Builtin(Reduction::Sum))
    }

    pub fn name(&self) -> &str {
        match self {
            Method::Builtin(reduction) => reduction.name(),
            Method::Custom(custom) => &custom.name,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolves a method identifier. Names outside the known set fail with
/// `UnknownMethod`; builtins and custom functions pass through.
pub fn resolve_method(method: &MethodId) -> Result<Method> {
    match method {
        MethodId::Name(name) => Reduction::from_name(name)
            .map(Method::Builtin)
            .ok_or_else(|| AggregateError::UnknownMethod(name.clone())),
        MethodId::Builtin(reduction) => Ok(Method::Builtin(*reduction)),
        MethodId::Custom(custom) => Ok(Method::Custom(custom.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_names() {
        for (name, expected) in [
            ("sum", Reduction::Sum),
            ("mean", Reduction::Mean),
            ("avg", Reduction::Mean),
            ("min", Reduction::Min),
            ("max", Reduction::Max),
            ("median", Reduction::Median),
            ("prod", Reduction::Product),
        ] {
            match resolve_method(&MethodId::from(name)).unwrap() {
                Method::Builtin(r) => assert_eq!(r, expected, "{}", name),
                other => panic!("unexpected method {:?}", other),
            }
        }
    }

    #[test]
    fn test_unknown_method_fails() {
        let err = resolve_method(&MethodId::from("bogus")).unwrap_err();
        assert!(matches!(err, AggregateError::UnknownMethod(ref n) if n == "bogus"));
        assert_eq!(err.to_string(), "'bogus' is not a known method");
    }

    #[test]
    fn test_custom_method_passes_through() {
        let range = CustomReduction::new("range", |v: &[f64]| {
            let max = v.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let min = v.iter().copied().fold(f64::INFINITY, f64::min);
            max - min
        });
        let method = resolve_method(&MethodId::from(range)).unwrap();
        assert_eq!(method.apply(&[1.0, 4.0, 2.0]), 3.0);
        assert_eq!(method.name(), "range");
        assert!(!method.is_sum());
    }

    #[test]
    fn test_reductions_skip_nan() {
        let values = [1.0, f64::NAN, 3.0];
        assert_eq!(Reduction::Sum.apply(&values), 4.0);
        assert_eq!(Reduction::Mean.apply(&values), 2.0);
        assert_eq!(Reduction::Min.apply(&values), 1.0);
        assert_eq!(Reduction::Max.apply(&values), 3.0);
        assert_eq!(Reduction::Product.apply(&values), 3.0);
        assert_eq!(Reduction::Median.apply(&[4.0, 1.0, 3.0, 2.0]), 2.5);
    }

    #[test]
    fn test_empty_reductions() {
        assert_eq!(Reduction::Sum.apply(&[]), 0.0);
        assert_eq!(Reduction::Product.apply(&[]), 1.0);
        assert!(Reduction::Mean.apply(&[f64::NAN]).is_nan());
        assert!(Reduction::Median.apply(&[]).is_nan());
    }
}
