//! FILENAME: aggregate-engine/src/engine.rs
//! Aggregation Engine - Runs serializable definitions against a frame.
//!
//! This module takes a list of AggregationDefinitions and an IamFrame and
//! produces a new IamFrame holding the original data plus every result.
//!
//! Algorithm:
//! 1. Resolve each definition's method name (or the configured default)
//! 2. Dispatch to the variable, recursive, region or time aggregator
//! 3. Merge the result into the working frame before the next definition,
//!    so later definitions see earlier results

use frame::{IamFrame, IndexedSeries};

use crate::definition::{
    AggregationConfig, AggregationDefinition, MethodId, RegionAggregation, TimeAggregation,
};
use crate::error::{AggregateError, Result};
use crate::recursive::aggregate_recursive;
use crate::region::aggregate_region;
use crate::time::aggregate_time;
use crate::variable::aggregate_variable;

const LOG_TARGET: &str = "AGGREGATE";

fn method_id(name: &Option<String>, config: &AggregationConfig) -> MethodId {
    match name {
        Some(name) => MethodId::Name(name.clone()),
        None => MethodId::Builtin(config.method),
    }
}

/// Computes the result of one definition without merging it.
pub fn apply_definition(
    frame: &IamFrame,
    definition: &AggregationDefinition,
    config: &AggregationConfig,
) -> Result<Option<IndexedSeries>> {
    match definition {
        AggregationDefinition::Variable {
            variable,
            components,
            method,
            recursive,
        } => {
            let method = method_id(method, config);
            if !*recursive {
                return aggregate_variable(frame, variable, components.as_deref(), &method);
            }
            if components.is_some() {
                return Err(AggregateError::InvalidArgument(
                    "recursive aggregation with explicit components is not supported".to_string(),
                ));
            }
            let Some(root) = variable.as_single() else {
                return Err(AggregateError::InvalidArgument(
                    "recursive aggregation takes a single variable".to_string(),
                ));
            };
            aggregate_recursive(frame, root, &method, config)
        }

        AggregationDefinition::Region {
            variable,
            region,
            subregions,
            components,
            method,
            weight,
            drop_negative_weights,
        } => {
            let args = RegionAggregation {
                variable: variable.clone(),
                region: region.clone(),
                subregions: subregions.clone(),
                components: components.clone(),
                method: method_id(method, config),
                weight: weight.clone(),
                drop_negative_weights: *drop_negative_weights,
            };
            aggregate_region(frame, &args)
        }

        AggregationDefinition::Time {
            variable,
            column,
            value,
            components,
            method,
        } => {
            let args = TimeAggregation {
                variable: variable.clone(),
                column: column.clone(),
                value: value.clone(),
                components: components.clone(),
                method: method_id(method, config),
            };
            aggregate_time(frame, &args)
        }
    }
}

/// Applies `definitions` in order and returns the frame with all results
/// appended. Results colliding with existing keys fail unless
/// `config.overwrite` is set.
pub fn run_definitions(
    frame: &IamFrame,
    definitions: &[AggregationDefinition],
    config: &AggregationConfig,
) -> Result<IamFrame> {
    let mut working = frame.clone();

    for (index, definition) in definitions.iter().enumerate() {
        let Some(result) = apply_definition(&working, definition, config)? else {
            log::debug!(target: LOG_TARGET, "definition {} produced no data", index);
            continue;
        };
        if result.is_empty() {
            continue;
        }
        log::debug!(
            target: LOG_TARGET,
            "definition {} produced {} rows",
            index,
            result.len()
        );
        working = if config.overwrite {
            working.append_overwrite(&result)?
        } else {
            working.append(&result)?
        };
    }

    Ok(working)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{Components, Reduction, VariableTarget};
    use frame::{Dimension, FrameError, KeyValue, Row, TimeDomain};

    fn frame() -> IamFrame {
        IamFrame::from_rows(
            TimeDomain::Year,
            vec![],
            vec![
                Row::new("m", "s", "R1", "A|B", "EJ/yr", 2020, 1.0),
                Row::new("m", "s", "R1", "A|C", "EJ/yr", 2020, 2.0),
                Row::new("m", "s", "R2", "A|B", "EJ/yr", 2020, 3.0),
            ],
        )
        .unwrap()
    }

    fn value(frame: &IamFrame, region: &str, variable: &str) -> Option<f64> {
        let key: Vec<KeyValue> = vec![
            "m".into(),
            "s".into(),
            region.into(),
            variable.into(),
            "EJ/yr".into(),
            2020.into(),
        ];
        frame.get(&key)
    }

    fn variable(name: &str) -> AggregationDefinition {
        AggregationDefinition::Variable {
            variable: VariableTarget::One(name.to_string()),
            components: None,
            method: None,
            recursive: false,
        }
    }

    fn region(name: &str) -> AggregationDefinition {
        AggregationDefinition::Region {
            variable: VariableTarget::One(name.to_string()),
            region: "World".to_string(),
            subregions: None,
            components: Components::Off,
            method: None,
            weight: None,
            drop_negative_weights: true,
        }
    }

    #[test]
    fn test_later_definitions_see_earlier_results() {
        let config = AggregationConfig::default();
        let result = run_definitions(&frame(), &[variable("A"), region("A")], &config).unwrap();
        assert_eq!(value(&result, "R1", "A"), Some(3.0));
        assert_eq!(value(&result, "R2", "A"), Some(3.0));
        assert_eq!(value(&result, "World", "A"), Some(6.0));
        assert_eq!(result.len(), 6);
    }

    #[test]
    fn test_config_method_is_default() {
        let config = AggregationConfig {
            method: Reduction::Max,
            ..AggregationConfig::default()
        };
        let result = run_definitions(&frame(), &[variable("A")], &config).unwrap();
        assert_eq!(value(&result, "R1", "A"), Some(2.0));
    }

    #[test]
    fn test_duplicate_results_need_overwrite() {
        let config = AggregationConfig::default();
        let err = run_definitions(&frame(), &[variable("A"), variable("A")], &config).unwrap_err();
        assert!(matches!(err, AggregateError::Frame(FrameError::DuplicateKey(_))));

        let config = AggregationConfig {
            overwrite: true,
            ..AggregationConfig::default()
        };
        let result = run_definitions(&frame(), &[variable("A"), variable("A")], &config).unwrap();
        assert_eq!(result.len(), 5);
    }

    #[test]
    fn test_empty_results_are_skipped() {
        let config = AggregationConfig::default();
        let result = run_definitions(&frame(), &[variable("Z")], &config).unwrap();
        assert_eq!(result.len(), frame().len());
    }

    #[test]
    fn test_recursive_with_components_is_rejected() {
        let definition = AggregationDefinition::Variable {
            variable: VariableTarget::One("A".to_string()),
            components: Some(vec!["A|B".to_string()]),
            method: None,
            recursive: true,
        };
        let err = apply_definition(&frame(), &definition, &AggregationConfig::default()).unwrap_err();
        assert!(matches!(err, AggregateError::InvalidArgument(_)));
    }

    #[test]
    fn test_time_definition_requires_extra_column() {
        let definition = AggregationDefinition::Time {
            variable: VariableTarget::One("A".to_string()),
            column: Dimension::Subannual,
            value: KeyValue::from("year"),
            components: None,
            method: None,
        };
        let err = apply_definition(&frame(), &definition, &AggregationConfig::default()).unwrap_err();
        assert!(matches!(err, AggregateError::InvalidArgument(_)));
    }
}
