//! FILENAME: tests/test_definitions.rs
//! Integration tests for JSON aggregation definitions and batch runs.

mod common;

use aggregate_engine::{
    run_definitions, AggregateError, AggregationConfig, AggregationDefinition, Components,
    Reduction, VariableTarget,
};
use common::{assert_frame_value, key, EnergyFixture, TimesliceFixture, MODEL, SCENARIO};
use frame::{Dimension, FrameError, IamFrame, KeyValue, Row, TimeDomain};

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn parse(json: &str) -> Vec<AggregationDefinition> {
    serde_json::from_str(json).expect("definitions should parse")
}

// ============================================================================
// PARSING
// ============================================================================

#[test]
fn test_parse_all_kinds() {
    let definitions = parse(
        r#"[
            {"kind": "variable", "variable": "Primary Energy"},
            {"kind": "variable", "variable": "Emissions", "recursive": true, "method": "sum"},
            {"kind": "region", "variable": ["Primary Energy|Coal", "Primary Energy|Gas"]},
            {"kind": "region", "variable": "Emissions|CO2", "region": "World", "components": true},
            {"kind": "region", "variable": "Price|Carbon", "weight": "Population",
             "drop_negative_weights": false},
            {"kind": "time", "variable": "Final Energy|Heat", "components": ["summer", "winter"]}
        ]"#,
    );
    assert_eq!(definitions.len(), 6);

    match &definitions[1] {
        AggregationDefinition::Variable { recursive, method, .. } => {
            assert!(*recursive);
            assert_eq!(method.as_deref(), Some("sum"));
        }
        other => panic!("unexpected definition: {:?}", other),
    }
    match &definitions[2] {
        AggregationDefinition::Region { variable, components, .. } => {
            assert_eq!(variable.names(), vec!["Primary Energy|Coal", "Primary Energy|Gas"]);
            assert_eq!(*components, Components::Off);
        }
        other => panic!("unexpected definition: {:?}", other),
    }
    match &definitions[5] {
        AggregationDefinition::Time { column, value, components, .. } => {
            assert_eq!(*column, Dimension::Subannual);
            assert_eq!(*value, KeyValue::from("year"));
            assert_eq!(components.as_ref().map(Vec::len), Some(2));
        }
        other => panic!("unexpected definition: {:?}", other),
    }
}

#[test]
fn test_definitions_serialize_back() {
    let definitions = vec![
        AggregationDefinition::Region {
            variable: VariableTarget::One("Emissions|CO2".to_string()),
            region: "World".to_string(),
            subregions: Some(vec!["reg_a".to_string()]),
            components: Components::Explicit(vec!["Emissions|CO2|Bunkers".to_string()]),
            method: Some("sum".to_string()),
            weight: None,
            drop_negative_weights: true,
        },
        AggregationDefinition::Time {
            variable: VariableTarget::Many(vec!["A".to_string(), "B".to_string()]),
            column: Dimension::Subannual,
            value: KeyValue::from("year"),
            components: None,
            method: None,
        },
    ];
    let json = serde_json::to_string(&definitions).unwrap();
    assert!(json.contains(r#""kind":"region""#));
    assert!(json.contains(r#""components":["Emissions|CO2|Bunkers"]"#));
    let parsed: Vec<AggregationDefinition> = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, definitions);
}

#[test]
fn test_parse_config() {
    let config: AggregationConfig = serde_json::from_str(
        r#"{"method": "mean", "overwrite": true, "tolerance": {"rtol": 0.01}}"#,
    )
    .unwrap();
    assert_eq!(config.method, Reduction::Mean);
    assert!(config.overwrite);
    assert!(!config.skip_validate);
    assert_eq!(config.tolerance.rtol, 0.01);
    assert_eq!(config.tolerance.atol, 1e-8);
}

// ============================================================================
// RUNNING
// ============================================================================

#[test]
fn test_run_rebuilds_parents_and_world() {
    let df = EnergyFixture::leaves();
    let definitions = parse(
        r#"[
            {"kind": "variable", "variable": ["Primary Energy", "Emissions|CO2"]},
            {"kind": "region", "variable": ["Primary Energy", "Primary Energy|Coal", "Primary Energy|Gas"]},
            {"kind": "region", "variable": "Price|Carbon", "weight": "Population"}
        ]"#,
    );
    let result = run_definitions(&df, &definitions, &AggregationConfig::default()).unwrap();

    let complete = EnergyFixture::frame();
    for variable in ["Primary Energy", "Primary Energy|Coal", "Primary Energy|Gas"] {
        for year in [2005, 2010] {
            let k = key("World", variable, "EJ/yr", year);
            assert_frame_value(&result, &k, complete.get(&k).unwrap());
        }
    }
    assert_frame_value(&result, &key("reg_b", "Emissions|CO2", "Mt CO2/yr", 2010), 4.0);
    assert_frame_value(&result, &key("World", "Price|Carbon", "USD/t CO2", 2010), 35.0);
    assert_eq!(result.len(), df.len() + 8 + 6 + 2);
}

#[test]
fn test_run_recursive_then_region() {
    let df = IamFrame::from_rows(
        TimeDomain::Year,
        Vec::new(),
        vec![
            Row::new(MODEL, SCENARIO, "reg_a", "A|B|C", "EJ/yr", 2010, 1.0),
            Row::new(MODEL, SCENARIO, "reg_a", "A|B|D", "EJ/yr", 2010, 2.0),
            Row::new(MODEL, SCENARIO, "reg_a", "A|E", "EJ/yr", 2010, 3.0),
            Row::new(MODEL, SCENARIO, "reg_b", "A|E", "EJ/yr", 2010, 4.0),
        ],
    )
    .unwrap();
    let definitions = parse(
        r#"[
            {"kind": "variable", "variable": "A", "recursive": true},
            {"kind": "region", "variable": "A"}
        ]"#,
    );
    let result = run_definitions(&df, &definitions, &AggregationConfig::default()).unwrap();

    let k = |region: &str, variable: &str| key(region, variable, "EJ/yr", 2010);
    assert_frame_value(&result, &k("reg_a", "A|B"), 3.0);
    assert_frame_value(&result, &k("reg_a", "A"), 6.0);
    assert_frame_value(&result, &k("reg_b", "A"), 4.0);
    assert_frame_value(&result, &k("World", "A"), 10.0);
}

#[test]
fn test_run_time_definition() {
    let df = TimesliceFixture::frame();
    let definitions = parse(r#"[{"kind": "time", "variable": "Final Energy|Heat", "method": "mean"}]"#);
    let result = run_definitions(&df, &definitions, &AggregationConfig::default()).unwrap();

    let mut k = key("World", "Final Energy|Heat", "EJ/yr", 2010);
    k.push(KeyValue::from("year"));
    assert_frame_value(&result, &k, 2.5);
}

#[test]
fn test_run_stops_at_first_error() {
    let df = EnergyFixture::frame();
    let definitions = parse(
        r#"[
            {"kind": "variable", "variable": "Primary Energy", "method": "bogus"}
        ]"#,
    );
    let err = run_definitions(&df, &definitions, &AggregationConfig::default()).unwrap_err();
    assert!(matches!(err, AggregateError::UnknownMethod(ref m) if m == "bogus"));
}

#[test]
fn test_run_collision_requires_overwrite() {
    let df = EnergyFixture::frame();
    let definitions = parse(r#"[{"kind": "variable", "variable": "Primary Energy"}]"#);

    let err = run_definitions(&df, &definitions, &AggregationConfig::default()).unwrap_err();
    assert!(matches!(err, AggregateError::Frame(FrameError::DuplicateKey(_))));

    let config = AggregationConfig {
        overwrite: true,
        ..AggregationConfig::default()
    };
    let result = run_definitions(&df, &definitions, &config).unwrap();
    assert_eq!(result.len(), df.len());
}
