//! FILENAME: tests/common/mod.rs
//! Fixtures and assertion helpers for aggregation integration tests.

#![allow(dead_code)]

use frame::{Dimension, IamFrame, IndexKey, IndexedSeries, KeyValue, Row, TimeDomain};
use smallvec::smallvec;

pub const MODEL: &str = "model_a";
pub const SCENARIO: &str = "scen_a";
pub const YEARS: [i64; 2] = [2005, 2010];

// ============================================================================
// TEST DATA FIXTURES
// ============================================================================

/// A small, internally consistent energy and emissions dataset for two
/// regions and their World total.
pub struct EnergyFixture;

impl EnergyFixture {
    /// (region, variable, unit, [2005, 2010])
    pub fn data() -> Vec<(&'static str, &'static str, &'static str, [f64; 2])> {
        vec![
            ("reg_a", "Primary Energy", "EJ/yr", [8.0, 11.0]),
            ("reg_a", "Primary Energy|Coal", "EJ/yr", [5.0, 7.0]),
            ("reg_a", "Primary Energy|Gas", "EJ/yr", [3.0, 4.0]),
            ("reg_b", "Primary Energy", "EJ/yr", [3.0, 4.0]),
            ("reg_b", "Primary Energy|Coal", "EJ/yr", [2.0, 3.0]),
            ("reg_b", "Primary Energy|Gas", "EJ/yr", [1.0, 1.0]),
            ("World", "Primary Energy", "EJ/yr", [11.0, 15.0]),
            ("World", "Primary Energy|Coal", "EJ/yr", [7.0, 10.0]),
            ("World", "Primary Energy|Gas", "EJ/yr", [4.0, 5.0]),
            ("reg_a", "Emissions|CO2", "Mt CO2/yr", [6.0, 8.0]),
            ("reg_a", "Emissions|CO2|Energy", "Mt CO2/yr", [6.0, 8.0]),
            ("reg_b", "Emissions|CO2", "Mt CO2/yr", [3.0, 4.0]),
            ("reg_b", "Emissions|CO2|Energy", "Mt CO2/yr", [3.0, 4.0]),
            ("World", "Emissions|CO2", "Mt CO2/yr", [10.0, 13.0]),
            ("World", "Emissions|CO2|Energy", "Mt CO2/yr", [9.0, 12.0]),
            ("World", "Emissions|CO2|Bunkers", "Mt CO2/yr", [1.0, 1.0]),
            ("reg_a", "Price|Carbon", "USD/t CO2", [10.0, 20.0]),
            ("reg_b", "Price|Carbon", "USD/t CO2", [30.0, 40.0]),
            ("reg_a", "Population", "million", [1.0, 1.0]),
            ("reg_b", "Population", "million", [3.0, 3.0]),
        ]
    }

    pub fn rows() -> Vec<Row> {
        Self::data()
            .into_iter()
            .flat_map(|(region, variable, unit, values)| {
                YEARS
                    .iter()
                    .zip(values)
                    .map(move |(year, value)| Row::new(MODEL, SCENARIO, region, variable, unit, *year, value))
            })
            .collect()
    }

    pub fn frame() -> IamFrame {
        IamFrame::from_rows(TimeDomain::Year, Vec::new(), Self::rows()).unwrap()
    }

    /// Only the most detailed variables, reported for the subregions.
    pub fn leaves() -> IamFrame {
        let parents = ["Primary Energy", "Emissions|CO2"];
        let rows = Self::rows()
            .into_iter()
            .filter(|r| r.region != "World" && !parents.contains(&r.variable.as_str()));
        IamFrame::from_rows(TimeDomain::Year, Vec::new(), rows).unwrap()
    }
}

/// Electricity demand by season with a `subannual` column.
pub struct TimesliceFixture;

impl TimesliceFixture {
    /// (variable, subannual, value in 2010)
    pub fn data() -> Vec<(&'static str, &'static str, f64)> {
        vec![
            ("Final Energy|Electricity", "summer", 1.0),
            ("Final Energy|Electricity", "winter", 2.0),
            ("Final Energy|Heat", "summer", 0.5),
            ("Final Energy|Heat", "winter", 4.5),
            ("Capacity|Solar", "summer", 3.0),
            ("Capacity|Solar", "winter", 1.0),
        ]
    }

    pub fn frame() -> IamFrame {
        let rows = Self::data().into_iter().map(|(variable, slice, value)| {
            Row::new(MODEL, SCENARIO, "World", variable, "EJ/yr", 2010, value)
                .with_extra(Dimension::Subannual, slice)
        });
        IamFrame::from_rows(TimeDomain::Year, vec![Dimension::Subannual], rows).unwrap()
    }
}

// ============================================================================
// KEY HELPERS
// ============================================================================

/// Full key of a yearly observation without extra columns.
pub fn key(region: &str, variable: &str, unit: &str, year: i64) -> IndexKey {
    smallvec![
        KeyValue::from(MODEL),
        KeyValue::from(SCENARIO),
        KeyValue::from(region),
        KeyValue::from(variable),
        KeyValue::from(unit),
        KeyValue::from(year)
    ]
}

// ============================================================================
// ASSERTION HELPERS
// ============================================================================

/// Assert that a series holds the expected value at a key.
pub fn assert_value(series: &IndexedSeries, key: &IndexKey, expected: f64) {
    match series.get(key) {
        Some(actual) => assert!(
            (actual - expected).abs() < 1e-9,
            "key {:?} expected {} but got {}",
            key, expected, actual
        ),
        None => panic!("key {:?} expected {} but is missing", key, expected),
    }
}

/// Assert that a frame holds the expected value at a key.
pub fn assert_frame_value(frame: &IamFrame, key: &IndexKey, expected: f64) {
    match frame.get(key) {
        Some(actual) => assert!(
            (actual - expected).abs() < 1e-9,
            "key {:?} expected {} but got {}",
            key, expected, actual
        ),
        None => panic!("key {:?} expected {} but is missing", key, expected),
    }
}
