//! FILENAME: aggregate-engine/src/reduce.rs
//! Grouped reduction over an indexed series.

use frame::{Dimension, IndexedSeries};

use crate::method::Method;

/// Collapses the `by` dimensions and reduces each remaining key's values
/// with `method`. An empty `by` only merges duplicate keys.
pub fn group_and_reduce(series: &IndexedSeries, by: &[Dimension], method: &Method) -> IndexedSeries {
    series.group_by(by, |values| method.apply(values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::Reduction;
    use frame::{IndexKey, KeyValue};
    use smallvec::smallvec;

    fn series() -> IndexedSeries {
        let key = |r: &str, v: &str| -> IndexKey { smallvec![KeyValue::from(r), KeyValue::from(v)] };
        IndexedSeries::from_entries(
            vec![Dimension::Region, Dimension::Variable],
            vec![
                (key("R1", "A"), 1.0),
                (key("R2", "A"), 5.0),
                (key("R1", "B"), 2.0),
                (key("R1", "A"), 3.0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_reduce_over_region() {
        let max = group_and_reduce(&series(), &[Dimension::Region], &Method::Builtin(Reduction::Max));
        assert_eq!(max.dims(), &[Dimension::Variable]);
        assert_eq!(max.get(&[KeyValue::from("A")]), Some(5.0));
        assert_eq!(max.get(&[KeyValue::from("B")]), Some(2.0));
    }

    #[test]
    fn test_empty_by_merges_duplicates() {
        let merged = group_and_reduce(&series(), &[], &Method::Builtin(Reduction::Sum));
        assert_eq!(merged.len(), 3);
        assert_eq!(merged.get(&[KeyValue::from("R1"), KeyValue::from("A")]), Some(4.0));
    }

    #[test]
    fn test_unknown_by_dimension_is_ignored() {
        let reduced = group_and_reduce(
            &series(),
            &[Dimension::Region, Dimension::Unit],
            &Method::Builtin(Reduction::Sum),
        );
        assert_eq!(reduced.dims(), &[Dimension::Variable]);
        assert_eq!(reduced.get(&[KeyValue::from("A")]), Some(9.0));
    }
}
