//! Deterministic row ordering
//!
//! Time value ascending, then geography ascending, then issue ascending
//! for modes that may return several revisions per key. Remaining ties
//! fall back to insertion sequence.

use std::cmp::Ordering;

use crate::version::Candidate;

use super::layout::TableLayout;
use super::row::FieldValue;

pub struct RowSorter;

impl RowSorter {
    pub fn sort(layout: &TableLayout, candidates: &mut [Candidate<'_>], by_issue: bool) {
        let issue = if by_issue { layout.issue_field() } else { None };
        candidates.sort_by(|a, b| {
            let key = |field: &str| {
                Self::compare_values(a.row.get(field), b.row.get(field))
            };
            key(layout.time_field())
                .then_with(|| key(layout.geo_field()))
                .then_with(|| issue.map_or(Ordering::Equal, key))
                .then(a.seq.cmp(&b.seq))
        });
    }

    /// Missing < null < numbers < strings; numbers compare numerically.
    pub fn compare_values(a: Option<&FieldValue>, b: Option<&FieldValue>) -> Ordering {
        match (a, b) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(a), Some(b)) => {
                let rank = |v: &FieldValue| -> u8 {
                    match v {
                        FieldValue::Null => 0,
                        FieldValue::Int(_) | FieldValue::Float(_) => 1,
                        FieldValue::Str(_) => 2,
                    }
                };
                match (a, b) {
                    (FieldValue::Int(x), FieldValue::Int(y)) => x.cmp(y),
                    (FieldValue::Int(x), FieldValue::Float(y)) => {
                        (*x as f64).partial_cmp(y).unwrap_or(Ordering::Equal)
                    }
                    (FieldValue::Float(x), FieldValue::Int(y)) => {
                        x.partial_cmp(&(*y as f64)).unwrap_or(Ordering::Equal)
                    }
                    (FieldValue::Float(x), FieldValue::Float(y)) => {
                        x.partial_cmp(y).unwrap_or(Ordering::Equal)
                    }
                    (FieldValue::Str(x), FieldValue::Str(y)) => x.cmp(y),
                    _ => rank(a).cmp(&rank(b)),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::TimeUnit;
    use crate::stream::Row;

    #[test]
    fn test_time_then_geo_then_issue() {
        let layout = TableLayout::new("t", "epiweek", TimeUnit::Week, "region").issue("issue");
        let rows = vec![
            Row::new().with("epiweek", 201441).with("region", "nat").with("issue", 1),
            Row::new().with("epiweek", 201440).with("region", "nat").with("issue", 2),
            Row::new().with("epiweek", 201440).with("region", "hhs1").with("issue", 3),
            Row::new().with("epiweek", 201440).with("region", "nat").with("issue", 1),
        ];
        let mut candidates: Vec<Candidate<'_>> = rows
            .iter()
            .enumerate()
            .map(|(i, row)| Candidate {
                seq: i as u64,
                row,
                is_current: false,
            })
            .collect();

        RowSorter::sort(&layout, &mut candidates, true);
        let order: Vec<u64> = candidates.iter().map(|c| c.seq).collect();
        assert_eq!(order, vec![2, 3, 1, 0]);

        RowSorter::sort(&layout, &mut candidates, false);
        let order: Vec<u64> = candidates.iter().map(|c| c.seq).collect();
        assert_eq!(order, vec![2, 1, 3, 0]);
    }

    #[test]
    fn test_compare_mixed() {
        use FieldValue::*;
        assert_eq!(RowSorter::compare_values(Some(&Int(2)), Some(&Float(1.5))), Ordering::Greater);
        assert_eq!(RowSorter::compare_values(Some(&Null), Some(&Int(0))), Ordering::Less);
        assert_eq!(RowSorter::compare_values(None, Some(&Null)), Ordering::Less);
        assert_eq!(
            RowSorter::compare_values(Some(&Str("a".into())), Some(&Int(9))),
            Ordering::Greater
        );
    }
}
