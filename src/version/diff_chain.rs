//! Correction-chain resolution
//!
//! Some sources publish successive corrections instead of full snapshots.
//! Each record carries a release date and a parse order; a later parse of
//! an earlier-or-equal release restates it.
//!
//! For a dimension-key and cutoff `C`:
//! 1. Eligible records: not retracted, `release_date <= C`
//! 2. A record is superseded when another eligible record has
//!    `release_date <=` its own and a larger parse order
//! 3. The winner is the non-superseded record with the largest
//!    `(release_date, parse_order)`

use std::collections::HashMap;

use crate::stream::{DimensionKey, TableLayout};

use super::resolver::Candidate;

#[derive(Debug, Clone, Copy)]
struct ChainPoint {
    release: i64,
    parse_order: i64,
}

/// Selects one correction record per dimension-key.
pub fn select<'a>(
    layout: &TableLayout,
    candidates: Vec<Candidate<'a>>,
    cutoff: Option<i64>,
) -> Vec<Candidate<'a>> {
    let columns = match layout.chain_columns() {
        Some(c) => c,
        None => return Vec::new(),
    };

    let mut groups: Vec<Vec<(ChainPoint, Candidate<'a>)>> = Vec::new();
    let mut by_key: HashMap<DimensionKey, usize> = HashMap::new();

    for candidate in candidates {
        let row = candidate.row;
        let release = row.get(&columns.release_field).and_then(|v| v.as_i64());
        let parse_order = row.get(&columns.parse_order_field).and_then(|v| v.as_i64());
        let (release, parse_order) = match (release, parse_order) {
            (Some(r), Some(p)) => (r, p),
            _ => continue,
        };
        let retracted = columns
            .retracted_field
            .as_ref()
            .and_then(|f| row.get(f))
            .and_then(|v| v.as_i64())
            .is_some_and(|v| v != 0);
        if retracted || cutoff.is_some_and(|c| release > c) {
            continue;
        }

        let point = ChainPoint {
            release,
            parse_order,
        };
        let key = layout.dimension_key(row);
        let idx = *by_key.entry(key).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[idx].push((point, candidate));
    }

    groups.into_iter().filter_map(|group| winner(&group)).collect()
}

fn winner<'a>(group: &[(ChainPoint, Candidate<'a>)]) -> Option<Candidate<'a>> {
    group
        .iter()
        .filter(|(point, _)| {
            !group.iter().any(|(other, _)| {
                other.release <= point.release && other.parse_order > point.parse_order
            })
        })
        .max_by(|(a, ca), (b, cb)| {
            (a.release, a.parse_order)
                .cmp(&(b.release, b.parse_order))
                .then(cb.seq.cmp(&ca.seq))
        })
        .map(|(_, c)| *c)
}
