//! Version resolution
//!
//! ## Selection rule (AS_OF / LATEST)
//!
//! Given a cutoff `C`, a dimension-key `K` and the rows of `K`:
//! 1. Consider only rows with `issue <= C` (`C = +inf` for LATEST)
//! 2. From those, select the row with the largest issue
//! 3. Duplicate `(K, issue)` rows resolve to the lowest insertion sequence
//!
//! A key with no row at or before the cutoff is absent from the result,
//! never an error.

use std::collections::HashMap;

use crate::filter::{FieldKind, FilterCompiler, Predicate};
use crate::stream::{DimensionKey, Row, TableLayout};

use super::diff_chain;
use super::errors::{VersionError, VersionResult};
use super::spec::VersionSpec;

/// How LATEST is computed. Both strategies select the same rows as long as
/// the current flag is maintained on every insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatestStrategy {
    /// Group by dimension-key, max(issue), join back
    GroupMax,
    /// Read the maintained "is current" flag
    CurrentFlag,
}

/// Query shape the storage layer executes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedVersion {
    /// Predicate over the issue column
    Explicit(Predicate),
    Lag(i64),
    AsOf(i64),
    Latest(LatestStrategy),
    /// Correction-chain tables; `None` cutoff means latest
    DiffChain(Option<i64>),
    /// Tables without revisions
    Unversioned,
}

impl ResolvedVersion {
    /// Whether several rows per dimension-key may be returned.
    pub fn is_multi_row(&self) -> bool {
        matches!(
            self,
            ResolvedVersion::Explicit(_) | ResolvedVersion::Lag(_) | ResolvedVersion::Unversioned
        )
    }

    pub fn describe(&self) -> String {
        match self {
            ResolvedVersion::Explicit(_) => "explicit_issues".to_string(),
            ResolvedVersion::Lag(l) => format!("lag({})", l),
            ResolvedVersion::AsOf(c) => format!("as_of({})", c),
            ResolvedVersion::Latest(LatestStrategy::GroupMax) => "latest(group_max)".to_string(),
            ResolvedVersion::Latest(LatestStrategy::CurrentFlag) => {
                "latest(current_flag)".to_string()
            }
            ResolvedVersion::DiffChain(Some(c)) => format!("diff_chain({})", c),
            ResolvedVersion::DiffChain(None) => "diff_chain(latest)".to_string(),
            ResolvedVersion::Unversioned => "unversioned".to_string(),
        }
    }
}

/// Resolves a [`VersionSpec`] against a table layout.
pub struct VersionResolver;

impl VersionResolver {
    /// Resolves using the layout's preferred LATEST strategy: the current
    /// flag when the table maintains one, group-max otherwise.
    pub fn resolve(layout: &TableLayout, spec: &VersionSpec) -> VersionResult<ResolvedVersion> {
        let strategy = if layout.current_flag_field().is_some() {
            LatestStrategy::CurrentFlag
        } else {
            LatestStrategy::GroupMax
        };
        Self::resolve_with(layout, spec, strategy)
    }

    /// Resolves with an explicit LATEST strategy.
    pub fn resolve_with(
        layout: &TableLayout,
        spec: &VersionSpec,
        strategy: LatestStrategy,
    ) -> VersionResult<ResolvedVersion> {
        if layout.chain_columns().is_some() {
            return match spec {
                VersionSpec::Latest => Ok(ResolvedVersion::DiffChain(None)),
                VersionSpec::AsOf(cutoff) => Ok(ResolvedVersion::DiffChain(Some(*cutoff))),
                other => Err(VersionError::unsupported(layout.name(), other.mode_name())),
            };
        }

        let issue_field = match layout.issue_field() {
            Some(f) => f,
            None => {
                return match spec {
                    VersionSpec::Latest => Ok(ResolvedVersion::Unversioned),
                    other => Err(VersionError::unsupported(layout.name(), other.mode_name())),
                }
            }
        };

        match spec {
            VersionSpec::Issues(issues) => {
                let predicate = FilterCompiler::compile(issue_field, FieldKind::Integer, issues)?;
                Ok(ResolvedVersion::Explicit(predicate))
            }
            VersionSpec::Lag(lag) => {
                if *lag < 0 {
                    return Err(VersionError::invalid(format!("lag must be >= 0, got {}", lag)));
                }
                Ok(ResolvedVersion::Lag(*lag))
            }
            VersionSpec::AsOf(cutoff) => {
                if !layout.time_unit().is_valid(*cutoff) {
                    return Err(VersionError::invalid(format!(
                        "as_of {} is not a valid {} value",
                        cutoff,
                        layout.time_unit().as_str()
                    )));
                }
                Ok(ResolvedVersion::AsOf(*cutoff))
            }
            VersionSpec::Latest => {
                if strategy == LatestStrategy::CurrentFlag && layout.current_flag_field().is_none() {
                    return Err(VersionError::unsupported(layout.name(), "current-flag"));
                }
                Ok(ResolvedVersion::Latest(strategy))
            }
        }
    }
}

/// A stored row offered to in-memory selection
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    /// Insertion sequence (tie-break: lowest wins)
    pub seq: u64,
    pub row: &'a Row,
    /// Maintained "is current" flag
    pub is_current: bool,
}

/// Applies a resolved version to candidates already filtered by the
/// dimension predicates. Output order is unspecified; callers sort.
pub fn select_versions<'a>(
    layout: &TableLayout,
    version: &ResolvedVersion,
    candidates: Vec<Candidate<'a>>,
) -> Vec<Candidate<'a>> {
    match version {
        ResolvedVersion::Unversioned => candidates,
        ResolvedVersion::Explicit(predicate) => candidates
            .into_iter()
            .filter(|c| predicate.matches(c.row))
            .collect(),
        ResolvedVersion::Lag(lag) => {
            let unit = layout.time_unit();
            candidates
                .into_iter()
                .filter(|c| {
                    let time = c.row.get(layout.time_field()).and_then(|v| v.as_i64());
                    match (layout.issue_of(c.row), time) {
                        (Some(issue), Some(time)) => unit.shift(time, *lag) == Some(issue),
                        _ => false,
                    }
                })
                .collect()
        }
        ResolvedVersion::AsOf(cutoff) => max_issue_per_key(layout, candidates, Some(*cutoff)),
        ResolvedVersion::Latest(LatestStrategy::GroupMax) => {
            max_issue_per_key(layout, candidates, None)
        }
        ResolvedVersion::Latest(LatestStrategy::CurrentFlag) => {
            candidates.into_iter().filter(|c| c.is_current).collect()
        }
        ResolvedVersion::DiffChain(cutoff) => diff_chain::select(layout, candidates, *cutoff),
    }
}

/// Per dimension-key, the candidate with the largest issue `<= cutoff`.
fn max_issue_per_key<'a>(
    layout: &TableLayout,
    candidates: Vec<Candidate<'a>>,
    cutoff: Option<i64>,
) -> Vec<Candidate<'a>> {
    let mut winners: Vec<(i64, Candidate<'a>)> = Vec::new();
    let mut by_key: HashMap<DimensionKey, usize> = HashMap::new();

    for candidate in candidates {
        let issue = match layout.issue_of(candidate.row) {
            Some(i) => i,
            None => continue,
        };
        if cutoff.is_some_and(|c| issue > c) {
            continue;
        }
        let key = layout.dimension_key(candidate.row);
        match by_key.get(&key) {
            Some(&idx) => {
                let (best_issue, best) = &winners[idx];
                let better = issue > *best_issue || (issue == *best_issue && candidate.seq < best.seq);
                if better {
                    winners[idx] = (issue, candidate);
                }
            }
            None => {
                by_key.insert(key, winners.len());
                winners.push((issue, candidate));
            }
        }
    }

    winners.into_iter().map(|(_, c)| c).collect()
}

/// Whether `row` is the current (greatest-issue, lowest-sequence) row for
/// its dimension-key among `rows`. Used to maintain the current flag.
pub fn is_latest_among<'a, I>(layout: &TableLayout, seq: u64, row: &Row, rows: I) -> bool
where
    I: IntoIterator<Item = (u64, &'a Row)>,
{
    let key = layout.dimension_key(row);
    let issue = match layout.issue_of(row) {
        Some(i) => i,
        None => return false,
    };
    rows.into_iter().all(|(other_seq, other)| {
        if other_seq == seq || layout.dimension_key(other) != key {
            return true;
        }
        match layout.issue_of(other) {
            Some(other_issue) => {
                other_issue < issue || (other_issue == issue && other_seq > seq)
            }
            None => true,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::TimeUnit;
    use crate::filter::FilterSpec;
    use crate::stream::FieldType;
    use crate::version::VersionErrorCode;

    fn layout() -> TableLayout {
        TableLayout::new("fluview", "epiweek", TimeUnit::Week, "region")
            .issue("issue")
            .field("epiweek", FieldType::Int)
            .field("region", FieldType::Str)
            .field("issue", FieldType::Int)
            .field("wili", FieldType::Float)
    }

    fn row(epiweek: i64, issue: i64, wili: f64) -> Row {
        Row::new()
            .with("epiweek", epiweek)
            .with("region", "nat")
            .with("issue", issue)
            .with("wili", wili)
    }

    fn candidates(rows: &[Row]) -> Vec<Candidate<'_>> {
        rows.iter()
            .enumerate()
            .map(|(i, r)| Candidate {
                seq: i as u64,
                row: r,
                is_current: false,
            })
            .collect()
    }

    fn issues(selected: &[Candidate<'_>]) -> Vec<i64> {
        let mut out: Vec<i64> = selected
            .iter()
            .map(|c| c.row.get("issue").and_then(|v| v.as_i64()).unwrap())
            .collect();
        out.sort();
        out
    }

    #[test]
    fn test_latest_selects_max_issue() {
        let rows = vec![row(201440, 10, 1.0), row(201440, 12, 3.0), row(201440, 11, 2.0)];
        let l = layout();
        let v = VersionResolver::resolve(&l, &VersionSpec::Latest).unwrap();
        assert_eq!(v, ResolvedVersion::Latest(LatestStrategy::GroupMax));

        let selected = select_versions(&l, &v, candidates(&rows));
        assert_eq!(issues(&selected), vec![12]);
    }

    #[test]
    fn test_as_of_cutoff() {
        let rows = vec![row(201440, 10, 1.0), row(201440, 11, 2.0), row(201440, 12, 3.0)];
        let l = layout();

        let selected = select_versions(&l, &ResolvedVersion::AsOf(11), candidates(&rows));
        assert_eq!(issues(&selected), vec![11]);

        let selected = select_versions(&l, &ResolvedVersion::AsOf(9), candidates(&rows));
        assert!(selected.is_empty());
    }

    #[test]
    fn test_as_of_is_per_key() {
        let rows = vec![
            row(201440, 201441, 1.0),
            row(201440, 201443, 2.0),
            row(201441, 201442, 3.0),
            row(201441, 201445, 4.0),
        ];
        let selected = select_versions(&layout(), &ResolvedVersion::AsOf(201443), candidates(&rows));
        assert_eq!(issues(&selected), vec![201442, 201443]);
    }

    #[test]
    fn test_lag_uses_calendar_units() {
        let rows = vec![
            row(201440, 201443, 1.0),
            row(201440, 201444, 2.0),
            row(201450, 201501, 3.0),
        ];
        let l = layout();
        let selected = select_versions(&l, &ResolvedVersion::Lag(3), candidates(&rows));
        assert_eq!(issues(&selected), vec![201443]);

        let selected = select_versions(&l, &ResolvedVersion::Lag(4), candidates(&rows));
        assert_eq!(issues(&selected), vec![201444, 201501]);
    }

    #[test]
    fn test_explicit_issues_may_return_many_per_key() {
        let rows = vec![row(201440, 10, 1.0), row(201440, 11, 2.0), row(201440, 12, 3.0)];
        let l = layout();
        let v = VersionResolver::resolve(
            &l,
            &VersionSpec::Issues(FilterSpec::range(10, 11)),
        )
        .unwrap();
        assert!(v.is_multi_row());
        let selected = select_versions(&l, &v, candidates(&rows));
        assert_eq!(issues(&selected), vec![10, 11]);
    }

    #[test]
    fn test_duplicate_issue_tie_break_lowest_sequence() {
        let rows = vec![row(201440, 12, 1.0), row(201440, 12, 2.0)];
        let selected = select_versions(
            &layout(),
            &ResolvedVersion::Latest(LatestStrategy::GroupMax),
            candidates(&rows),
        );
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].seq, 0);
    }

    #[test]
    fn test_is_latest_among() {
        let rows = vec![row(201440, 10, 1.0), row(201440, 12, 2.0), row(201441, 11, 3.0)];
        let l = layout();
        let all: Vec<(u64, &Row)> = rows.iter().enumerate().map(|(i, r)| (i as u64, r)).collect();
        assert!(!is_latest_among(&l, 0, &rows[0], all.clone()));
        assert!(is_latest_among(&l, 1, &rows[1], all.clone()));
        assert!(is_latest_among(&l, 2, &rows[2], all));
    }

    #[test]
    fn test_negative_lag_rejected() {
        let err = VersionResolver::resolve(&layout(), &VersionSpec::Lag(-1)).unwrap_err();
        assert_eq!(err.code(), VersionErrorCode::EpiVersionInvalid);
    }

    #[test]
    fn test_invalid_as_of_rejected() {
        let err = VersionResolver::resolve(&layout(), &VersionSpec::AsOf(201460)).unwrap_err();
        assert_eq!(err.code(), VersionErrorCode::EpiVersionInvalid);
    }

    #[test]
    fn test_current_flag_requires_column() {
        let err = VersionResolver::resolve_with(
            &layout(),
            &VersionSpec::Latest,
            LatestStrategy::CurrentFlag,
        )
        .unwrap_err();
        assert_eq!(err.code(), VersionErrorCode::EpiVersionUnsupported);

        let flagged = layout().current_flag("is_latest_issue");
        assert_eq!(
            VersionResolver::resolve(&flagged, &VersionSpec::Latest).unwrap(),
            ResolvedVersion::Latest(LatestStrategy::CurrentFlag)
        );
    }

    #[test]
    fn test_unversioned_table_only_latest() {
        let l = TableLayout::new("sensors", "epiweek", TimeUnit::Week, "location");
        assert_eq!(
            VersionResolver::resolve(&l, &VersionSpec::Latest).unwrap(),
            ResolvedVersion::Unversioned
        );
        let err = VersionResolver::resolve(&l, &VersionSpec::Lag(1)).unwrap_err();
        assert_eq!(err.code(), VersionErrorCode::EpiVersionUnsupported);
    }

    #[test]
    fn test_empty_issue_list_surfaces_as_empty_match() {
        let err = VersionResolver::resolve(
            &layout(),
            &VersionSpec::Issues(FilterSpec::Alternatives(vec![])),
        )
        .unwrap_err();
        assert!(err.is_empty_match());
    }
}
