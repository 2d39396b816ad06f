//! Query executor for epiquery
//!
//! Drives the sub-queries of one response into one printer.
//!
//! Execution flow, per sub-query in invocation order:
//! 1. Stop if the response is already truncated
//! 2. Ask the store for `remaining_budget + 1` rows
//! 3. Coerce each row to its declared types
//! 4. Offer it to the printer; stop the sub-query once a row is refused
//!
//! The first storage failure aborts the whole response. Ending the printer
//! is left to the caller, after the last sub-query.

use std::io::Write;

use tracing::{debug, warn};

use crate::printer::{ResultPrinter, RowOutcome};

use super::errors::StreamResult;
use super::store::{SubQuery, TableStore};

/// Counters for one execution
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionSummary {
    /// Sub-queries dispatched to the store
    pub dispatched: usize,
    /// Rows the store produced, including the overrun probe
    pub fetched: usize,
    pub emitted: usize,
    pub truncated: bool,
}

/// Executes sub-queries against a store
pub struct QueryExecutor<'a, S: TableStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: TableStore + ?Sized> QueryExecutor<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub fn execute<W: Write>(
        &self,
        queries: &[SubQuery],
        printer: &mut ResultPrinter<W>,
    ) -> StreamResult<ExecutionSummary> {
        let mut summary = ExecutionSummary::default();

        for query in queries {
            if printer.is_truncated() {
                break;
            }
            let limit = printer.remaining_budget().saturating_add(1);
            debug!(
                table = query.layout.name(),
                sub_query = %query.label,
                version = %query.version.describe(),
                limit,
                "dispatching sub-query"
            );

            let cursor = self.store.execute(query, limit).map_err(|e| {
                warn!(sub_query = %query.label, error = %e, "sub-query failed");
                e
            })?;
            summary.dispatched += 1;

            for raw in cursor {
                let raw = raw.map_err(|e| {
                    warn!(sub_query = %query.label, error = %e, "row fetch failed");
                    e
                })?;
                summary.fetched += 1;
                let row = query.layout.coerce(&raw, &query.projection)?;
                match printer.print_row(row)? {
                    RowOutcome::Emitted => summary.emitted += 1,
                    RowOutcome::Truncated | RowOutcome::Dropped => break,
                }
            }
        }

        summary.truncated = printer.is_truncated();
        if summary.truncated {
            debug!(emitted = summary.emitted, "response truncated");
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::calendar::TimeUnit;
    use crate::filter::{Predicate, PredicateSet};
    use crate::printer::{OutputFormat, ResultCode};
    use crate::stream::{
        FieldType, MemoryStore, Row, RowCursor, StreamError, StreamErrorCode, TableLayout,
    };
    use crate::version::ResolvedVersion;

    fn layout() -> Arc<TableLayout> {
        Arc::new(
            TableLayout::new("flu", "epiweek", TimeUnit::Week, "region")
                .issue("issue")
                .field("epiweek", FieldType::Int)
                .field("region", FieldType::Str)
                .field("issue", FieldType::Int),
        )
    }

    fn store(regions: &[&str], weeks: i64) -> MemoryStore {
        let store = MemoryStore::new();
        store.create_table(layout()).unwrap();
        for region in regions {
            for week in 0..weeks {
                store
                    .insert(
                        "flu",
                        Row::new()
                            .with("epiweek", 201440 + week)
                            .with("region", *region)
                            .with("issue", 201450),
                    )
                    .unwrap();
            }
        }
        store
    }

    fn region_query(region: &str) -> SubQuery {
        let l = layout();
        let projection = l.fields().to_vec();
        SubQuery::new(
            l,
            PredicateSet::new().with(Predicate::eq("region", region)),
            ResolvedVersion::AsOf(201450),
            projection,
        )
        .with_label(region)
    }

    fn printer(cap: usize) -> ResultPrinter<Vec<u8>> {
        ResultPrinter::new(OutputFormat::Classic, None, cap, Vec::new()).unwrap()
    }

    #[test]
    fn test_cap_is_global_across_sub_queries() {
        let store = store(&["nat", "hhs1"], 3);
        let mut p = printer(4);
        let summary = QueryExecutor::new(&store)
            .execute(&[region_query("nat"), region_query("hhs1")], &mut p)
            .unwrap();

        assert_eq!(summary.emitted, 4);
        assert!(summary.truncated);
        // 3 from the first, then 1 row plus the overrun probe
        assert_eq!(summary.fetched, 5);
        assert_eq!(p.end().unwrap(), ResultCode::Truncated);
    }

    #[test]
    fn test_exact_fit_is_not_truncated() {
        let store = store(&["nat", "hhs1"], 2);
        let mut p = printer(4);
        let summary = QueryExecutor::new(&store)
            .execute(&[region_query("nat"), region_query("hhs1")], &mut p)
            .unwrap();
        assert_eq!(summary.emitted, 4);
        assert!(!summary.truncated);
        assert_eq!(p.end().unwrap(), ResultCode::Success);
    }

    #[test]
    fn test_sub_query_order_preserved() {
        let store = store(&["nat", "hhs1"], 1);
        let mut p = printer(10);
        QueryExecutor::new(&store)
            .execute(&[region_query("nat"), region_query("hhs1")], &mut p)
            .unwrap();
        p.end().unwrap();
        let body: serde_json::Value = serde_json::from_slice(&p.into_inner()).unwrap();
        assert_eq!(body["epidata"][0]["region"], "nat");
        assert_eq!(body["epidata"][1]["region"], "hhs1");
    }

    /// Records the limit of every request and returns no rows.
    struct LimitRecorder(std::sync::Mutex<Vec<usize>>);

    impl TableStore for LimitRecorder {
        fn execute(&self, _query: &SubQuery, limit: usize) -> StreamResult<RowCursor<'_>> {
            self.0.lock().unwrap().push(limit);
            Ok(Box::new(std::iter::empty()))
        }
    }

    #[test]
    fn test_unbounded_cap_does_not_overflow() {
        let store = LimitRecorder(std::sync::Mutex::new(Vec::new()));
        let mut p = printer(usize::MAX);
        QueryExecutor::new(&store)
            .execute(&[region_query("nat"), region_query("hhs1")], &mut p)
            .unwrap();
        assert_eq!(*store.0.lock().unwrap(), vec![usize::MAX, usize::MAX]);
        assert_eq!(p.end().unwrap(), ResultCode::NoResults);
    }

    struct FailingStore;

    impl TableStore for FailingStore {
        fn execute(&self, _query: &SubQuery, _limit: usize) -> StreamResult<RowCursor<'_>> {
            Err(StreamError::store_failed("connection reset"))
        }
    }

    #[test]
    fn test_storage_failure_aborts() {
        let mut p = printer(10);
        let err = QueryExecutor::new(&FailingStore)
            .execute(&[region_query("nat")], &mut p)
            .unwrap_err();
        assert_eq!(err.code(), StreamErrorCode::EpiStoreFailed);
    }

    #[test]
    fn test_failure_mid_stream_aborts() {
        struct BrokenCursor;
        impl TableStore for BrokenCursor {
            fn execute(&self, _query: &SubQuery, _limit: usize) -> StreamResult<RowCursor<'_>> {
                let rows = vec![
                    Ok(Row::new().with("epiweek", 201440).with("region", "nat")),
                    Err(StreamError::store_failed("lost connection")),
                ];
                Ok(Box::new(rows.into_iter()))
            }
        }

        let mut p = printer(10);
        assert!(QueryExecutor::new(&BrokenCursor)
            .execute(&[region_query("nat")], &mut p)
            .is_err());
    }

    #[test]
    fn test_undeclared_field_rejected() {
        struct LeakyStore;
        impl TableStore for LeakyStore {
            fn execute(&self, _query: &SubQuery, _limit: usize) -> StreamResult<RowCursor<'_>> {
                let row = Row::new().with("epiweek", 201440).with("password", "x");
                Ok(Box::new(std::iter::once(Ok(row))))
            }
        }

        let mut p = printer(10);
        let err = QueryExecutor::new(&LeakyStore)
            .execute(&[region_query("nat")], &mut p)
            .unwrap_err();
        assert_eq!(err.code(), StreamErrorCode::EpiStreamUndeclaredField);
    }
}
