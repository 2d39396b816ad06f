//! In-process revisioned store
//!
//! Append-only tables with the same contract a relational backend offers:
//! - `(dimension-key, revision)` is unique unless duplicates are allowed
//! - the current flag is recomputed on every insert, under the table lock,
//!   so exactly one row per dimension-key is current at all times
//! - reads filter, resolve versions, sort and cap in one pass

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, RwLock};

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::filter::Scalar;
use crate::version::{is_latest_among, select_versions, Candidate};

use super::errors::{StreamError, StreamResult};
use super::layout::{DimensionKey, FieldDef, TableLayout};
use super::row::{FieldValue, Row};
use super::sorter::RowSorter;
use super::store::{RowCursor, SubQuery, TableStore};

#[derive(Debug, Clone)]
struct StoredRow {
    seq: u64,
    row: Row,
    is_current: bool,
}

/// One append-only table
#[derive(Debug)]
pub struct MemoryTable {
    layout: Arc<TableLayout>,
    rows: Vec<StoredRow>,
    /// Positions in `rows` per dimension-key
    by_key: HashMap<DimensionKey, Vec<usize>>,
    next_seq: u64,
    allow_duplicates: bool,
}

impl MemoryTable {
    pub fn new(layout: Arc<TableLayout>) -> Self {
        Self {
            layout,
            rows: Vec::new(),
            by_key: HashMap::new(),
            next_seq: 0,
            allow_duplicates: false,
        }
    }

    /// Accepts duplicate `(dimension-key, revision)` rows; reads then
    /// resolve them to the earliest inserted.
    pub fn allow_duplicates(mut self, allow: bool) -> Self {
        self.allow_duplicates = allow;
        self
    }

    pub fn layout(&self) -> &Arc<TableLayout> {
        &self.layout
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Appends a row and returns its insertion sequence.
    ///
    /// Only rows sharing the new row's dimension-key are examined.
    pub fn insert(&mut self, mut row: Row) -> StreamResult<u64> {
        self.fill_lag(&mut row);
        let key = self.layout.dimension_key(&row);
        let siblings = self.by_key.get(&key).map(Vec::as_slice).unwrap_or(&[]);

        if !self.allow_duplicates {
            let identity = self.identity(&row);
            if siblings.iter().any(|&i| self.identity(&self.rows[i].row) == identity) {
                return Err(StreamError::duplicate(self.layout.name(), &identity));
            }
        }

        let seq = self.next_seq;
        let mut is_current = false;
        if let Some(flag) = self.layout.current_flag_field() {
            is_current = is_latest_among(
                &self.layout,
                seq,
                &row,
                siblings.iter().map(|&i| (self.rows[i].seq, &self.rows[i].row)),
            );
            if is_current {
                for &i in siblings {
                    let stored = &mut self.rows[i];
                    if stored.is_current {
                        stored.is_current = false;
                        stored.row.push(flag, 0);
                    }
                }
            }
            row.push(flag, i64::from(is_current));
        }

        self.by_key.entry(key).or_default().push(self.rows.len());
        self.rows.push(StoredRow {
            seq,
            row,
            is_current,
        });
        self.next_seq += 1;
        Ok(seq)
    }

    /// Number of rows flagged current for `key`.
    pub fn current_count(&self, key: &DimensionKey) -> usize {
        self.by_key
            .get(key)
            .map(|positions| positions.iter().filter(|&&i| self.rows[i].is_current).count())
            .unwrap_or(0)
    }

    /// Derives a missing stored lag from issue and time value.
    fn fill_lag(&self, row: &mut Row) {
        let Some(lag_field) = self.layout.lag_field() else {
            return;
        };
        if row.get(lag_field).is_some() {
            return;
        }
        let time = row.get(self.layout.time_field()).and_then(FieldValue::as_i64);
        if let (Some(issue), Some(time)) = (self.layout.issue_of(row), time) {
            if let Some(lag) = self.layout.time_unit().lag(issue, time) {
                row.push(lag_field, lag);
            }
        }
    }

    /// Dimension-key plus the revision marker of the table.
    fn identity(&self, row: &Row) -> DimensionKey {
        let mut identity = self.layout.dimension_key(row);
        if let Some(chain) = self.layout.chain_columns() {
            identity.push(scalar_of(row.get(&chain.release_field)));
            identity.push(scalar_of(row.get(&chain.parse_order_field)));
        } else if let Some(issue) = self.layout.issue_field() {
            identity.push(scalar_of(row.get(issue)));
        }
        identity
    }

    fn query(&self, query: &SubQuery, limit: usize) -> Vec<Row> {
        let candidates: Vec<Candidate<'_>> = self
            .rows
            .iter()
            .filter(|r| query.predicates.matches(&r.row))
            .map(|r| Candidate {
                seq: r.seq,
                row: &r.row,
                is_current: r.is_current,
            })
            .collect();

        let mut selected = select_versions(&query.layout, &query.version, candidates);
        RowSorter::sort(&query.layout, &mut selected, query.version.is_multi_row());
        selected
            .into_iter()
            .take(limit)
            .map(|c| project(c.row, &query.projection))
            .collect()
    }
}

fn scalar_of(value: Option<&FieldValue>) -> Option<Scalar> {
    match value? {
        FieldValue::Int(i) => Some(Scalar::Int(*i)),
        FieldValue::Str(s) => Some(Scalar::Str(s.clone())),
        FieldValue::Float(f) => Some(Scalar::Str(f.to_string())),
        FieldValue::Null => None,
    }
}

fn project(row: &Row, projection: &[FieldDef]) -> Row {
    projection
        .iter()
        .filter_map(|f| row.get(&f.name).map(|v| (f.name.clone(), v.clone())))
        .collect()
}

/// Fixture file: one table's rows, or a list of them.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Fixture {
    One(FixtureTable),
    Many(Vec<FixtureTable>),
}

#[derive(Debug, Deserialize)]
struct FixtureTable {
    table: String,
    rows: Vec<Value>,
}

/// Thread-safe set of named tables
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, MemoryTable>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an empty table for `layout`, replacing nothing.
    pub fn create_table(&self, layout: Arc<TableLayout>) -> StreamResult<()> {
        self.add_table(MemoryTable::new(layout))
    }

    pub fn add_table(&self, table: MemoryTable) -> StreamResult<()> {
        let mut tables = self.write()?;
        let name = table.layout().name().to_string();
        if tables.contains_key(&name) {
            return Err(StreamError::store_failed(format!(
                "table '{}' already exists",
                name
            )));
        }
        tables.insert(name, table);
        Ok(())
    }

    pub fn insert(&self, table: &str, row: Row) -> StreamResult<u64> {
        let mut tables = self.write()?;
        tables
            .get_mut(table)
            .ok_or_else(|| StreamError::unknown_table(table))?
            .insert(row)
    }

    /// Inserts every row, stopping at the first failure.
    pub fn insert_all<I>(&self, table: &str, rows: I) -> StreamResult<usize>
    where
        I: IntoIterator<Item = Row>,
    {
        let mut tables = self.write()?;
        let target = tables
            .get_mut(table)
            .ok_or_else(|| StreamError::unknown_table(table))?;
        let mut count = 0;
        for row in rows {
            target.insert(row)?;
            count += 1;
        }
        Ok(count)
    }

    pub fn row_count(&self, table: &str) -> StreamResult<usize> {
        let tables = self.read()?;
        tables
            .get(table)
            .map(MemoryTable::len)
            .ok_or_else(|| StreamError::unknown_table(table))
    }

    /// Loads rows from a JSON fixture into already registered tables.
    pub fn load_fixture(&self, path: &Path) -> StreamResult<usize> {
        let text = fs::read_to_string(path).map_err(|e| {
            StreamError::store_failed(format!("cannot read fixture {}: {}", path.display(), e))
        })?;
        let fixture: Fixture = serde_json::from_str(&text).map_err(|e| {
            StreamError::store_failed(format!("invalid fixture {}: {}", path.display(), e))
        })?;
        let tables = match fixture {
            Fixture::One(t) => vec![t],
            Fixture::Many(ts) => ts,
        };

        let mut total = 0;
        for table in tables {
            let rows = table
                .rows
                .iter()
                .map(|v| {
                    Row::from_json(v).ok_or_else(|| {
                        StreamError::store_failed(format!(
                            "fixture row for '{}' is not a flat object",
                            table.table
                        ))
                    })
                })
                .collect::<StreamResult<Vec<Row>>>()?;
            let n = self.insert_all(&table.table, rows)?;
            debug!(table = %table.table, rows = n, "fixture table loaded");
            total += n;
        }
        info!(path = %path.display(), rows = total, "fixture loaded");
        Ok(total)
    }

    fn read(&self) -> StreamResult<std::sync::RwLockReadGuard<'_, HashMap<String, MemoryTable>>> {
        self.tables
            .read()
            .map_err(|_| StreamError::store_failed("memory store lock poisoned"))
    }

    fn write(
        &self,
    ) -> StreamResult<std::sync::RwLockWriteGuard<'_, HashMap<String, MemoryTable>>> {
        self.tables
            .write()
            .map_err(|_| StreamError::store_failed("memory store lock poisoned"))
    }
}

impl TableStore for MemoryStore {
    fn execute(&self, query: &SubQuery, limit: usize) -> StreamResult<RowCursor<'_>> {
        let tables = self.read()?;
        let table = tables
            .get(query.layout.name())
            .ok_or_else(|| StreamError::unknown_table(query.layout.name()))?;
        let rows = table.query(query, limit);
        Ok(Box::new(rows.into_iter().map(Ok)))
    }
}
