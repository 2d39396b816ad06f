//! Storage collaborator contract

use std::sync::Arc;

use crate::filter::PredicateSet;
use crate::version::{render_sql, ResolvedVersion, SqlQuery, VersionResult};

use super::errors::StreamResult;
use super::layout::{FieldDef, TableLayout};
use super::row::Row;

/// One query against one table, feeding a shared response.
#[derive(Debug, Clone)]
pub struct SubQuery {
    pub layout: Arc<TableLayout>,
    pub predicates: PredicateSet,
    pub version: ResolvedVersion,
    /// Fields to emit, canonical order
    pub projection: Vec<FieldDef>,
    /// Human-readable tag for logs (e.g. the region class)
    pub label: String,
}

impl SubQuery {
    pub fn new(
        layout: Arc<TableLayout>,
        predicates: PredicateSet,
        version: ResolvedVersion,
        projection: Vec<FieldDef>,
    ) -> Self {
        let label = layout.name().to_string();
        Self {
            layout,
            predicates,
            version,
            projection,
            label,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Parameterised statement for a relational backend.
    pub fn to_sql(&self, limit: usize) -> VersionResult<SqlQuery> {
        render_sql(
            &self.layout,
            &self.predicates,
            &self.version,
            &self.projection,
            limit,
        )
    }
}

/// Lazily produced raw rows
pub type RowCursor<'a> = Box<dyn Iterator<Item = StreamResult<Row>> + 'a>;

/// A store that executes resolved sub-queries.
///
/// Implementations return at most `limit` rows, projected onto
/// `query.projection`, ordered by time value, then geography, then issue
/// for multi-row modes.
pub trait TableStore: Send + Sync {
    fn execute(&self, query: &SubQuery, limit: usize) -> StreamResult<RowCursor<'_>>;
}
