//! Row stream
//!
//! Typed rows, table layouts, the storage contract and the executor that
//! feeds a printer.
//!
//! # Contract
//!
//! - Rows arrive ordered by time value, geography, then issue
//! - The store is asked for `N + 1` rows to detect overrun in one query
//! - Only fields of the layout's typed list are ever emitted
//! - The cap is global to the response, not per sub-query

mod errors;
mod executor;
mod layout;
mod memory;
mod row;
mod sorter;
mod store;

pub use errors::{Severity, StreamError, StreamErrorCode, StreamResult};
pub use executor::{ExecutionSummary, QueryExecutor};
pub use layout::{ChainColumns, DimensionKey, FieldDef, FieldType, TableLayout};
pub use memory::{MemoryStore, MemoryTable};
pub use row::{FieldValue, Row};
pub use sorter::RowSorter;
pub use store::{RowCursor, SubQuery, TableStore};
