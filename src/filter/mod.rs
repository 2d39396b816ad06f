//! Filter compiler
//!
//! Turns request-supplied value/range specifications into predicates over
//! named fields.
//!
//! # Rules
//!
//! - A filter is a disjunction of scalars and closed ranges
//! - Filters on different fields combine by conjunction
//! - Ranges only on ordered kinds; `lo > hi` fails the whole filter
//! - `lo == hi` collapses to equality
//! - An empty list is an error surfaced as "no data", never "match all"
//! - The wildcard `*` is an always-true predicate
//! - Values are bound parameters, never query text

mod errors;
mod grammar;
mod predicate;
mod spec;

pub use errors::{FilterError, FilterErrorCode, FilterResult, Severity};
pub use grammar::{parse_integer, parse_list, parse_time_list, parse_time_value};
pub use predicate::{is_identifier, quote_column, Condition, FilterCompiler, Predicate, PredicateSet};
pub use spec::{Alternative, FieldKind, FilterSpec, Scalar};
