//! Version resolver
//!
//! Chooses which revision (issue) of each dimension-key a query returns.
//! Exactly one mode applies per query:
//!
//! - `issues`: rows whose issue matches a filter, possibly several per key
//! - `lag`: rows published exactly `lag` time units after their time value
//! - `as_of`: per key, the greatest issue at or before a cutoff
//! - latest (default): per key, the greatest issue
//!
//! Correction-chain tables resolve `as_of` and latest through the chain
//! rules in `diff_chain`. Tables without revisions accept only the
//! default mode.
//!
//! The resolved shape is executed either in memory ([`select_versions`])
//! or rendered to parameterised SQL ([`render_sql`]).

mod diff_chain;
mod errors;
mod resolver;
mod shape;
mod spec;

pub use errors::{VersionError, VersionErrorCode, VersionResult};
pub use resolver::{
    is_latest_among, select_versions, Candidate, LatestStrategy, ResolvedVersion, VersionResolver,
};
pub use shape::{render_sql, SqlQuery};
pub use spec::{VersionRequest, VersionSpec};
