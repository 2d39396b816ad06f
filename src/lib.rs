//! epiquery - revision-aware, point-in-time queries over epidemiological
//! observation tables
//!
//! A request names a source, filters over its dimensions and at most one
//! revision selector. The filters compile to predicates, the selector
//! resolves to a query shape, the store yields rows in a fixed order, and
//! one printer streams them in the requested format under a global row cap.
//!
//! ```text
//! params -> filter -> version -> stream (store + executor) -> printer
//!                     \______ datasets plan sub-queries ____/
//! ```

pub mod api;
pub mod auth;
pub mod calendar;
pub mod cli;
pub mod datasets;
pub mod filter;
pub mod http_server;
pub mod observability;
pub mod printer;
pub mod stream;
pub mod version;
