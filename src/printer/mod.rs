//! Result printer
//!
//! Consumes the row stream of one response and writes it in the requested
//! encoding while tracking the global row cap.
//!
//! # Result codes
//!
//! | code | meaning                                   |
//! |------|-------------------------------------------|
//! | `1`  | at least one row, not truncated           |
//! | `2`  | stopped at the cap                        |
//! | `-2` | nothing matched                           |
//! | `-1` | request rejected before any row           |
//!
//! Classic and tree carry the code in-band. CSV, JSON and NDJSON do not;
//! callers that need it read the value returned by
//! [`ResultPrinter::end`].

mod classic;
mod csv;
mod encoder;
mod errors;
mod format;
mod json;
mod result_printer;
mod session;
mod tree;

pub use classic::ClassicEncoder;
pub use csv::CsvEncoder;
pub use encoder::Encoder;
pub use errors::{PrinterError, PrinterResult};
pub use format::OutputFormat;
pub use json::{JsonEncoder, NdjsonEncoder};
pub use result_printer::ResultPrinter;
pub use session::{PrinterSession, ResultCode, RowOutcome, SessionState};
pub use tree::TreeEncoder;
