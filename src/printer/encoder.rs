//! Encoder capability shared by every output variant

use std::io::Write;

use crate::stream::Row;

use super::errors::PrinterResult;
use super::session::ResultCode;

/// One wire encoding. The printer owns lifecycle and budget; an encoder
/// only turns begin/row/end events into bytes.
pub trait Encoder: Send {
    fn begin(&mut self, out: &mut dyn Write) -> PrinterResult<()>;

    /// Called once per emitted row, never past the cap.
    fn row(&mut self, out: &mut dyn Write, row: Row) -> PrinterResult<()>;

    fn end(&mut self, out: &mut dyn Write, code: ResultCode) -> PrinterResult<()>;
}

/// Writes `,"result":<code>,"message":<text>}` closing a classic envelope.
pub(crate) fn write_envelope_tail(out: &mut dyn Write, code: ResultCode) -> PrinterResult<()> {
    write!(out, ",\"result\":{},\"message\":", code.code())?;
    serde_json::to_writer(&mut *out, code.message())?;
    out.write_all(b"}")?;
    Ok(())
}
