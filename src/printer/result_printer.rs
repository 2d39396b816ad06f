//! The result printer: session lifecycle over a chosen encoder

use std::io::Write;

use tracing::debug;

use crate::stream::Row;

use super::classic::ClassicEncoder;
use super::csv::CsvEncoder;
use super::encoder::Encoder;
use super::errors::{PrinterError, PrinterResult};
use super::format::OutputFormat;
use super::json::{JsonEncoder, NdjsonEncoder};
use super::session::{PrinterSession, ResultCode, RowOutcome, SessionState};
use super::tree::TreeEncoder;

/// Streams rows into one response.
///
/// Exactly one printer exists per response, however many sub-queries feed
/// it. `begin` is idempotent and runs lazily on the first row; `end` runs
/// once, after the last sub-query.
pub struct ResultPrinter<W: Write> {
    out: W,
    format: OutputFormat,
    encoder: Box<dyn Encoder>,
    session: PrinterSession,
}

impl<W: Write> ResultPrinter<W> {
    /// `group_by` is required for [`OutputFormat::Tree`] and ignored
    /// otherwise.
    pub fn new(
        format: OutputFormat,
        group_by: Option<&str>,
        cap: usize,
        out: W,
    ) -> PrinterResult<Self> {
        let encoder: Box<dyn Encoder> = match format {
            OutputFormat::Classic => Box::new(ClassicEncoder::new()),
            OutputFormat::Tree => {
                Box::new(TreeEncoder::new(group_by.ok_or(PrinterError::MissingGroupField)?))
            }
            OutputFormat::Csv => Box::new(CsvEncoder::new()),
            OutputFormat::Json => Box::new(JsonEncoder::new()),
            OutputFormat::Jsonl => Box::new(NdjsonEncoder),
        };
        Ok(Self {
            out,
            format,
            encoder,
            session: PrinterSession::new(cap),
        })
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn session(&self) -> &PrinterSession {
        &self.session
    }

    pub fn remaining_budget(&self) -> usize {
        self.session.remaining_budget()
    }

    pub fn is_truncated(&self) -> bool {
        self.session.is_truncated()
    }

    /// Opens the encoding. Only the first call writes anything.
    pub fn begin(&mut self) -> PrinterResult<()> {
        match self.session.state() {
            SessionState::Finished => Err(PrinterError::Finished),
            SessionState::Streaming => Ok(()),
            SessionState::Unstarted => {
                self.encoder.begin(&mut self.out)?;
                self.session.start();
                Ok(())
            }
        }
    }

    /// Offers a row. Past the cap the row is dropped and the first drop
    /// marks the session truncated.
    pub fn print_row(&mut self, row: Row) -> PrinterResult<RowOutcome> {
        self.begin()?;
        let outcome = self.session.admit();
        match outcome {
            RowOutcome::Emitted => self.encoder.row(&mut self.out, row)?,
            RowOutcome::Truncated => debug!(cap = self.session.cap(), "row cap reached"),
            RowOutcome::Dropped => {}
        }
        Ok(outcome)
    }

    /// Closes the encoding and returns the final code. A second call fails.
    pub fn end(&mut self) -> PrinterResult<ResultCode> {
        self.begin()?;
        let code = self.session.result_code();
        self.encoder.end(&mut self.out, code)?;
        self.out.flush()?;
        Ok(self.session.finish())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classic(cap: usize) -> ResultPrinter<Vec<u8>> {
        ResultPrinter::new(OutputFormat::Classic, None, cap, Vec::new()).unwrap()
    }

    fn text(p: ResultPrinter<Vec<u8>>) -> String {
        String::from_utf8(p.into_inner()).unwrap()
    }

    #[test]
    fn test_begin_idempotent() {
        let mut once = classic(5);
        once.begin().unwrap();
        once.end().unwrap();

        let mut twice = classic(5);
        twice.begin().unwrap();
        twice.begin().unwrap();
        twice.end().unwrap();

        assert_eq!(text(once), text(twice));
    }

    #[test]
    fn test_zero_rows_is_no_results() {
        let mut p = classic(5);
        assert_eq!(p.end().unwrap(), ResultCode::NoResults);
        assert_eq!(
            text(p),
            r#"{"epidata":[],"result":-2,"message":"no results"}"#
        );
    }

    #[test]
    fn test_truncation_at_cap() {
        let mut p = classic(2);
        assert_eq!(p.print_row(Row::new().with("a", 1)).unwrap(), RowOutcome::Emitted);
        assert_eq!(p.print_row(Row::new().with("a", 2)).unwrap(), RowOutcome::Emitted);
        assert_eq!(p.remaining_budget(), 0);
        assert_eq!(p.print_row(Row::new().with("a", 3)).unwrap(), RowOutcome::Truncated);
        assert_eq!(p.print_row(Row::new().with("a", 4)).unwrap(), RowOutcome::Dropped);
        assert_eq!(p.end().unwrap(), ResultCode::Truncated);
        assert_eq!(
            text(p),
            r#"{"epidata":[{"a":1},{"a":2}],"result":2,"message":"too many results, data truncated"}"#
        );
    }

    #[test]
    fn test_end_exactly_once() {
        let mut p = classic(1);
        p.end().unwrap();
        assert!(matches!(p.end(), Err(PrinterError::Finished)));
        assert!(matches!(
            p.print_row(Row::new().with("a", 1)),
            Err(PrinterError::Finished)
        ));
    }

    #[test]
    fn test_tree_requires_group_field() {
        assert!(matches!(
            ResultPrinter::new(OutputFormat::Tree, None, 1, Vec::new()),
            Err(PrinterError::MissingGroupField)
        ));
    }
}
