//! CSV output
//!
//! The header is the key set of the first emitted row, written once. Later
//! rows are written against that header; a key the row lacks is an empty
//! cell. Zero rows produce an empty body.

use std::io::Write;

use crate::stream::Row;

use super::encoder::Encoder;
use super::errors::PrinterResult;
use super::session::ResultCode;

#[derive(Debug, Default)]
pub struct CsvEncoder {
    header: Option<Vec<String>>,
}

impl CsvEncoder {
    pub fn new() -> Self {
        Self::default()
    }
}

fn escape(cell: &str) -> String {
    if cell.contains(',') || cell.contains('"') || cell.contains('\n') || cell.contains('\r') {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

impl Encoder for CsvEncoder {
    fn begin(&mut self, _out: &mut dyn Write) -> PrinterResult<()> {
        Ok(())
    }

    fn row(&mut self, out: &mut dyn Write, row: Row) -> PrinterResult<()> {
        if self.header.is_none() {
            let keys: Vec<String> = row.keys().map(str::to_string).collect();
            let line: Vec<String> = keys.iter().map(|k| escape(k)).collect();
            writeln!(out, "{}", line.join(","))?;
            self.header = Some(keys);
        }
        let header: &[String] = self.header.as_deref().unwrap_or(&[]);

        let cells: Vec<String> = header
            .iter()
            .map(|k| row.get(k).map(|v| escape(&v.to_cell())).unwrap_or_default())
            .collect();
        writeln!(out, "{}", cells.join(","))?;
        Ok(())
    }

    fn end(&mut self, out: &mut dyn Write, _code: ResultCode) -> PrinterResult<()> {
        out.flush()?;
        Ok(())
    }
}
