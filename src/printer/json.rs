//! Envelope-free encodings: a bare JSON array, and NDJSON

use std::io::Write;

use crate::stream::Row;

use super::encoder::Encoder;
use super::errors::PrinterResult;
use super::session::ResultCode;

/// `[row, row, ...]`
#[derive(Debug, Default)]
pub struct JsonEncoder {
    rows: usize,
}

impl JsonEncoder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Encoder for JsonEncoder {
    fn begin(&mut self, out: &mut dyn Write) -> PrinterResult<()> {
        out.write_all(b"[")?;
        Ok(())
    }

    fn row(&mut self, out: &mut dyn Write, row: Row) -> PrinterResult<()> {
        if self.rows > 0 {
            out.write_all(b",")?;
        }
        serde_json::to_writer(&mut *out, &row)?;
        self.rows += 1;
        Ok(())
    }

    fn end(&mut self, out: &mut dyn Write, _code: ResultCode) -> PrinterResult<()> {
        out.write_all(b"]")?;
        Ok(())
    }
}

/// One object per line
#[derive(Debug, Default)]
pub struct NdjsonEncoder;

impl Encoder for NdjsonEncoder {
    fn begin(&mut self, _out: &mut dyn Write) -> PrinterResult<()> {
        Ok(())
    }

    fn row(&mut self, out: &mut dyn Write, row: Row) -> PrinterResult<()> {
        serde_json::to_writer(&mut *out, &row)?;
        out.write_all(b"\n")?;
        Ok(())
    }

    fn end(&mut self, out: &mut dyn Write, _code: ResultCode) -> PrinterResult<()> {
        out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_array() {
        let mut enc = JsonEncoder::new();
        let mut out = Vec::new();
        enc.begin(&mut out).unwrap();
        enc.row(&mut out, Row::new().with("a", 1)).unwrap();
        enc.row(&mut out, Row::new().with("a", f64::NAN)).unwrap();
        enc.end(&mut out, ResultCode::Success).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), r#"[{"a":1},{"a":null}]"#);
    }

    #[test]
    fn test_ndjson_lines() {
        let mut enc = NdjsonEncoder;
        let mut out = Vec::new();
        enc.begin(&mut out).unwrap();
        enc.row(&mut out, Row::new().with("a", 1)).unwrap();
        enc.row(&mut out, Row::new().with("a", "x")).unwrap();
        enc.end(&mut out, ResultCode::Success).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "{\"a\":1}\n{\"a\":\"x\"}\n");
    }
}
