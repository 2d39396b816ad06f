//! Classic envelope: `{"epidata": [rows], "result": n, "message": "..."}`

use std::io::Write;

use crate::stream::Row;

use super::encoder::{write_envelope_tail, Encoder};
use super::errors::PrinterResult;
use super::session::ResultCode;

#[derive(Debug, Default)]
pub struct ClassicEncoder {
    rows: usize,
}

impl ClassicEncoder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Encoder for ClassicEncoder {
    fn begin(&mut self, out: &mut dyn Write) -> PrinterResult<()> {
        out.write_all(b"{\"epidata\":[")?;
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

    fn end(&mut self, out: &mut dyn Write, code: ResultCode) -> PrinterResult<()> {
        out.write_all(b"]")?;
        write_envelope_tail(out, code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope() {
        let mut enc = ClassicEncoder::new();
        let mut out = Vec::new();
        enc.begin(&mut out).unwrap();
        enc.row(&mut out, Row::new().with("a", 1)).unwrap();
        enc.row(&mut out, Row::new().with("a", 2)).unwrap();
        enc.end(&mut out, ResultCode::Success).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            r#"{"epidata":[{"a":1},{"a":2}],"result":1,"message":"success"}"#
        );
    }
}
