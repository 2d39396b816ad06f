//! Tree output: rows grouped by one field inside the classic envelope
//!
//! `{"epidata": {"<group>": [rows without the group field]}, ...}`.
//! Groups appear in first-seen order. A row without the grouping field, or
//! with a null there, lands under the `""` key.

use std::collections::HashMap;
use std::io::Write;

use crate::stream::{FieldValue, Row};

use super::encoder::{write_envelope_tail, Encoder};
use super::errors::PrinterResult;
use super::session::ResultCode;

#[derive(Debug)]
pub struct TreeEncoder {
    group_by: String,
    groups: Vec<(String, Vec<Row>)>,
    index: HashMap<String, usize>,
}

impl TreeEncoder {
    pub fn new(group_by: impl Into<String>) -> Self {
        Self {
            group_by: group_by.into(),
            groups: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl Encoder for TreeEncoder {
    fn begin(&mut self, _out: &mut dyn Write) -> PrinterResult<()> {
        Ok(())
    }

    fn row(&mut self, _out: &mut dyn Write, mut row: Row) -> PrinterResult<()> {
        let key = match row.take(&self.group_by) {
            None | Some(FieldValue::Null) => String::new(),
            Some(value) => value.to_string(),
        };
        let idx = match self.index.get(&key) {
            Some(&idx) => idx,
            None => {
                self.groups.push((key.clone(), Vec::new()));
                self.index.insert(key, self.groups.len() - 1);
                self.groups.len() - 1
            }
        };
        self.groups[idx].1.push(row);
        Ok(())
    }

    fn end(&mut self, out: &mut dyn Write, code: ResultCode) -> PrinterResult<()> {
        out.write_all(b"{\"epidata\":{")?;
        for (i, (key, rows)) in self.groups.iter().enumerate() {
            if i > 0 {
                out.write_all(b",")?;
            }
            serde_json::to_writer(&mut *out, key)?;
            out.write_all(b":")?;
            serde_json::to_writer(&mut *out, rows)?;
        }
        out.write_all(b"}")?;
        write_envelope_tail(out, code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_grouping_removes_field() {
        let mut enc = TreeEncoder::new("signal");
        let mut out = Vec::new();
        enc.begin(&mut out).unwrap();
        for (signal, v) in [("a", 1), ("b", 2), ("a", 3)] {
            enc.row(&mut out, Row::new().with("signal", signal).with("value", v))
                .unwrap();
        }
        enc.row(&mut out, Row::new().with("value", 4)).unwrap();
        enc.end(&mut out, ResultCode::Success).unwrap();

        let body: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(
            body,
            json!({
                "epidata": {
                    "a": [{"value": 1}, {"value": 3}],
                    "b": [{"value": 2}],
                    "": [{"value": 4}],
                },
                "result": 1,
                "message": "success",
            })
        );
        let text = String::from_utf8(out).unwrap();
        assert!(text.find("\"a\"").unwrap() < text.find("\"b\"").unwrap());
    }
}
