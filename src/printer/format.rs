//! Output format selection

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::PrinterError;

/// Wire encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// `{"epidata": [...], "result": n, "message": "..."}`
    #[default]
    Classic,
    /// Classic envelope with rows grouped by one field
    Tree,
    Csv,
    /// Bare array
    Json,
    /// One object per line
    Jsonl,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Classic => "classic",
            OutputFormat::Tree => "tree",
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
            OutputFormat::Jsonl => "jsonl",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            OutputFormat::Classic | OutputFormat::Tree | OutputFormat::Json => "application/json",
            OutputFormat::Csv => "text/csv; charset=utf-8",
            OutputFormat::Jsonl => "application/x-ndjson",
        }
    }

    /// Absent parameter means classic.
    pub fn from_param(value: Option<&str>) -> Result<Self, PrinterError> {
        match value {
            None => Ok(OutputFormat::Classic),
            Some(v) => v.parse(),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = PrinterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "classic" => Ok(OutputFormat::Classic),
            "tree" => Ok(OutputFormat::Tree),
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            "jsonl" | "ndjson" => Ok(OutputFormat::Jsonl),
            other => Err(PrinterError::UnknownFormat(other.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(OutputFormat::from_param(None).unwrap(), OutputFormat::Classic);
        assert_eq!("CSV".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);
        assert_eq!("ndjson".parse::<OutputFormat>().unwrap(), OutputFormat::Jsonl);
        assert!(matches!(
            "xml".parse::<OutputFormat>(),
            Err(PrinterError::UnknownFormat(_))
        ));
    }
}
