//! # Printer Errors

use std::io;

use thiserror::Error;

/// Result type for printer operations
pub type PrinterResult<T> = Result<T, PrinterError>;

/// Output encoding failures and lifecycle violations
#[derive(Debug, Error)]
pub enum PrinterError {
    /// Writing to the response failed
    #[error("output write failed: {0}")]
    Io(#[from] io::Error),

    /// A row could not be serialised
    #[error("row encoding failed: {0}")]
    Encode(#[from] serde_json::Error),

    /// `format` parameter names no printer
    #[error("unknown output format '{0}'")]
    UnknownFormat(String),

    /// Tree output on a dataset without a grouping field
    #[error("tree output is not available for this source")]
    MissingGroupField,

    /// Operation on a session that already ended
    #[error("printer session already finished")]
    Finished,
}

impl PrinterError {
    /// Stable string code
    pub fn code(&self) -> &'static str {
        match self {
            PrinterError::Io(_) => "EPI_PRINTER_IO",
            PrinterError::Encode(_) => "EPI_PRINTER_ENCODE",
            PrinterError::UnknownFormat(_) | PrinterError::MissingGroupField => {
                "EPI_PRINTER_FORMAT"
            }
            PrinterError::Finished => "EPI_PRINTER_FINISHED",
        }
    }

    /// Format errors are caught before any output is produced.
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            PrinterError::UnknownFormat(_) | PrinterError::MissingGroupField
        )
    }
}
