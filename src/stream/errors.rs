//! Row stream and storage error types
//!
//! Error codes:
//! - EPI_STORE_FAILED (ERROR)
//! - EPI_STORE_DUPLICATE (ERROR)
//! - EPI_STORE_UNKNOWN_TABLE (ERROR)
//! - EPI_STREAM_UNDECLARED_FIELD (FATAL)
//! - EPI_STREAM_COERCION (ERROR)
//! - EPI_STREAM_OUTPUT (ERROR)

use std::fmt;

use crate::printer::PrinterError;

/// Severity levels for stream errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The response is aborted, the service is healthy
    Error,
    /// A construction invariant was broken
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Stream-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamErrorCode {
    /// Storage query failed
    EpiStoreFailed,
    /// Duplicate (dimension-key, issue) on insert
    EpiStoreDuplicate,
    /// Sub-query names a table the store does not hold
    EpiStoreUnknownTable,
    /// Row carries a field missing from the typed field list
    EpiStreamUndeclaredField,
    /// Value cannot be coerced to its declared type
    EpiStreamCoercion,
    /// Writing to the response failed
    EpiStreamOutput,
}

impl StreamErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            StreamErrorCode::EpiStoreFailed => "EPI_STORE_FAILED",
            StreamErrorCode::EpiStoreDuplicate => "EPI_STORE_DUPLICATE",
            StreamErrorCode::EpiStoreUnknownTable => "EPI_STORE_UNKNOWN_TABLE",
            StreamErrorCode::EpiStreamUndeclaredField => "EPI_STREAM_UNDECLARED_FIELD",
            StreamErrorCode::EpiStreamCoercion => "EPI_STREAM_COERCION",
            StreamErrorCode::EpiStreamOutput => "EPI_STREAM_OUTPUT",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            StreamErrorCode::EpiStreamUndeclaredField => Severity::Fatal,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for StreamErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Stream error with context
#[derive(Debug)]
pub struct StreamError {
    code: StreamErrorCode,
    message: String,
}

impl StreamError {
    /// Create a storage failure error
    pub fn store_failed(reason: impl Into<String>) -> Self {
        Self {
            code: StreamErrorCode::EpiStoreFailed,
            message: reason.into(),
        }
    }

    /// Create a duplicate row error
    pub fn duplicate(table: &str, key: impl fmt::Debug) -> Self {
        Self {
            code: StreamErrorCode::EpiStoreDuplicate,
            message: format!("Duplicate revision {:?} in '{}'", key, table),
        }
    }

    /// Create an unknown table error
    pub fn unknown_table(table: &str) -> Self {
        Self {
            code: StreamErrorCode::EpiStoreUnknownTable,
            message: format!("Table '{}' not found", table),
        }
    }

    /// Create an undeclared field error
    pub fn undeclared_field(table: &str, field: &str) -> Self {
        Self {
            code: StreamErrorCode::EpiStreamUndeclaredField,
            message: format!("Field '{}' is not declared for '{}'", field, table),
        }
    }

    /// Create a coercion error
    pub fn coercion(field: &str, value: impl fmt::Display, target: &str) -> Self {
        Self {
            code: StreamErrorCode::EpiStreamCoercion,
            message: format!("Cannot coerce '{}' in '{}' to {}", value, field, target),
        }
    }

    /// Create an output error
    pub fn output(reason: impl Into<String>) -> Self {
        Self {
            code: StreamErrorCode::EpiStreamOutput,
            message: reason.into(),
        }
    }

    pub fn code(&self) -> StreamErrorCode {
        self.code
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )
    }
}

impl std::error::Error for StreamError {}

impl From<PrinterError> for StreamError {
    fn from(err: PrinterError) -> Self {
        Self::output(err.to_string())
    }
}

/// Result type for stream operations
pub type StreamResult<T> = Result<T, StreamError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undeclared_field_is_fatal() {
        let err = StreamError::undeclared_field("fluview", "secret");
        assert!(err.is_fatal());
        assert!(!StreamError::store_failed("timeout").is_fatal());
    }

    #[test]
    fn test_error_display() {
        let err = StreamError::store_failed("connection reset");
        let display = format!("{}", err);
        assert!(display.contains("EPI_STORE_FAILED"));
        assert!(display.contains("connection reset"));
    }
}
