//! Filter compiler error types
//!
//! Error codes:
//! - EPI_FILTER_INVERTED_RANGE (REJECT)
//! - EPI_FILTER_EMPTY (EMPTY)
//! - EPI_FILTER_RANGE_NOT_ALLOWED (REJECT)
//! - EPI_FILTER_TYPE_MISMATCH (REJECT)
//! - EPI_FILTER_MALFORMED (REJECT)
//! - EPI_FILTER_BAD_IDENTIFIER (REJECT)

use std::fmt;

/// How a filter error is surfaced to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Malformed request, rejected before storage access
    Reject,
    /// Well-formed request that can match nothing
    Empty,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
            Severity::Empty => write!(f, "EMPTY"),
        }
    }
}

/// Filter-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterErrorCode {
    /// Range with hi < lo
    EpiFilterInvertedRange,
    /// Zero alternatives
    EpiFilterEmpty,
    /// Range on a plain string field
    EpiFilterRangeNotAllowed,
    /// Scalar type does not fit the field kind
    EpiFilterTypeMismatch,
    /// Unparseable value text
    EpiFilterMalformed,
    /// Field reference is not a safe identifier
    EpiFilterBadIdentifier,
}

impl FilterErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            FilterErrorCode::EpiFilterInvertedRange => "EPI_FILTER_INVERTED_RANGE",
            FilterErrorCode::EpiFilterEmpty => "EPI_FILTER_EMPTY",
            FilterErrorCode::EpiFilterRangeNotAllowed => "EPI_FILTER_RANGE_NOT_ALLOWED",
            FilterErrorCode::EpiFilterTypeMismatch => "EPI_FILTER_TYPE_MISMATCH",
            FilterErrorCode::EpiFilterMalformed => "EPI_FILTER_MALFORMED",
            FilterErrorCode::EpiFilterBadIdentifier => "EPI_FILTER_BAD_IDENTIFIER",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            FilterErrorCode::EpiFilterEmpty => Severity::Empty,
            _ => Severity::Reject,
        }
    }
}

impl fmt::Display for FilterErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Filter error with the offending field
#[derive(Debug, Clone, PartialEq)]
pub struct FilterError {
    code: FilterErrorCode,
    message: String,
    field: Option<String>,
}

impl FilterError {
    /// Create an inverted range error
    pub fn inverted_range(field: &str, lo: impl fmt::Display, hi: impl fmt::Display) -> Self {
        Self {
            code: FilterErrorCode::EpiFilterInvertedRange,
            message: format!("Range {}-{} on '{}' has hi < lo", lo, hi, field),
            field: Some(field.to_string()),
        }
    }

    /// Create an empty filter error
    pub fn empty(field: &str) -> Self {
        Self {
            code: FilterErrorCode::EpiFilterEmpty,
            message: format!("Filter on '{}' has no alternatives", field),
            field: Some(field.to_string()),
        }
    }

    /// Create a range-not-allowed error
    pub fn range_not_allowed(field: &str) -> Self {
        Self {
            code: FilterErrorCode::EpiFilterRangeNotAllowed,
            message: format!("Field '{}' does not support ranges", field),
            field: Some(field.to_string()),
        }
    }

    /// Create a type mismatch error
    pub fn type_mismatch(field: &str, expected: &str) -> Self {
        Self {
            code: FilterErrorCode::EpiFilterTypeMismatch,
            message: format!("Field '{}' expects {} values", field, expected),
            field: Some(field.to_string()),
        }
    }

    /// Create a malformed value error
    pub fn malformed(field: &str, text: &str) -> Self {
        Self {
            code: FilterErrorCode::EpiFilterMalformed,
            message: format!("Cannot parse '{}' for '{}'", text, field),
            field: Some(field.to_string()),
        }
    }

    /// Create a bad identifier error
    pub fn bad_identifier(field: &str) -> Self {
        Self {
            code: FilterErrorCode::EpiFilterBadIdentifier,
            message: format!("'{}' is not a valid field identifier", field),
            field: Some(field.to_string()),
        }
    }

    pub fn code(&self) -> FilterErrorCode {
        self.code
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    /// True when the filter is well-formed but can match nothing.
    pub fn is_empty_match(&self) -> bool {
        self.severity() == Severity::Empty
    }
}

impl fmt::Display for FilterError {
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

impl std::error::Error for FilterError {}

/// Result type for filter operations
pub type FilterResult<T> = Result<T, FilterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_not_a_rejection() {
        let err = FilterError::empty("issue");
        assert!(err.is_empty_match());
        assert_eq!(err.code().code(), "EPI_FILTER_EMPTY");
    }

    #[test]
    fn test_error_display() {
        let err = FilterError::inverted_range("epiweek", 20, 10);
        let display = format!("{}", err);
        assert!(display.contains("EPI_FILTER_INVERTED_RANGE"));
        assert!(display.contains("REJECT"));
        assert!(display.contains("20-10"));
        assert_eq!(err.field(), Some("epiweek"));
    }
}
