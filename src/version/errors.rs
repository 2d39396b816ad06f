//! Version resolver error types
//!
//! Error codes:
//! - EPI_VERSION_CONFLICT (REJECT)
//! - EPI_VERSION_INVALID (REJECT)
//! - EPI_VERSION_UNSUPPORTED (REJECT)
//! - EPI_VERSION_FILTER (pass-through of the issue filter error)

use std::fmt;

use crate::filter::FilterError;

/// Version-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionErrorCode {
    /// More than one selection mode supplied
    EpiVersionConflict,
    /// Mode value out of domain (negative lag, malformed cutoff)
    EpiVersionInvalid,
    /// Mode not available for this table
    EpiVersionUnsupported,
    /// Explicit issue filter failed to compile
    EpiVersionFilter,
}

impl VersionErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            VersionErrorCode::EpiVersionConflict => "EPI_VERSION_CONFLICT",
            VersionErrorCode::EpiVersionInvalid => "EPI_VERSION_INVALID",
            VersionErrorCode::EpiVersionUnsupported => "EPI_VERSION_UNSUPPORTED",
            VersionErrorCode::EpiVersionFilter => "EPI_VERSION_FILTER",
        }
    }
}

impl fmt::Display for VersionErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Version resolution error
#[derive(Debug, Clone, PartialEq)]
pub struct VersionError {
    code: VersionErrorCode,
    message: String,
    filter: Option<FilterError>,
}

impl VersionError {
    /// Create a conflicting modes error
    pub fn conflict(modes: &[&str]) -> Self {
        Self {
            code: VersionErrorCode::EpiVersionConflict,
            message: format!(
                "Only one of issues, lag, as_of may be given (got {})",
                modes.join(", ")
            ),
            filter: None,
        }
    }

    /// Create an invalid value error
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self {
            code: VersionErrorCode::EpiVersionInvalid,
            message: reason.into(),
            filter: None,
        }
    }

    /// Create an unsupported mode error
    pub fn unsupported(table: &str, mode: &str) -> Self {
        Self {
            code: VersionErrorCode::EpiVersionUnsupported,
            message: format!("Table '{}' does not support {} selection", table, mode),
            filter: None,
        }
    }

    pub fn code(&self) -> VersionErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The underlying issue filter error, if any
    pub fn filter_error(&self) -> Option<&FilterError> {
        self.filter.as_ref()
    }

    /// True when the issue filter was well-formed but can match nothing.
    pub fn is_empty_match(&self) -> bool {
        self.filter.as_ref().is_some_and(FilterError::is_empty_match)
    }
}

impl From<FilterError> for VersionError {
    fn from(err: FilterError) -> Self {
        Self {
            code: VersionErrorCode::EpiVersionFilter,
            message: err.message().to_string(),
            filter: Some(err),
        }
    }
}

impl fmt::Display for VersionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.filter {
            Some(inner) => write!(f, "{}", inner),
            None => write!(f, "[REJECT] {}: {}", self.code.code(), self.message),
        }
    }
}

impl std::error::Error for VersionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.filter
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for version resolution
pub type VersionResult<T> = Result<T, VersionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_names_modes() {
        let err = VersionError::conflict(&["issues", "lag"]);
        assert_eq!(err.code().code(), "EPI_VERSION_CONFLICT");
        assert!(err.message().contains("issues, lag"));
    }

    #[test]
    fn test_filter_pass_through() {
        let err: VersionError = FilterError::empty("issue").into();
        assert_eq!(err.code(), VersionErrorCode::EpiVersionFilter);
        assert!(err.is_empty_match());
        assert!(format!("{}", err).contains("EPI_FILTER_EMPTY"));
    }
}
