//! API error types
//!
//! API errors are pass-through: they keep the code of the subsystem that
//! raised them (filter, version, auth, stream, printer) and add the class
//! that decides the response.

use std::fmt;

use crate::auth::AuthError;
use crate::filter::FilterError;
use crate::printer::PrinterError;
use crate::stream::StreamError;
use crate::version::VersionError;

/// How an error surfaces in the response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Malformed or missing parameter: `-1`, HTTP 400
    Validation,
    /// Token check failed: `-1`, HTTP 401
    Auth,
    /// Storage or output failure mid-response: `-1`, HTTP 500
    Storage,
    /// A filter that can match nothing: `-2`, no storage access
    EmptyMatch,
}

impl ErrorClass {
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorClass::Validation => 400,
            ErrorClass::Auth => 401,
            ErrorClass::Storage => 500,
            ErrorClass::EmptyMatch => 200,
        }
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorClass::Validation => write!(f, "VALIDATION"),
            ErrorClass::Auth => write!(f, "AUTH"),
            ErrorClass::Storage => write!(f, "STORAGE"),
            ErrorClass::EmptyMatch => write!(f, "EMPTY"),
        }
    }
}

/// API-level error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCode {
    /// Unusable parameter value
    EpiInvalidRequest,
    /// Required parameter absent
    EpiMissingParameter,
    /// No dataset of that name
    EpiUnknownSource,
}

impl ApiErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            ApiErrorCode::EpiInvalidRequest => "EPI_INVALID_REQUEST",
            ApiErrorCode::EpiMissingParameter => "EPI_MISSING_PARAMETER",
            ApiErrorCode::EpiUnknownSource => "EPI_UNKNOWN_SOURCE",
        }
    }
}

impl fmt::Display for ApiErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// API error with the originating subsystem code preserved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    code: String,
    message: String,
    class: ErrorClass,
}

impl ApiError {
    fn new(code: &str, message: impl Into<String>, class: ErrorClass) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            class,
        }
    }

    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::new(
            ApiErrorCode::EpiInvalidRequest.code(),
            reason,
            ErrorClass::Validation,
        )
    }

    pub fn missing_parameter(name: &str) -> Self {
        Self::new(
            ApiErrorCode::EpiMissingParameter.code(),
            format!("missing parameter: {}", name),
            ErrorClass::Validation,
        )
    }

    pub fn unknown_source(name: &str) -> Self {
        Self::new(
            ApiErrorCode::EpiUnknownSource.code(),
            format!("unknown source: {}", name),
            ErrorClass::Validation,
        )
    }

    /// Pass-through; an empty alternative list becomes an empty match.
    pub fn from_filter_error(err: FilterError) -> Self {
        let class = if err.is_empty_match() {
            ErrorClass::EmptyMatch
        } else {
            ErrorClass::Validation
        };
        Self::new(err.code().code(), err.message(), class)
    }

    pub fn from_version_error(err: VersionError) -> Self {
        match err.filter_error() {
            Some(inner) => Self::from_filter_error(inner.clone()),
            None => Self::new(err.code().code(), err.message(), ErrorClass::Validation),
        }
    }

    pub fn from_auth_error(err: AuthError) -> Self {
        Self::new(err.code(), err.to_string(), ErrorClass::Auth)
    }

    pub fn from_stream_error(err: StreamError) -> Self {
        Self::new(err.code().code(), err.message(), ErrorClass::Storage)
    }

    /// Format errors are request errors; anything else failed mid-output.
    pub fn from_printer_error(err: PrinterError) -> Self {
        let class = if err.is_request_error() {
            ErrorClass::Validation
        } else {
            ErrorClass::Storage
        };
        Self::new(err.code(), err.to_string(), class)
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn class(&self) -> ErrorClass {
        self.class
    }

    pub fn http_status(&self) -> u16 {
        self.class.http_status()
    }

    pub fn is_empty_match(&self) -> bool {
        self.class == ErrorClass::EmptyMatch
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.class, self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<FilterError> for ApiError {
    fn from(err: FilterError) -> Self {
        Self::from_filter_error(err)
    }
}

impl From<VersionError> for ApiError {
    fn from(err: VersionError) -> Self {
        Self::from_version_error(err)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self::from_auth_error(err)
    }
}

impl From<StreamError> for ApiError {
    fn from(err: StreamError) -> Self {
        Self::from_stream_error(err)
    }
}

impl From<PrinterError> for ApiError {
    fn from(err: PrinterError) -> Self {
        Self::from_printer_error(err)
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_pass_through() {
        let err = ApiError::from(FilterError::inverted_range("lag", 20, 10));
        assert_eq!(err.code(), "EPI_FILTER_INVERTED_RANGE");
        assert_eq!(err.http_status(), 400);

        let empty = ApiError::from(FilterError::empty("regions"));
        assert!(empty.is_empty_match());
    }

    #[test]
    fn test_version_filter_unwrapped() {
        let err = ApiError::from(VersionError::from(FilterError::empty("issues")));
        assert!(err.is_empty_match());
        let err = ApiError::from(VersionError::conflict(&["issues", "lag"]));
        assert_eq!(err.code(), "EPI_VERSION_CONFLICT");
    }

    #[test]
    fn test_classes_map_to_status() {
        assert_eq!(ApiError::from(AuthError::InvalidToken).http_status(), 401);
        assert_eq!(
            ApiError::from(StreamError::store_failed("down")).http_status(),
            500
        );
        assert_eq!(
            ApiError::from(PrinterError::UnknownFormat("xml".into())).http_status(),
            400
        );
        assert_eq!(ApiError::unknown_source("nope").code(), "EPI_UNKNOWN_SOURCE");
    }
}
