//! # Auth Errors
//!
//! Error types for the shared-secret token check.

use thiserror::Error;

/// Result type for auth operations
pub type AuthResult<T> = Result<T, AuthError>;

/// Token check failures. Every variant rejects the request before any
/// storage access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Source requires a token and none was supplied
    #[error("authentication token required")]
    MissingToken,

    /// Token matches no global token
    #[error("invalid authentication token")]
    InvalidToken,

    /// Token does not grant access to a named sub-resource
    #[error("not authorized for '{0}'")]
    Unauthorized(String),

    /// Too many token comparisons for one request
    #[error("token comparison limit of {0} exceeded")]
    ComparisonLimit(usize),
}

impl AuthError {
    /// Stable string code
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "EPI_AUTH_MISSING",
            AuthError::InvalidToken => "EPI_AUTH_INVALID",
            AuthError::Unauthorized(_) => "EPI_AUTH_UNAUTHORIZED",
            AuthError::ComparisonLimit(_) => "EPI_AUTH_LIMIT",
        }
    }
}
