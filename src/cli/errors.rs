//! CLI-specific error types
//!
//! Every CLI error ends the process with a non-zero status.

use std::fmt;
use std::io;

/// CLI error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file missing or invalid
    ConfigError,
    /// I/O error (stdout, fixtures)
    IoError,
    /// Store or server could not start
    BootFailed,
    /// The request produced an error response
    RequestFailed,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "EPI_CLI_CONFIG_ERROR",
            Self::IoError => "EPI_CLI_IO_ERROR",
            Self::BootFailed => "EPI_CLI_BOOT_FAILED",
            Self::RequestFailed => "EPI_CLI_REQUEST_FAILED",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn boot_failed(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::BootFailed, msg)
    }

    pub fn request_failed(status: u16) -> Self {
        Self::new(
            CliErrorCode::RequestFailed,
            format!("request failed with status {}", status),
        )
    }

    pub fn code(&self) -> CliErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
