//! API response types

use serde::{Deserialize, Serialize};

use crate::printer::{OutputFormat, ResultCode};

use super::errors::ApiError;

/// Body of every rejected request, whatever format was asked for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub result: i32,
    pub message: String,
}

impl ErrorResponse {
    pub fn from_error(err: &ApiError) -> Self {
        Self {
            result: ResultCode::Error.code(),
            message: err.message().to_string(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::json!({ "result": self.result, "message": self.message }).to_string()
    }
}

/// A finished response, transport-agnostic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpidataResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
    /// Result code, also for formats that do not carry it in-band
    pub result: i32,
}

impl EpidataResponse {
    pub fn rows(format: OutputFormat, code: ResultCode, body: Vec<u8>) -> Self {
        Self {
            status: 200,
            content_type: format.content_type(),
            body,
            result: code.code(),
        }
    }

    pub fn error(err: &ApiError) -> Self {
        Self {
            status: err.http_status(),
            content_type: "application/json",
            body: ErrorResponse::from_error(err).to_json().into_bytes(),
            result: ResultCode::Error.code(),
        }
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}
