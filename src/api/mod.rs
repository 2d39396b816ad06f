//! API Layer
//!
//! Transport-agnostic request handling: a source name plus a flat
//! parameter map in, a finished response out.
//!
//! # Design Principles
//!
//! - One fixed request flow for every source
//! - Auth is checked before storage is touched
//! - Error codes passed through unchanged from the subsystem that raised them
//! - Errors are always a JSON envelope, whatever format was requested

mod context;
mod errors;
mod handler;
mod params;
mod response;

pub use context::{RequestContext, ServiceState, DEFAULT_ROW_CAP};
pub use errors::{ApiError, ApiErrorCode, ApiResult, ErrorClass};
pub use handler::ApiHandler;
pub use params::{QueryParams, TOKEN_PARAM};
pub use response::{EpidataResponse, ErrorResponse};
