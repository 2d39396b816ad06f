//! # Auth
//!
//! Shared-secret token checks for protected sources. Runs before any
//! storage access; a failure always yields result code `-1`.

mod crypto;
mod errors;
mod tokens;

pub use crypto::{digest_token, digests_match, TokenDigest};
pub use errors::{AuthError, AuthResult};
pub use tokens::{AuthRequirement, AuthSession, TokenConfig, TokenRegistry};
