//! # Token Digests
//!
//! Secrets are held and compared as SHA-256 digests. Comparison is
//! constant-time so a mismatch leaks nothing about the matching prefix.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// SHA-256 of a raw token
pub type TokenDigest = [u8; 32];

/// Digest a raw token for storage and comparison.
pub fn digest_token(token: &str) -> TokenDigest {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    let mut digest = [0u8; 32];
    digest.copy_from_slice(&hasher.finalize());
    digest
}

/// Constant-time digest equality
pub fn digests_match(a: &TokenDigest, b: &TokenDigest) -> bool {
    a[..].ct_eq(&b[..]).into()
}
