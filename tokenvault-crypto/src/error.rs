//! Uniform failure types.
//!
//! `OpenError` carries no detail by design: seal/open failures (wrong key,
//! tampered ciphertext, wrong AAD, malformed input) must all look identical
//! to a caller, so that a failed `open` never becomes an oracle over *why*
//! it failed.

use core::fmt;

/// The RNG could not produce fresh randomness. Fatal to the calling request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SealError;

impl fmt::Display for SealError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "seal failed: rng unavailable")
    }
}

impl std::error::Error for SealError {}

/// Authentication failed: wrong key, wrong AAD, tampered ciphertext, or a
/// malformed envelope. Never distinguishes among these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenError;

impl fmt::Display for OpenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "open failed: authentication error")
    }
}

impl std::error::Error for OpenError {}
