//! Hashing, constant-time comparison, and CSPRNG byte generation.
//!
//! `sha256_hex` is used only as a verifier (the ORK hash stored alongside a
//! TEK record) — never as a key. Key material always comes from `hkdf` or
//! `random_bytes` feeding directly into AES-GCM.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::error::SealError;

/// Fill a fresh buffer of `n` random bytes from the process CSPRNG.
pub fn random_bytes(n: usize) -> Result<Vec<u8>, SealError> {
    let mut buf = vec![0u8; n];
    getrandom::getrandom(&mut buf).map_err(|_| SealError)?;
    Ok(buf)
}

/// Hex-encoded SHA-256 digest.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Constant-time byte comparison, for hashes and tags.
///
/// Returns `false` immediately (non-constant-time) if lengths differ, since
/// length alone is never secret in this system's usage (hex digests and
/// hashes are fixed-length).
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
