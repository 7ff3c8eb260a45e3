//! # tokenvault-crypto
//!
//! Cryptographic primitives for the PII tokenisation engine: AES-256-GCM
//! seal/open, HKDF-SHA-256 key derivation, CSPRNG byte generation,
//! constant-time comparison, and scoped zeroisation of secret buffers.
//!
//! ## What's NOT provided
//!
//! - Key lifecycle (see `tokenvault-keys`)
//! - Persistence (see `tokenvault-store`)
//! - Validation or orchestration (see `tokenvault-engine`)
//!
//! A single mistake in this crate — IV reuse, wrong AAD, a key that isn't
//! zeroised — silently breaks the security guarantee of everything built on
//! top of it, so the surface here is deliberately small.

#![deny(unsafe_code)]

mod aead;
mod error;
mod hashing;
mod kdf;
mod secret;
mod wire;

pub use aead::{open, seal, random_iv, IV_BYTES, KEY_BYTES};
pub use error::{OpenError, SealError};
pub use hashing::{constant_time_eq, random_bytes, sha256_hex};
pub use kdf::{hkdf, hkdf32};
pub use secret::{zeroise, Secret, SecretBytes, SecretKey32, SecretString};
pub use wire::{decode as decode_envelope, encode as encode_envelope, MIN_ENVELOPE_BYTES};

/// Seal `plaintext` under `key`, returning a self-describing envelope
/// (version || suite || iv || ciphertext). This is the form the engine and
/// key registry actually store; `aead::seal`/`aead::open` remain available
/// for callers that want to manage the IV and wire format themselves.
pub fn seal_envelope(key: &[u8; KEY_BYTES], plaintext: &[u8], aad: Option<&[u8]>) -> Result<Vec<u8>, SealError> {
    let (iv, ciphertext) = aead::seal(key, plaintext, aad)?;
    Ok(wire::encode(&iv, &ciphertext))
}

/// Open a self-describing envelope produced by [`seal_envelope`].
pub fn open_envelope(key: &[u8; KEY_BYTES], envelope: &[u8], aad: Option<&[u8]>) -> Result<Vec<u8>, OpenError> {
    let parts = wire::decode(envelope)?;
    aead::open(key, parts.iv, parts.ciphertext, aad)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seal_open_roundtrip() {
        let key = [7u8; 32];
        let (iv, ct) = aead::seal(&key, b"hello pii", Some(b"aad")).unwrap();
        let pt = aead::open(&key, &iv, &ct, Some(b"aad")).unwrap();
        assert_eq!(pt, b"hello pii");
    }

    #[test]
    fn open_rejects_wrong_key() {
        let key = [7u8; 32];
        let other = [9u8; 32];
        let (iv, ct) = aead::seal(&key, b"hello pii", None).unwrap();
        assert!(aead::open(&other, &iv, &ct, None).is_err());
    }

    #[test]
    fn open_rejects_wrong_aad() {
        let key = [1u8; 32];
        let (iv, ct) = aead::seal(&key, b"data", Some(b"org=acme")).unwrap();
        assert!(aead::open(&key, &iv, &ct, Some(b"org=globex")).is_err());
    }

    #[test]
    fn open_rejects_short_iv() {
        let key = [1u8; 32];
        assert!(aead::open(&key, &[0u8; 4], b"xxxxxxxxxxxxxxxx", None).is_err());
    }

    #[test]
    fn iv_is_twelve_bytes_and_fresh_each_call() {
        let key = [3u8; 32];
        let (iv1, _) = aead::seal(&key, b"a", None).unwrap();
        let (iv2, _) = aead::seal(&key, b"a", None).unwrap();
        assert_eq!(iv1.len(), 12);
        assert_ne!(iv1, iv2);
    }

    #[test]
    fn hkdf_is_deterministic_given_same_inputs() {
        let ikm = b"tenant-encryption-key-32-bytes!!";
        let salt = b"organization-key";
        let a = hkdf32(ikm, salt, b"").unwrap();
        let b = hkdf32(ikm, salt, b"").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn hkdf_differs_on_salt() {
        let ikm = b"tenant-encryption-key-32-bytes!!";
        let a = hkdf32(ikm, b"ork-one", b"").unwrap();
        let b = hkdf32(ikm, b"ork-two", b"").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn envelope_roundtrip() {
        let key = [5u8; 32];
        let env = seal_envelope(&key, b"payload", Some(b"aad")).unwrap();
        assert!(env.len() >= MIN_ENVELOPE_BYTES);
        let pt = open_envelope(&key, &env, Some(b"aad")).unwrap();
        assert_eq!(pt, b"payload");
    }

    #[test]
    fn envelope_rejects_truncated_input() {
        let key = [5u8; 32];
        assert!(open_envelope(&key, &[1, 2, 3], None).is_err());
    }

    #[test]
    fn constant_time_eq_matches_and_rejects() {
        assert!(constant_time_eq(b"abcd", b"abcd"));
        assert!(!constant_time_eq(b"abcd", b"abce"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
    }

    #[test]
    fn sha256_hex_is_stable() {
        assert_eq!(sha256_hex(b"s3cret"), sha256_hex(b"s3cret"));
        assert_ne!(sha256_hex(b"s3cret"), sha256_hex(b"wrong"));
    }

    #[test]
    fn secret_exposes_wrapped_value_until_dropped() {
        let secret = Secret::new([0xABu8; 32]);
        assert_eq!(secret.expose(), &[0xABu8; 32]);
        // Drop runs `zeroize()` on the wrapped array; the guarantee is
        // exercised end-to-end by `zeroize`'s own test suite, not re-proven
        // here by reading freed memory.
    }
}
