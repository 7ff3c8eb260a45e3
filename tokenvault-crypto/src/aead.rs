//! AEAD: AES-256-GCM seal/open.

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};

use crate::error::{OpenError, SealError};

pub const KEY_BYTES: usize = 32;
pub const IV_BYTES: usize = 12;

/// Generate a fresh 12-byte IV from the process CSPRNG.
///
/// Fails only on RNG exhaustion, which is fatal to the caller.
pub fn random_iv() -> Result<[u8; IV_BYTES], SealError> {
    let mut iv = [0u8; IV_BYTES];
    getrandom::getrandom(&mut iv).map_err(|_| SealError)?;
    Ok(iv)
}

/// Seal `plaintext` under `key` with a freshly generated IV.
///
/// Returns `(iv, ciphertext)`. `aad`, if present, is bound into the GCM tag
/// but not encrypted.
pub fn seal(key: &[u8; KEY_BYTES], plaintext: &[u8], aad: Option<&[u8]>) -> Result<([u8; IV_BYTES], Vec<u8>), SealError> {
    let iv = random_iv()?;
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| SealError)?;
    let nonce = Nonce::from_slice(&iv);
    let payload = Payload { msg: plaintext, aad: aad.unwrap_or(&[]) };
    let ciphertext = cipher.encrypt(nonce, payload).map_err(|_| SealError)?;
    Ok((iv, ciphertext))
}

/// Open `ciphertext` sealed under `key` with `iv`.
///
/// Fails uniformly as `OpenError` if the tag does not verify, the key is
/// wrong, `aad` doesn't match what was used to seal, or `iv` is not exactly
/// 12 bytes. Never returns partial plaintext.
pub fn open(key: &[u8; KEY_BYTES], iv: &[u8], ciphertext: &[u8], aad: Option<&[u8]>) -> Result<Vec<u8>, OpenError> {
    if iv.len() != IV_BYTES {
        return Err(OpenError);
    }
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| OpenError)?;
    let nonce = Nonce::from_slice(iv);
    let payload = Payload { msg: ciphertext, aad: aad.unwrap_or(&[]) };
    cipher.decrypt(nonce, payload).map_err(|_| OpenError)
}
