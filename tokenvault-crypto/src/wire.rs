//! Self-describing envelope format for wrapped TEKs and sealed PII.
//!
//! Format (v1):
//!   version[1] || suite[1] || iv[12] || aead_ciphertext[16+]
//!
//! The version/suite bytes make a future cipher-suite change (e.g. a wider
//! AAD policy, per §9 of the spec) self-describing instead of a silent
//! format break. `iv` is always exactly 12 bytes (§3 invariant 3).

use crate::aead::IV_BYTES;
use crate::error::OpenError;

pub const PROTOCOL_VERSION: u8 = 0x01;
pub const SUITE_AES256GCM: u8 = 0xB1;

const HEADER_BYTES: usize = 1 + 1;
pub const MIN_ENVELOPE_BYTES: usize = HEADER_BYTES + IV_BYTES + 16; // +GCM tag

pub struct WireComponents<'a> {
    pub version: u8,
    pub suite: u8,
    pub iv: &'a [u8],
    pub ciphertext: &'a [u8],
}

/// Prepend the version/suite header and IV to an AEAD ciphertext.
pub fn encode(iv: &[u8; IV_BYTES], ciphertext: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_BYTES + IV_BYTES + ciphertext.len());
    out.push(PROTOCOL_VERSION);
    out.push(SUITE_AES256GCM);
    out.extend_from_slice(iv);
    out.extend_from_slice(ciphertext);
    out
}

/// Parse a wire envelope back into its IV and ciphertext components.
pub fn decode(data: &[u8]) -> Result<WireComponents<'_>, OpenError> {
    if data.len() < MIN_ENVELOPE_BYTES {
        return Err(OpenError);
    }
    let version = data[0];
    let suite = data[1];
    if version != PROTOCOL_VERSION || suite != SUITE_AES256GCM {
        return Err(OpenError);
    }
    let iv = &data[HEADER_BYTES..HEADER_BYTES + IV_BYTES];
    let ciphertext = &data[HEADER_BYTES + IV_BYTES..];
    Ok(WireComponents { version, suite, iv, ciphertext })
}
