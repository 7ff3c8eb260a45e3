//! RFC-5869 HKDF-SHA-256 extract-and-expand.

use hkdf::Hkdf;
use sha2::Sha256;

use crate::error::SealError;

/// `HKDF-SHA-256(salt, ikm)` extract, then expand to `L` bytes with `info`.
///
/// The engine only ever calls this with `L = 32` (field data key length),
/// but the primitive itself is general per RFC 5869.
pub fn hkdf(ikm: &[u8], salt: &[u8], info: &[u8], out: &mut [u8]) -> Result<(), SealError> {
    let hk = Hkdf::<Sha256>::new(Some(salt), ikm);
    hk.expand(info, out).map_err(|_| SealError)
}

/// Convenience form for the common 32-byte case (field data keys).
pub fn hkdf32(ikm: &[u8], salt: &[u8], info: &[u8]) -> Result<[u8; 32], SealError> {
    let mut out = [0u8; 32];
    hkdf(ikm, salt, info, &mut out)?;
    Ok(out)
}
