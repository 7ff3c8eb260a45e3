//! The platform-level Key Encryption Key that wraps every tenant's TEK.
//!
//! The KEK never leaves process memory unwrapped longer than a single
//! `wrap`/`unwrap` call, and is never logged, persisted, or transmitted.
//! Loading it from somewhere (env var, mounted secret, KMS) is
//! `tokenvault-cli`'s job; this module only knows how to use it.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use tokenvault_crypto::{open_envelope, seal_envelope, OpenError, SealError, Secret, SecretKey32};

use crate::error::KeyRegistryError;

/// Wraps and unwraps tenant encryption keys under a platform key. AAD is
/// bound to the organization id (§4.1), so a wrapped TEK copied between
/// organizations fails to unwrap.
pub trait KekProvider: Send + Sync {
    fn wrap(&self, plaintext_tek: &[u8; 32], organization_id: &str) -> Result<Vec<u8>, SealError>;
    fn unwrap(&self, wrapped_tek: &[u8], organization_id: &str) -> Result<SecretKey32, OpenError>;
}

/// A KEK held as a fixed 32-byte secret for the lifetime of the process.
/// No rotation support — rotating the platform KEK is explicitly out of
/// scope (§1 Non-goals).
pub struct StaticKek(SecretKey32);

impl StaticKek {
    pub fn new(key: [u8; 32]) -> Self {
        Self(Secret::new(key))
    }

    /// Decodes a base64-encoded 32-byte key. Returns `KeyUnavailable` if the
    /// decoded length is anything other than exactly 32 bytes — a
    /// misconfigured KEK must fail loudly at startup, not silently truncate
    /// or pad.
    pub fn from_base64(encoded: &str) -> Result<Self, KeyRegistryError> {
        let decoded = BASE64
            .decode(encoded.trim())
            .map_err(|_| KeyRegistryError::KeyUnavailable("KEK is not valid base64".into()))?;
        let key: [u8; 32] = decoded
            .try_into()
            .map_err(|_| KeyRegistryError::KeyUnavailable("KEK must decode to exactly 32 bytes".into()))?;
        Ok(Self::new(key))
    }
}

impl KekProvider for StaticKek {
    fn wrap(&self, plaintext_tek: &[u8; 32], organization_id: &str) -> Result<Vec<u8>, SealError> {
        seal_envelope(self.0.expose(), plaintext_tek, Some(organization_id.as_bytes()))
    }

    fn unwrap(&self, wrapped_tek: &[u8], organization_id: &str) -> Result<SecretKey32, OpenError> {
        let plaintext = open_envelope(self.0.expose(), wrapped_tek, Some(organization_id.as_bytes()))?;
        let key: [u8; 32] = plaintext.try_into().map_err(|_| OpenError)?;
        Ok(Secret::new(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_unwrap_roundtrips_under_matching_aad() {
        let kek = StaticKek::new([0x9Au8; 32]);
        let tek = [0x5Cu8; 32];
        let wrapped = kek.wrap(&tek, "org-123").unwrap();
        let unwrapped = kek.unwrap(&wrapped, "org-123").unwrap();
        assert_eq!(unwrapped.expose(), &tek);
    }

    #[test]
    fn unwrap_rejects_mismatched_organization_id() {
        let kek = StaticKek::new([0x9Au8; 32]);
        let tek = [0x5Cu8; 32];
        let wrapped = kek.wrap(&tek, "org-123").unwrap();
        assert!(kek.unwrap(&wrapped, "org-456").is_err());
    }

    #[test]
    fn from_base64_rejects_wrong_length() {
        assert!(StaticKek::from_base64("AAAA").is_err());
    }

    #[test]
    fn from_base64_accepts_32_bytes() {
        let encoded = BASE64.encode([0x11u8; 32]);
        assert!(StaticKek::from_base64(&encoded).is_ok());
    }
}
