//! Errors produced by the key registry.

use core::fmt;

/// Failure kinds surfaced to `tokenvault-engine`. Mirrors §7's three-way
/// split for this component: `ORK_VERIFICATION_FAILED` is a caller error
/// (wrong secret); `KEY_UNAVAILABLE` is a KEK-provider failure (missing,
/// misconfigured, or a wrap/unwrap that didn't authenticate); `StoreUnavailable`
/// is the `TekStore`/durable-store backing this registry being unreachable —
/// kept distinct from `KeyUnavailable` so `tokenvault-engine` can map it to
/// `PERSIST_UNAVAILABLE` instead of `KEY_UNAVAILABLE` (a Postgres outage is
/// not a key-material problem).
#[derive(Debug, Clone)]
pub enum KeyRegistryError {
    /// The presented ORK does not match the stored verifier for this
    /// organization's active TEK.
    OrkVerificationFailed,
    /// The KEK could not wrap or unwrap a TEK: missing, misconfigured, or
    /// an authentication failure on unwrap.
    KeyUnavailable(String),
    /// The `TekStore` backing this registry (the durable store) could not
    /// be reached while resolving, creating, or rotating a TEK.
    StoreUnavailable(String),
}

impl fmt::Display for KeyRegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OrkVerificationFailed => write!(f, "organization key verification failed"),
            Self::KeyUnavailable(detail) => write!(f, "tenant encryption key unavailable: {detail}"),
            Self::StoreUnavailable(detail) => write!(f, "tek store unavailable: {detail}"),
        }
    }
}

impl std::error::Error for KeyRegistryError {}

impl From<tokenvault_crypto::SealError> for KeyRegistryError {
    fn from(_: tokenvault_crypto::SealError) -> Self {
        Self::KeyUnavailable("failed to seal tenant encryption key".into())
    }
}

impl From<tokenvault_crypto::OpenError> for KeyRegistryError {
    fn from(_: tokenvault_crypto::OpenError) -> Self {
        Self::KeyUnavailable("failed to unwrap tenant encryption key".into())
    }
}
