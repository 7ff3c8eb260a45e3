//! `EngineError`: a tagged union crossing the C4 boundary instead of a
//! `status` string plus an `error_message` string (§9 REDESIGN). Adapters
//! map this to wire format; nothing upstream of the adapter boundary sees
//! a string-typed error.

use core::fmt;

#[derive(Debug, Clone)]
pub enum EngineError {
    /// A caller input constraint was violated.
    ValidationError(String),
    /// The record is absent, expired, or belongs to a different organization.
    NotFound,
    /// Authentication tag or AAD mismatch: wrong ORK, tampered ciphertext,
    /// or AAD that doesn't match what was sealed.
    DecryptionFailed,
    /// A TEK already exists for this organization and the presented ORK
    /// does not match it. Tokenize-path only — Detokenize folds this into
    /// `DecryptionFailed` instead (see `tokenize`/`detokenize` docs).
    OrkVerificationFailed,
    /// The KEK provider could not produce or use the platform key. Fatal
    /// to the affected request only.
    KeyUnavailable(String),
    /// The queue or durable store was unreachable and durability could not
    /// be guaranteed, and cache-only write-through was not enabled.
    PersistUnavailable(String),
    /// Unexpected internal failure.
    Internal(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationError(detail) => write!(f, "validation error: {detail}"),
            Self::NotFound => write!(f, "not found"),
            Self::DecryptionFailed => write!(f, "decryption failed"),
            Self::OrkVerificationFailed => write!(f, "organization key verification failed"),
            Self::KeyUnavailable(detail) => write!(f, "key unavailable: {detail}"),
            Self::PersistUnavailable(detail) => write!(f, "persistence unavailable: {detail}"),
            Self::Internal(detail) => write!(f, "internal error: {detail}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<tokenvault_keys::KeyRegistryError> for EngineError {
    fn from(err: tokenvault_keys::KeyRegistryError) -> Self {
        match err {
            tokenvault_keys::KeyRegistryError::OrkVerificationFailed => Self::OrkVerificationFailed,
            tokenvault_keys::KeyRegistryError::KeyUnavailable(detail) => Self::KeyUnavailable(detail),
            // The registry's backing store, not the KEK, is the problem
            // here — surface it the same way a direct `StoreError` would be
            // (§7: PERSIST_UNAVAILABLE, not KEY_UNAVAILABLE).
            tokenvault_keys::KeyRegistryError::StoreUnavailable(detail) => Self::PersistUnavailable(detail),
        }
    }
}

impl From<tokenvault_store::StoreError> for EngineError {
    fn from(err: tokenvault_store::StoreError) -> Self {
        Self::PersistUnavailable(err.to_string())
    }
}

impl From<tokenvault_crypto::SealError> for EngineError {
    fn from(_: tokenvault_crypto::SealError) -> Self {
        Self::Internal("rng unavailable".into())
    }
}

/// The externally visible code for an error, after the §7 `NOT_FOUND` /
/// `DECRYPTION_FAILED` collapse is applied. Internal logs should always
/// log the real `EngineError`, never this collapsed form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalErrorCode {
    ValidationError,
    NotFound,
    OrkVerificationFailed,
    KeyUnavailable,
    PersistUnavailable,
    Internal,
}

impl EngineError {
    /// Maps to the code and message an adapter should put on the wire.
    /// `preserve_decrypt_oracle` is the documented escape hatch (§9 Open
    /// Question) for deployments that need the pre-rewrite distinct
    /// "not found" vs "failed to decrypt" responses; it defaults to
    /// `false` everywhere in this workspace.
    pub fn external(&self, preserve_decrypt_oracle: bool) -> (ExternalErrorCode, &'static str) {
        match self {
            Self::ValidationError(_) => (ExternalErrorCode::ValidationError, "validation error"),
            Self::NotFound => {
                if preserve_decrypt_oracle {
                    (ExternalErrorCode::NotFound, "not found")
                } else {
                    (ExternalErrorCode::NotFound, "token not found or decryption failed")
                }
            }
            Self::DecryptionFailed => {
                if preserve_decrypt_oracle {
                    (ExternalErrorCode::NotFound, "failed to decrypt")
                } else {
                    (ExternalErrorCode::NotFound, "token not found or decryption failed")
                }
            }
            // Tokenize-path only: `decrypt_record` folds the registry's
            // `OrkVerificationFailed` into `DecryptionFailed` before it ever
            // reaches here on the Detokenize path, so this arm only ever
            // fires for a write against a pre-existing TEK (§7/§9 — the
            // oracle-collapse rule protects reads of an existing record, not
            // writes where no record is at stake yet).
            Self::OrkVerificationFailed => {
                (ExternalErrorCode::OrkVerificationFailed, "organization key verification failed")
            }
            Self::KeyUnavailable(_) => (ExternalErrorCode::KeyUnavailable, "key unavailable"),
            Self::PersistUnavailable(_) => (ExternalErrorCode::PersistUnavailable, "persistence unavailable"),
            Self::Internal(_) => (ExternalErrorCode::Internal, "internal error"),
        }
    }
}
