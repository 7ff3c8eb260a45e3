//! Core identifiers and the TEK record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A tenant identifier. Thin newtype so organization/client ids can't be
/// swapped at a call site by accident.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrgId(String);

impl OrgId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrgId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// `{organization_id, wrapped_tek, ork_hash, created_at, rotated_at?, version, active}`.
///
/// `wrapped_tek` is the version/suite/iv/ciphertext envelope produced by
/// `tokenvault_crypto::seal_envelope` under the KEK, AAD-bound to
/// `organization_id` (§4.1). `ork_hash` is `sha256_hex(ork)`, a verifier
/// only — never used as key material.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TekRecord {
    pub organization_id: OrgId,
    pub wrapped_tek: Vec<u8>,
    pub ork_hash: String,
    pub created_at: DateTime<Utc>,
    pub rotated_at: Option<DateTime<Utc>>,
    pub version: i32,
    pub active: bool,
}

/// Opaque handle returned by `resolve_tek`. Carries enough to `unwrap()`
/// without re-querying the store, but does not itself hold key material.
#[derive(Clone, Debug)]
pub struct TekHandle(pub(crate) TekRecord);

impl TekHandle {
    pub fn organization_id(&self) -> &OrgId {
        &self.0.organization_id
    }

    pub fn version(&self) -> i32 {
        self.0.version
    }

    pub(crate) fn record(&self) -> &TekRecord {
        &self.0
    }
}

impl From<TekRecord> for TekHandle {
    fn from(record: TekRecord) -> Self {
        Self(record)
    }
}
