//! The persistence contract C2 needs from C3, plus an in-memory double for
//! unit tests. Mirrors the teacher's storage-backend split: one trait, one
//! production-grade implementation living elsewhere (`tokenvault-store`),
//! one in-memory implementation living here.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::error::KeyRegistryError;
use crate::types::{OrgId, TekRecord};

/// Durable storage for tenant encryption keys, one active row per
/// organization. Implementations must make `create_if_absent` safe under
/// concurrent callers racing to provision the same organization's first
/// TEK (§4.2, §8 "TEK creation race").
#[async_trait]
pub trait TekStore: Send + Sync {
    /// Returns the current active record for `org`, if one has been
    /// provisioned.
    async fn get_active(&self, org: &OrgId) -> Result<Option<TekRecord>, KeyRegistryError>;

    /// Inserts `candidate` as the active record for its organization unless
    /// one already exists, in which case the existing row is returned
    /// instead of erroring. Exactly one concurrent caller's candidate wins;
    /// every other caller observes the winner's record.
    async fn create_if_absent(&self, candidate: TekRecord) -> Result<TekRecord, KeyRegistryError>;

    /// Marks the current active record inactive and inserts a new active
    /// record with an incremented version, wrapping `new_wrapped_tek` under
    /// the (possibly re-verified) `ork_hash`.
    async fn rotate(
        &self,
        org: &OrgId,
        new_wrapped_tek: Vec<u8>,
        ork_hash: String,
    ) -> Result<TekRecord, KeyRegistryError>;
}

/// Test double. Not used outside `#[cfg(test)]` / other crates' test code —
/// the real deployment path always goes through `tokenvault-store`'s
/// Postgres-backed implementation.
#[derive(Default)]
pub struct InMemoryTekStore {
    rows: Mutex<HashMap<String, TekRecord>>,
}

impl InMemoryTekStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TekStore for InMemoryTekStore {
    async fn get_active(&self, org: &OrgId) -> Result<Option<TekRecord>, KeyRegistryError> {
        let rows = self.rows.lock().expect("tek store lock poisoned");
        Ok(rows.get(org.as_str()).filter(|r| r.active).cloned())
    }

    async fn create_if_absent(&self, candidate: TekRecord) -> Result<TekRecord, KeyRegistryError> {
        let mut rows = self.rows.lock().expect("tek store lock poisoned");
        if let Some(existing) = rows.get(candidate.organization_id.as_str()) {
            if existing.active {
                return Ok(existing.clone());
            }
        }
        rows.insert(candidate.organization_id.as_str().to_string(), candidate.clone());
        Ok(candidate)
    }

    async fn rotate(
        &self,
        org: &OrgId,
        new_wrapped_tek: Vec<u8>,
        ork_hash: String,
    ) -> Result<TekRecord, KeyRegistryError> {
        let mut rows = self.rows.lock().expect("tek store lock poisoned");
        let prior_version = rows.get(org.as_str()).map(|r| r.version).unwrap_or(0);
        let record = TekRecord {
            organization_id: org.clone(),
            wrapped_tek: new_wrapped_tek,
            ork_hash,
            created_at: Utc::now(),
            rotated_at: None,
            version: prior_version + 1,
            active: true,
        };
        rows.insert(org.as_str().to_string(), record.clone());
        Ok(record)
    }
}
