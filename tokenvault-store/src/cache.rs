//! Hot cache mirroring `pii_tokens.expires_at`: a record's cache lifetime
//! never outlives its retention expiry, so a cache hit is always safe to
//! serve without rechecking the durable store's expiry column.
//!
//! Populated only by write-through (§4.3 read path) — `get` never inserts,
//! so a cache filled only by guessed references is not possible.

use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::future::Cache;
use moka::Expiry;
use tokenvault_keys::OrgId;

use crate::types::PiiRecord;

const MAX_CAPACITY: u64 = 100_000;

struct ExpiresAtPolicy;

impl Expiry<String, PiiRecord> for ExpiresAtPolicy {
    fn expire_after_create(&self, _key: &String, value: &PiiRecord, _created_at: Instant) -> Option<Duration> {
        let remaining = value.expires_at.signed_duration_since(chrono::Utc::now());
        Some(Duration::from_secs(remaining.num_seconds().max(0) as u64))
    }
}

pub struct HotCache {
    cache: Cache<String, PiiRecord>,
}

impl HotCache {
    pub fn new() -> Self {
        let cache = Cache::builder()
            .max_capacity(MAX_CAPACITY)
            .expire_after(ExpiresAtPolicy)
            .build();
        Self { cache }
    }

    /// Returns the record if present, unexpired, and owned by
    /// `organization_id`. A hit belonging to a different organization is
    /// treated as corrupt: removed from the cache and reported as a miss,
    /// the same handling as a malformed entry (§4.3(1)).
    pub async fn get(&self, reference_hash: &str, organization_id: &OrgId) -> Option<PiiRecord> {
        let record = self.cache.get(reference_hash).await?;
        if &record.organization_id != organization_id {
            self.cache.invalidate(reference_hash).await;
            return None;
        }
        Some(record)
    }

    /// Write-through insert. A record whose `expires_at` has already
    /// passed is silently not cached rather than inserted with a
    /// negative/zero TTL.
    pub async fn insert(&self, record: PiiRecord) {
        if record.expires_at <= chrono::Utc::now() {
            return;
        }
        self.cache.insert(record.reference_hash.clone(), record).await;
    }

    pub async fn invalidate(&self, reference_hash: &str) {
        self.cache.invalidate(reference_hash).await;
    }
}

impl Default for HotCache {
    fn default() -> Self {
        Self::new()
    }
}

pub type SharedHotCache = Arc<HotCache>;

#[cfg(test)]
mod tests {
    use super::*;

    fn record(reference_hash: &str, organization_id: &str, expires_at: chrono::DateTime<chrono::Utc>) -> PiiRecord {
        PiiRecord {
            reference_hash: reference_hash.to_string(),
            organization_id: OrgId::new(organization_id),
            ciphertext: vec![9, 9, 9],
            iv: vec![0u8; 12],
            data_type: "email".into(),
            client_id: "client-1".into(),
            created_at: chrono::Utc::now(),
            expires_at,
            updated_at: chrono::Utc::now(),
            metadata: Default::default(),
        }
    }

    fn future(secs: i64) -> chrono::DateTime<chrono::Utc> {
        chrono::Utc::now() + chrono::Duration::seconds(secs)
    }

    #[tokio::test]
    async fn insert_then_get_round_trips() {
        let cache = HotCache::new();
        cache.insert(record("ref-1", "org-a", future(3600))).await;
        let got = cache.get("ref-1", &OrgId::new("org-a")).await;
        assert_eq!(got.unwrap().reference_hash, "ref-1");
    }

    #[tokio::test]
    async fn invalidate_removes_entry() {
        let cache = HotCache::new();
        cache.insert(record("ref-2", "org-a", future(3600))).await;
        cache.invalidate("ref-2").await;
        assert!(cache.get("ref-2", &OrgId::new("org-a")).await.is_none());
    }

    #[tokio::test]
    async fn already_expired_record_is_never_cached() {
        let cache = HotCache::new();
        let past = chrono::Utc::now() - chrono::Duration::seconds(5);
        cache.insert(record("ref-3", "org-a", past)).await;
        assert!(cache.get("ref-3", &OrgId::new("org-a")).await.is_none());
    }

    #[tokio::test]
    async fn cross_tenant_read_is_rejected_as_miss() {
        let cache = HotCache::new();
        cache.insert(record("ref-4", "org-a", future(3600))).await;
        assert!(cache.get("ref-4", &OrgId::new("org-b")).await.is_none());
        // The mismatched read also evicted the entry; org-a's own read now misses too.
        assert!(cache.get("ref-4", &OrgId::new("org-a")).await.is_none());
    }
}
