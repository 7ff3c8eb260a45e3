//! `KeyRegistry`: create-on-first-use TEK lifecycle, ORK verification, and
//! the per-organization cache (§4.2).

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tokenvault_crypto::{constant_time_eq, random_bytes, sha256_hex, zeroise, SecretKey32};

use crate::audit::{AuditAction, AuditEvent, AuditSink};
use crate::error::KeyRegistryError;
use crate::kek::KekProvider;
use crate::storage::TekStore;
use crate::types::{OrgId, TekHandle, TekRecord};

/// Default cache TTL for resolved TEK records. A rotated TEK can stay
/// visible to a cached reader for up to this long; acceptable because
/// rotation is an administrative, infrequent operation and the wrapped
/// bytes cached here are re-verified against the presented ORK on every
/// call regardless of cache freshness.
const CACHE_TTL: Duration = Duration::from_secs(300);
const CACHE_MAX_CAPACITY: u64 = 10_000;

pub struct KeyRegistry {
    store: Arc<dyn TekStore>,
    kek: Arc<dyn KekProvider>,
    audit: Arc<dyn AuditSink>,
    cache: Cache<String, TekRecord>,
}

impl KeyRegistry {
    pub fn new(store: Arc<dyn TekStore>, kek: Arc<dyn KekProvider>, audit: Arc<dyn AuditSink>) -> Self {
        let cache = Cache::builder()
            .max_capacity(CACHE_MAX_CAPACITY)
            .time_to_live(CACHE_TTL)
            .build();
        Self { store, kek, audit, cache }
    }

    /// Resolves the active TEK for `organization_id`, creating one on first
    /// use if none exists, and verifies `ork` against the stored verifier.
    /// Concurrent callers for the same organization share a single
    /// store-fetch-or-create via the cache's per-key fill-once semantics
    /// (§8 "TEK creation race").
    pub async fn resolve_tek(
        &self,
        organization_id: &OrgId,
        ork: &[u8],
    ) -> Result<TekHandle, KeyRegistryError> {
        let presented_hash = sha256_hex(ork);

        let store = Arc::clone(&self.store);
        let org = organization_id.clone();
        let fill_hash = presented_hash.clone();
        let kek = Arc::clone(&self.kek);
        let audit = Arc::clone(&self.audit);

        let record = self
            .cache
            .try_get_with(organization_id.as_str().to_string(), async move {
                load_or_create(store.as_ref(), kek.as_ref(), audit.as_ref(), &org, fill_hash).await
            })
            .await
            .map_err(|arc_err| (*arc_err).clone())?;

        if !constant_time_eq(record.ork_hash.as_bytes(), presented_hash.as_bytes()) {
            self.audit
                .record(AuditEvent::new(
                    organization_id.clone(),
                    AuditAction::OrkVerificationFailed,
                    false,
                ))
                .await;
            return Err(KeyRegistryError::OrkVerificationFailed);
        }

        Ok(TekHandle::from(record))
    }

    /// Side-effect-free probe that the platform KEK is usable: wraps and
    /// unwraps a throwaway value without touching the store or cache.
    /// Used by `tokenvault-engine`'s `HealthCheck` (§6.1) so a KEK that
    /// stops working mid-lifetime (e.g. an external KMS revoking access)
    /// is visible without polluting the store with a fake organization.
    pub fn kek_healthy(&self) -> bool {
        let probe = [0u8; 32];
        match self.kek.wrap(&probe, "__health_check__") {
            Ok(wrapped) => self.kek.unwrap(&wrapped, "__health_check__").is_ok(),
            Err(_) => false,
        }
    }

    /// Unwraps the plaintext TEK behind a resolved handle. Kept separate
    /// from `resolve_tek` so callers that only need metadata (version,
    /// organization id) never touch the KEK.
    pub async fn unwrap(&self, handle: &TekHandle) -> Result<SecretKey32, KeyRegistryError> {
        let record = handle.record();
        Ok(self.kek.unwrap(&record.wrapped_tek, record.organization_id.as_str())?)
    }

    /// Administrative rotation: marks the current record inactive, wraps a
    /// fresh 32-byte TEK under `ork`'s verifier, and invalidates the cache
    /// entry so the next `resolve_tek` call reads the new record.
    pub async fn rotate(&self, organization_id: &OrgId, ork: &[u8]) -> Result<TekRecord, KeyRegistryError> {
        let ork_hash = sha256_hex(ork);
        let wrapped = wrap_fresh_tek(self.kek.as_ref(), organization_id)?;
        let record = self.store.rotate(organization_id, wrapped, ork_hash).await?;
        self.cache.invalidate(organization_id.as_str()).await;
        self.audit
            .record(AuditEvent::new(organization_id.clone(), AuditAction::TekRotated, true))
            .await;
        Ok(record)
    }
}

async fn load_or_create(
    store: &dyn TekStore,
    kek: &dyn KekProvider,
    audit: &dyn AuditSink,
    organization_id: &OrgId,
    ork_hash_for_creation: String,
) -> Result<TekRecord, KeyRegistryError> {
    if let Some(existing) = store.get_active(organization_id).await? {
        return Ok(existing);
    }

    let wrapped = wrap_fresh_tek(kek, organization_id)?;
    let candidate = TekRecord {
        organization_id: organization_id.clone(),
        wrapped_tek: wrapped,
        ork_hash: ork_hash_for_creation,
        created_at: chrono::Utc::now(),
        rotated_at: None,
        version: 1,
        active: true,
    };
    let winner = store.create_if_absent(candidate).await?;
    audit
        .record(AuditEvent::new(organization_id.clone(), AuditAction::TekCreated, true))
        .await;
    Ok(winner)
}

fn wrap_fresh_tek(kek: &dyn KekProvider, organization_id: &OrgId) -> Result<Vec<u8>, KeyRegistryError> {
    let mut plaintext = random_bytes(32)?;
    let mut key_bytes = [0u8; 32];
    key_bytes.copy_from_slice(&plaintext);
    zeroise(&mut plaintext);
    let wrapped = kek.wrap(&key_bytes, organization_id.as_str());
    zeroise(&mut key_bytes);
    Ok(wrapped?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kek::StaticKek;
    use crate::storage::InMemoryTekStore;

    fn registry() -> KeyRegistry {
        KeyRegistry::new(
            Arc::new(InMemoryTekStore::new()),
            Arc::new(StaticKek::new([0x21u8; 32])),
            Arc::new(crate::audit::InMemoryAuditSink::new()),
        )
    }

    #[tokio::test]
    async fn resolve_tek_creates_on_first_use() {
        let registry = registry();
        let org = OrgId::new("org-a");
        let handle = registry.resolve_tek(&org, b"ork-secret").await.unwrap();
        assert_eq!(handle.organization_id(), &org);
        assert_eq!(handle.version(), 1);
    }

    #[tokio::test]
    async fn resolve_tek_is_stable_across_calls_with_same_ork() {
        let registry = registry();
        let org = OrgId::new("org-b");
        let first = registry.resolve_tek(&org, b"ork-secret").await.unwrap();
        let second = registry.resolve_tek(&org, b"ork-secret").await.unwrap();
        let k1 = registry.unwrap(&first).await.unwrap();
        let k2 = registry.unwrap(&second).await.unwrap();
        assert_eq!(k1.expose(), k2.expose());
    }

    #[tokio::test]
    async fn resolve_tek_rejects_wrong_ork_after_creation() {
        let registry = registry();
        let org = OrgId::new("org-c");
        registry.resolve_tek(&org, b"correct-ork").await.unwrap();
        let result = registry.resolve_tek(&org, b"wrong-ork").await;
        assert!(matches!(result, Err(KeyRegistryError::OrkVerificationFailed)));
    }

    #[tokio::test]
    async fn concurrent_resolve_with_same_ork_creates_exactly_one_tek() {
        let registry = Arc::new(registry());
        let org = OrgId::new("org-d");
        let mut handles = Vec::new();
        for _ in 0..8 {
            let registry = Arc::clone(&registry);
            let org = org.clone();
            handles.push(tokio::spawn(async move { registry.resolve_tek(&org, b"shared-ork").await }));
        }
        let mut versions = Vec::new();
        for h in handles {
            versions.push(h.await.unwrap().unwrap().version());
        }
        assert!(versions.iter().all(|&v| v == 1));
    }

    #[tokio::test]
    async fn rotate_invalidates_cache_and_bumps_version() {
        let registry = registry();
        let org = OrgId::new("org-e");
        registry.resolve_tek(&org, b"ork-1").await.unwrap();
        registry.rotate(&org, b"ork-2").await.unwrap();
        let handle = registry.resolve_tek(&org, b"ork-2").await.unwrap();
        assert_eq!(handle.version(), 2);
    }
}
