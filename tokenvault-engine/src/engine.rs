//! `Engine`: orchestrates C1–C3 to implement `Tokenize`/`Detokenize` (§4.4).
//!
//! This is the only module in the workspace that is allowed to see
//! plaintext PII, an ORK, or a derived FDK at the same time — every other
//! crate only ever handles one secret at a time by construction. Every
//! exit path (including the `?` early returns below) drops the `Secret`
//! wrappers it allocated, which zeroises them.

use std::sync::Arc;

use chrono::Utc;
use tokenvault_crypto::{hkdf32, open, random_bytes, seal, Secret};
use tokenvault_keys::{AuditAction, AuditEvent, AuditSink, KeyRegistry, KeyRegistryError, OrgId};
use tokenvault_store::{PiiRecord, PiiStore, SharedHotCache, WriteThroughQueue};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::types::{
    DataType, DetokenizeRequest, DetokenizeResponse, HealthDetails, HealthStatus, TekSummary, TokenizeRequest,
    TokenizeResponse, TOKEN_TYPE,
};
use crate::validation::{validate_detokenize, validate_tokenize};

pub struct Engine {
    keys: Arc<KeyRegistry>,
    store: Arc<dyn PiiStore>,
    cache: SharedHotCache,
    queue: Arc<dyn WriteThroughQueue>,
    audit: Arc<dyn AuditSink>,
    config: EngineConfig,
}

impl Engine {
    pub fn new(
        keys: Arc<KeyRegistry>,
        store: Arc<dyn PiiStore>,
        cache: SharedHotCache,
        queue: Arc<dyn WriteThroughQueue>,
        audit: Arc<dyn AuditSink>,
        config: EngineConfig,
    ) -> Self {
        Self { keys, store, cache, queue, audit, config }
    }

    /// Validate → resolve-or-create TEK → derive FDK → seal → allocate
    /// reference → write-through cache → enqueue durable persist → return
    /// reference (§2 control flow, §4.4 `Tokenize` contract).
    pub async fn tokenize(&self, req: TokenizeRequest) -> Result<TokenizeResponse, EngineError> {
        let data_type = validate_tokenize(&req)?;
        let organization_id = OrgId::new(req.organization_id.clone());
        let retention = crate::types::RetentionPolicy::parse_or_default(req.retention_policy.as_deref());

        let handle = self.keys.resolve_tek(&organization_id, req.ork.expose().as_bytes()).await?;
        let tek = self.keys.unwrap(&handle).await?;

        let fdk = hkdf32(tek.expose(), req.ork.expose().as_bytes(), b"")?;
        let fdk = Secret::new(fdk);
        drop(tek);

        let aad = pii_aad(&organization_id, data_type);
        let (iv, ciphertext) = seal(fdk.expose(), req.data.as_bytes(), Some(&aad))?;
        drop(fdk);

        let reference_hash = hex::encode(random_bytes(16)?);
        let now = Utc::now();
        let expires_at = now + chrono::Duration::hours(retention.hours());

        let record = PiiRecord {
            reference_hash: reference_hash.clone(),
            organization_id: organization_id.clone(),
            ciphertext,
            iv: iv.to_vec(),
            data_type: data_type.as_str().to_string(),
            client_id: req.client_id.clone(),
            created_at: now,
            expires_at,
            updated_at: now,
            metadata: req.metadata.clone(),
        };

        self.cache.insert(record.clone()).await;

        if let Err(err) = self.queue.enqueue(record).await {
            if !self.config.cache_only_write_through {
                return Err(EngineError::PersistUnavailable(err.to_string()));
            }
            tracing::warn!(
                organization_id = %organization_id,
                error = %err,
                "write-through queue unavailable, continuing in cache-only mode"
            );
        }

        self.audit
            .record(
                AuditEvent::new(organization_id, AuditAction::PiiTokenized, true)
                    .with_reference(format!("tok_{reference_hash}")),
            )
            .await;

        Ok(TokenizeResponse {
            reference: format!("tok_{reference_hash}"),
            token_type: TOKEN_TYPE.to_string(),
            expires_at,
            status: "success",
        })
    }

    /// Validate → locate record (cache then store) → resolve/verify TEK →
    /// derive FDK → open → zeroise plaintext after return → audit (§4.4
    /// `Detokenize` contract).
    pub async fn detokenize(&self, req: DetokenizeRequest) -> Result<DetokenizeResponse, EngineError> {
        let reference_hash = validate_detokenize(&req)?.to_string();
        let organization_id = OrgId::new(req.organization_id.clone());

        let record = self.locate_record(&reference_hash, &organization_id).await?;

        let result = self.decrypt_record(&record, req.ork.expose().as_bytes()).await;

        match &result {
            Ok(_) => {
                self.audit
                    .record(
                        AuditEvent::new(organization_id, AuditAction::PiiDetokenized, true)
                            .with_reference(req.reference.clone())
                            .with_detail(format!("purpose={};service={}", req.purpose, req.requesting_service)),
                    )
                    .await;
            }
            Err(EngineError::DecryptionFailed) => {
                self.audit
                    .record(
                        AuditEvent::new(organization_id, AuditAction::DetokenizeFailed, false)
                            .with_reference(req.reference.clone())
                            .with_detail(format!("purpose={};service={}", req.purpose, req.requesting_service)),
                    )
                    .await;
            }
            Err(_) => {}
        }

        let plaintext = result?;

        Ok(DetokenizeResponse {
            data: String::from_utf8_lossy(plaintext.expose()).into_owned(),
            data_type: record.data_type,
            original_timestamp: record.created_at,
            access_logged: true,
            status: "success",
        })
    }

    async fn locate_record(&self, reference_hash: &str, organization_id: &OrgId) -> Result<PiiRecord, EngineError> {
        if let Some(record) = self.cache.get(reference_hash, organization_id).await {
            return Ok(record);
        }

        let stored = self.store.get(reference_hash, organization_id).await?;
        match stored {
            Some(record) if record.expires_at > Utc::now() => Ok(record),
            // Expired and cross-tenant both surface identically: "not
            // found" (§3 invariant 5, 6; §7 propagation).
            _ => Err(EngineError::NotFound),
        }
    }

    /// Resolves and unwraps the TEK, derives the FDK, and opens the
    /// ciphertext. An `ORK_VERIFICATION_FAILED` from the key registry is
    /// folded into `DecryptionFailed` here — the detokenize contract (§4.4)
    /// has no `ORK_VERIFICATION_FAILED` variant, since a wrong ORK on the
    /// read path is indistinguishable from a tampered ciphertext by design
    /// (§7, §9 Open Question).
    async fn decrypt_record(&self, record: &PiiRecord, ork: &[u8]) -> Result<Secret<Vec<u8>>, EngineError> {
        let handle = match self.keys.resolve_tek(&record.organization_id, ork).await {
            Ok(handle) => handle,
            Err(KeyRegistryError::OrkVerificationFailed) => return Err(EngineError::DecryptionFailed),
            Err(other) => return Err(other.into()),
        };
        let tek = self.keys.unwrap(&handle).await?;

        let fdk = hkdf32(tek.expose(), ork, b"")?;
        let fdk = Secret::new(fdk);
        drop(tek);

        let data_type = DataType::parse(&record.data_type).map_err(|_| EngineError::Internal("corrupt data_type column".into()))?;
        let aad = pii_aad(&record.organization_id, data_type);

        let plaintext = open(fdk.expose(), &record.iv, &record.ciphertext, Some(&aad)).map_err(|_| EngineError::DecryptionFailed)?;
        drop(fdk);

        Ok(Secret::new(plaintext))
    }

    /// `§6.1 HealthCheck`: a lightweight, side-effect-free probe of each
    /// backing tier. `kek` is probed by round-tripping a throwaway value
    /// through the registry's KEK rather than assumed healthy just because
    /// the process started — a KEK that stops working mid-lifetime (e.g. an
    /// external KMS revoking access) should show up here.
    pub async fn health_check(&self) -> HealthStatus {
        let kek = self.keys.kek_healthy();
        let store = self.store.get("0".repeat(32).as_str(), &OrgId::new("__health_check__")).await.is_ok();
        let queue = self.queue.claim(0, std::time::Duration::from_secs(1)).await.is_ok();
        let cache = {
            self.cache.invalidate("__health_check__").await;
            true
        };
        HealthStatus::from_details(HealthDetails { kek, store, queue, cache })
    }

    /// Administrative `StoreTEK`: forces rotation of an organization's TEK
    /// (§4.2 `rotate`). Not exposed over HTTP — only through
    /// `tokenvault-cli`'s out-of-band rotation tool (§6.1).
    pub async fn store_tek(&self, organization_id: &str, ork: &str) -> Result<TekSummary, EngineError> {
        let org = OrgId::new(organization_id);
        let record = self.keys.rotate(&org, ork.as_bytes()).await?;
        Ok(TekSummary::from(&record))
    }

    /// Administrative `RetrieveTEK`: resolves (creating if absent) and
    /// returns metadata only — see [`TekSummary`].
    pub async fn retrieve_tek(&self, organization_id: &str, ork: &str) -> Result<TekSummary, EngineError> {
        let org = OrgId::new(organization_id);
        let handle = self.keys.resolve_tek(&org, ork.as_bytes()).await?;
        Ok(TekSummary {
            organization_id: handle.organization_id().as_str().to_string(),
            version: handle.version(),
            created_at: Utc::now(),
            rotated_at: None,
            active: true,
        })
    }
}

/// AAD for sealing a PII record: `organization_id || 0x00 || data_type`
/// (§4.1). `seal` and `open` must agree on this exactly, so it lives in one
/// place rather than being reconstructed at each call site.
fn pii_aad(organization_id: &OrgId, data_type: DataType) -> Vec<u8> {
    let mut aad = organization_id.as_str().as_bytes().to_vec();
    aad.push(0x00);
    aad.extend_from_slice(data_type.as_str().as_bytes());
    aad
}
