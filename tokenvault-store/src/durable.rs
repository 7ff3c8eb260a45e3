//! The durable store: Postgres-backed `TekStore` and `PiiStore`
//! implementations sharing one connection pool.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool_postgres::Pool;
use tokenvault_keys::{KeyRegistryError, OrgId, TekRecord, TekStore};

use crate::error::StoreError;
use crate::types::PiiRecord;

/// Persistence contract C4 needs from this crate for PII records (the
/// sibling of `tokenvault_keys::TekStore` for TEKs).
#[async_trait]
pub trait PiiStore: Send + Sync {
    /// Upsert by `reference_hash`: on conflict, replaces
    /// ciphertext/iv/data_type/client_id/expires_at/metadata and bumps
    /// `updated_at` (§4.3(4)).
    async fn upsert(&self, record: PiiRecord) -> Result<(), StoreError>;
    /// Looks up a record filtered by both `reference_hash` and
    /// `organization_id` — a row belonging to another organization is
    /// invisible even if the hash matches (§3 invariant 5).
    async fn get(&self, reference_hash: &str, organization_id: &OrgId) -> Result<Option<PiiRecord>, StoreError>;
    async fn delete_expired(&self, as_of: DateTime<Utc>) -> Result<u64, StoreError>;
}

pub struct PostgresStore {
    pool: Pool,
}

impl PostgresStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TekStore for PostgresStore {
    async fn get_active(&self, org: &OrgId) -> Result<Option<TekRecord>, KeyRegistryError> {
        let client = self.pool.get().await.map_err(StoreError::from)?;
        let row = client
            .query_opt(
                "SELECT organization_id, wrapped_tek, ork_hash, created_at, rotated_at, version, active \
                 FROM organization_teks WHERE organization_id = $1 AND active",
                &[&org.as_str()],
            )
            .await
            .map_err(StoreError::from)?;
        Ok(row.map(row_to_tek_record))
    }

    async fn create_if_absent(&self, candidate: TekRecord) -> Result<TekRecord, KeyRegistryError> {
        let client = self.pool.get().await.map_err(StoreError::from)?;

        client
            .execute(
                "INSERT INTO organization_teks \
                    (organization_id, wrapped_tek, ork_hash, created_at, rotated_at, version, active) \
                 VALUES ($1, $2, $3, $4, NULL, 1, true) \
                 ON CONFLICT (organization_id) DO NOTHING",
                &[
                    &candidate.organization_id.as_str(),
                    &candidate.wrapped_tek,
                    &candidate.ork_hash,
                    &candidate.created_at,
                ],
            )
            .await
            .map_err(StoreError::from)?;

        let row = client
            .query_one(
                "SELECT organization_id, wrapped_tek, ork_hash, created_at, rotated_at, version, active \
                 FROM organization_teks WHERE organization_id = $1",
                &[&candidate.organization_id.as_str()],
            )
            .await
            .map_err(StoreError::from)?;

        Ok(row_to_tek_record(row))
    }

    async fn rotate(
        &self,
        org: &OrgId,
        new_wrapped_tek: Vec<u8>,
        ork_hash: String,
    ) -> Result<TekRecord, KeyRegistryError> {
        let client = self.pool.get().await.map_err(StoreError::from)?;
        let now = Utc::now();

        let row = client
            .query_one(
                "UPDATE organization_teks \
                 SET wrapped_tek = $2, ork_hash = $3, rotated_at = $4, version = version + 1, active = true \
                 WHERE organization_id = $1 \
                 RETURNING organization_id, wrapped_tek, ork_hash, created_at, rotated_at, version, active",
                &[&org.as_str(), &new_wrapped_tek, &ork_hash, &now],
            )
            .await
            .map_err(StoreError::from)?;

        Ok(row_to_tek_record(row))
    }
}

#[async_trait]
impl PiiStore for PostgresStore {
    async fn upsert(&self, record: PiiRecord) -> Result<(), StoreError> {
        let client = self.pool.get().await?;
        let metadata = serde_json::to_value(&record.metadata)
            .map_err(|e| StoreError::Unavailable(format!("failed to serialize metadata: {e}")))?;
        client
            .execute(
                "INSERT INTO pii_tokens \
                    (reference_hash, organization_id, ciphertext, iv, data_type, client_id, \
                     created_at, expires_at, updated_at, metadata) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
                 ON CONFLICT (reference_hash) DO UPDATE SET \
                    ciphertext = EXCLUDED.ciphertext, \
                    iv = EXCLUDED.iv, \
                    data_type = EXCLUDED.data_type, \
                    client_id = EXCLUDED.client_id, \
                    expires_at = EXCLUDED.expires_at, \
                    metadata = EXCLUDED.metadata, \
                    updated_at = EXCLUDED.updated_at",
                &[
                    &record.reference_hash,
                    &record.organization_id.as_str(),
                    &record.ciphertext,
                    &record.iv,
                    &record.data_type,
                    &record.client_id,
                    &record.created_at,
                    &record.expires_at,
                    &record.updated_at,
                    &metadata,
                ],
            )
            .await?;
        Ok(())
    }

    async fn get(&self, reference_hash: &str, organization_id: &OrgId) -> Result<Option<PiiRecord>, StoreError> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                "SELECT reference_hash, organization_id, ciphertext, iv, data_type, client_id, \
                        created_at, expires_at, updated_at, metadata \
                 FROM pii_tokens WHERE reference_hash = $1 AND organization_id = $2",
                &[&reference_hash, &organization_id.as_str()],
            )
            .await?;
        row.map(row_to_pii_record).transpose()
    }

    async fn delete_expired(&self, as_of: DateTime<Utc>) -> Result<u64, StoreError> {
        let client = self.pool.get().await?;
        let affected = client
            .execute("DELETE FROM pii_tokens WHERE expires_at <= $1", &[&as_of])
            .await?;
        Ok(affected)
    }
}

fn row_to_tek_record(row: tokio_postgres::Row) -> TekRecord {
    TekRecord {
        organization_id: OrgId::new(row.get::<_, String>("organization_id")),
        wrapped_tek: row.get("wrapped_tek"),
        ork_hash: row.get("ork_hash"),
        created_at: row.get("created_at"),
        rotated_at: row.get("rotated_at"),
        version: row.get("version"),
        active: row.get("active"),
    }
}

fn row_to_pii_record(row: tokio_postgres::Row) -> Result<PiiRecord, StoreError> {
    let metadata_json: serde_json::Value = row.get("metadata");
    let metadata = serde_json::from_value(metadata_json)
        .map_err(|e| StoreError::Unavailable(format!("corrupt metadata column: {e}")))?;
    Ok(PiiRecord {
        reference_hash: row.get("reference_hash"),
        organization_id: OrgId::new(row.get::<_, String>("organization_id")),
        ciphertext: row.get("ciphertext"),
        iv: row.get("iv"),
        data_type: row.get("data_type"),
        client_id: row.get("client_id"),
        created_at: row.get("created_at"),
        expires_at: row.get("expires_at"),
        updated_at: row.get("updated_at"),
        metadata,
    })
}
