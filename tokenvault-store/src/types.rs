//! The durable record and its queue envelope.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokenvault_keys::OrgId;

/// `pii_tokens` row, exactly as §6.2: `{reference_hash, organization_id,
/// ciphertext, iv, data_type, client_id, created_at, expires_at,
/// updated_at, metadata}`. `ciphertext` and `iv` are stored as separate
/// columns (not a combined envelope blob) to match the durable schema;
/// `iv` is always exactly 12 bytes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PiiRecord {
    pub reference_hash: String,
    pub organization_id: OrgId,
    pub ciphertext: Vec<u8>,
    pub iv: Vec<u8>,
    pub data_type: String,
    pub client_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub metadata: HashMap<String, String>,
}

/// A write-through message drained by the worker pool into the durable
/// store. One queued per `Tokenize` call; the HTTP/RPC response does not
/// wait for this to drain (§4.4, §6.3).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WriteThroughMessage {
    pub message_id: i64,
    pub record: PiiRecord,
    pub attempts: i32,
}
