//! In-memory test doubles for `PiiStore` and `WriteThroughQueue`, mirroring
//! `tokenvault_keys::InMemoryTekStore`. Exported (not `#[cfg(test)]`-gated)
//! so `tokenvault-engine`'s own test suite can assemble a fully in-memory
//! engine without touching Postgres.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokenvault_keys::OrgId;

use crate::durable::PiiStore;
use crate::error::StoreError;
use crate::queue::WriteThroughQueue;
use crate::types::{PiiRecord, WriteThroughMessage};

#[derive(Default)]
pub struct InMemoryPiiStore {
    rows: Mutex<HashMap<String, PiiRecord>>,
}

impl InMemoryPiiStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PiiStore for InMemoryPiiStore {
    async fn upsert(&self, record: PiiRecord) -> Result<(), StoreError> {
        self.rows.lock().expect("pii store lock poisoned").insert(record.reference_hash.clone(), record);
        Ok(())
    }

    async fn get(&self, reference_hash: &str, organization_id: &OrgId) -> Result<Option<PiiRecord>, StoreError> {
        let rows = self.rows.lock().expect("pii store lock poisoned");
        Ok(rows.get(reference_hash).filter(|r| &r.organization_id == organization_id).cloned())
    }

    async fn delete_expired(&self, as_of: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut rows = self.rows.lock().expect("pii store lock poisoned");
        let before = rows.len();
        rows.retain(|_, r| r.expires_at > as_of);
        Ok((before - rows.len()) as u64)
    }
}

/// Delivers every enqueued message immediately on the next `claim` — there
/// is no real visibility timeout since there is no concurrent claimant to
/// protect against in a single-process test.
#[derive(Default)]
pub struct InMemoryQueue {
    messages: Mutex<Vec<WriteThroughMessage>>,
    next_id: Mutex<i64>,
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.messages.lock().expect("queue lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl WriteThroughQueue for InMemoryQueue {
    async fn enqueue(&self, record: PiiRecord) -> Result<(), StoreError> {
        let mut next_id = self.next_id.lock().expect("queue lock poisoned");
        *next_id += 1;
        let message_id = *next_id;
        drop(next_id);
        self.messages
            .lock()
            .expect("queue lock poisoned")
            .push(WriteThroughMessage { message_id, record, attempts: 0 });
        Ok(())
    }

    async fn claim(&self, batch_size: i64, _visibility_timeout: Duration) -> Result<Vec<WriteThroughMessage>, StoreError> {
        let mut messages = self.messages.lock().expect("queue lock poisoned");
        let take = (batch_size as usize).min(messages.len());
        Ok(messages.drain(0..take).map(|mut m| {
            m.attempts += 1;
            m
        }).collect())
    }

    async fn ack(&self, _message_id: i64) -> Result<(), StoreError> {
        Ok(())
    }

    async fn nack(&self, message_id: i64, backoff: Duration) -> Result<(), StoreError> {
        // Not tracked by id or delay in this test double; callers needing
        // redelivery semantics should re-enqueue explicitly.
        let _ = (message_id, backoff);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record(reference_hash: &str) -> PiiRecord {
        PiiRecord {
            reference_hash: reference_hash.to_string(),
            organization_id: OrgId::new("org-test"),
            ciphertext: vec![1, 2, 3],
            iv: vec![0u8; 12],
            data_type: "email".into(),
            client_id: "client-1".into(),
            created_at: Utc::now(),
            expires_at: Utc::now() + chrono::Duration::hours(24),
            updated_at: Utc::now(),
            metadata: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn in_memory_pii_store_round_trips() {
        let store = InMemoryPiiStore::new();
        store.upsert(sample_record("abc")).await.unwrap();
        let got = store.get("abc", &OrgId::new("org-test")).await.unwrap();
        assert!(got.is_some());
        assert_eq!(got.unwrap().reference_hash, "abc");
    }

    #[tokio::test]
    async fn in_memory_pii_store_hides_cross_tenant_rows() {
        let store = InMemoryPiiStore::new();
        store.upsert(sample_record("abc")).await.unwrap();
        let got = store.get("abc", &OrgId::new("org-other")).await.unwrap();
        assert!(got.is_none());
    }

    #[tokio::test]
    async fn in_memory_queue_claim_drains_messages() {
        let queue = InMemoryQueue::new();
        queue.enqueue(sample_record("a")).await.unwrap();
        queue.enqueue(sample_record("b")).await.unwrap();
        let claimed = queue.claim(10, Duration::from_secs(30)).await.unwrap();
        assert_eq!(claimed.len(), 2);
        assert!(queue.is_empty());
    }
}
