//! The write-through queue, implemented as a Postgres table rather than a
//! separate broker (see `schema::CREATE_STORE_PII_QUEUE`). A poll claims a
//! batch of visible rows with `SELECT ... FOR UPDATE SKIP LOCKED` and pushes
//! their `visible_at` into the future for the visibility timeout, so a
//! worker that crashes mid-processing lets another worker reclaim the
//! message instead of losing it — at-least-once delivery (§4.4, §6.3).

use std::time::Duration;

use async_trait::async_trait;
use deadpool_postgres::Pool;

use crate::error::StoreError;
use crate::types::{PiiRecord, WriteThroughMessage};

#[async_trait]
pub trait WriteThroughQueue: Send + Sync {
    async fn enqueue(&self, record: PiiRecord) -> Result<(), StoreError>;
    async fn claim(&self, batch_size: i64, visibility_timeout: Duration) -> Result<Vec<WriteThroughMessage>, StoreError>;
    async fn ack(&self, message_id: i64) -> Result<(), StoreError>;
    /// Delays the message's next visibility by `backoff` instead of
    /// releasing it immediately, for a worker that failed to process it.
    /// Callers pass the same visibility timeout `claim` uses, so a store
    /// that is down gets the same breathing room between retries that a
    /// crashed worker's un-acked message would (§4.3(4)).
    async fn nack(&self, message_id: i64, backoff: Duration) -> Result<(), StoreError>;
}

pub struct PostgresQueue {
    pool: Pool,
}

impl PostgresQueue {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WriteThroughQueue for PostgresQueue {
    async fn enqueue(&self, record: PiiRecord) -> Result<(), StoreError> {
        let client = self.pool.get().await?;
        let payload = serde_json::to_value(&record)
            .map_err(|e| StoreError::Unavailable(format!("failed to serialize queue payload: {e}")))?;
        client
            .execute(
                "INSERT INTO store_pii_queue (reference_hash, payload) VALUES ($1, $2)",
                &[&record.reference_hash, &payload],
            )
            .await?;
        Ok(())
    }

    async fn claim(&self, batch_size: i64, visibility_timeout: Duration) -> Result<Vec<WriteThroughMessage>, StoreError> {
        let mut client = self.pool.get().await?;
        let tx = client.transaction().await?;

        let rows = tx
            .query(
                "SELECT message_id, payload, attempts FROM store_pii_queue \
                 WHERE visible_at <= now() \
                 ORDER BY message_id \
                 FOR UPDATE SKIP LOCKED \
                 LIMIT $1",
                &[&batch_size],
            )
            .await?;

        let timeout_secs = visibility_timeout.as_secs_f64();
        let mut messages = Vec::with_capacity(rows.len());
        for row in &rows {
            let message_id: i64 = row.get("message_id");
            tx.execute(
                "UPDATE store_pii_queue SET visible_at = now() + ($2 || ' seconds')::interval, attempts = attempts + 1 \
                 WHERE message_id = $1",
                &[&message_id, &timeout_secs.to_string()],
            )
            .await?;
        }
        tx.commit().await?;

        let mut poisoned = Vec::new();
        for row in rows {
            let message_id: i64 = row.get("message_id");
            let attempts: i32 = row.get("attempts");
            let payload: serde_json::Value = row.get("payload");
            match serde_json::from_value::<PiiRecord>(payload) {
                Ok(record) => messages.push(WriteThroughMessage { message_id, record, attempts: attempts + 1 }),
                Err(err) => {
                    tracing::warn!(message_id, error = %err, "dropping unmarshallable queue message (poison pill)");
                    poisoned.push(message_id);
                }
            }
        }

        for message_id in poisoned {
            self.ack(message_id).await?;
        }

        Ok(messages)
    }

    async fn ack(&self, message_id: i64) -> Result<(), StoreError> {
        let client = self.pool.get().await?;
        client
            .execute("DELETE FROM store_pii_queue WHERE message_id = $1", &[&message_id])
            .await?;
        Ok(())
    }

    async fn nack(&self, message_id: i64, backoff: Duration) -> Result<(), StoreError> {
        let client = self.pool.get().await?;
        let backoff_secs = backoff.as_secs_f64();
        client
            .execute(
                "UPDATE store_pii_queue SET visible_at = now() + ($2 || ' seconds')::interval \
                 WHERE message_id = $1",
                &[&message_id, &backoff_secs.to_string()],
            )
            .await?;
        Ok(())
    }
}
