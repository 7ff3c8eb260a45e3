//! Worker pool draining the write-through queue into the durable store,
//! with a cache write-through on success. Spec default of 3 concurrent
//! workers, each polling independently — `SELECT ... FOR UPDATE SKIP
//! LOCKED` means two workers never claim the same row, so no additional
//! coordination is needed between them.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::cache::SharedHotCache;
use crate::durable::PiiStore;
use crate::queue::WriteThroughQueue;

#[derive(Clone, Debug)]
pub struct WorkerPoolConfig {
    pub worker_count: usize,
    pub poll_interval: Duration,
    pub batch_size: i64,
    pub visibility_timeout: Duration,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            worker_count: 3,
            poll_interval: Duration::from_millis(200),
            batch_size: 16,
            visibility_timeout: Duration::from_secs(30),
        }
    }
}

/// Spawns `config.worker_count` draining loops and returns their join
/// handles. Dropping every handle without aborting lets the loops run to
/// process shutdown; callers that need a clean stop should abort them.
pub fn spawn_worker_pool(
    queue: Arc<dyn WriteThroughQueue>,
    store: Arc<dyn PiiStore>,
    cache: SharedHotCache,
    config: WorkerPoolConfig,
) -> Vec<JoinHandle<()>> {
    (0..config.worker_count)
        .map(|worker_id| {
            let queue = Arc::clone(&queue);
            let store = Arc::clone(&store);
            let cache = Arc::clone(&cache);
            let config = config.clone();
            tokio::spawn(async move { drain_loop(worker_id, queue, store, cache, config).await })
        })
        .collect()
}

async fn drain_loop(
    worker_id: usize,
    queue: Arc<dyn WriteThroughQueue>,
    store: Arc<dyn PiiStore>,
    cache: SharedHotCache,
    config: WorkerPoolConfig,
) {
    loop {
        let claimed = match queue.claim(config.batch_size, config.visibility_timeout).await {
            Ok(messages) => messages,
            Err(err) => {
                tracing::warn!(worker_id, error = %err, "queue claim failed");
                tokio::time::sleep(config.poll_interval).await;
                continue;
            }
        };

        if claimed.is_empty() {
            tokio::time::sleep(config.poll_interval).await;
            continue;
        }

        for message in claimed {
            // Upsert is idempotent on `reference_hash`, so redelivering the
            // same message after a crash before `ack` just overwrites the
            // row with identical data instead of duplicating it.
            match store.upsert(message.record.clone()).await {
                Ok(()) => {
                    cache.insert(message.record.clone()).await;
                    if let Err(err) = queue.ack(message.message_id).await {
                        tracing::warn!(worker_id, error = %err, message_id = message.message_id, "failed to ack drained message");
                    }
                }
                Err(err) => {
                    tracing::warn!(
                        worker_id,
                        error = %err,
                        message_id = message.message_id,
                        attempts = message.attempts,
                        "failed to write through, will retry after visibility timeout"
                    );
                    let _ = queue.nack(message.message_id, config.visibility_timeout).await;
                }
            }
        }
    }
}
