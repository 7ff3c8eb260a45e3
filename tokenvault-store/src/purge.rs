//! Periodic purge of expired `pii_tokens` rows. The hot cache already
//! stops serving a record once its mirrored TTL lapses, so this task only
//! needs to keep the durable store from growing unboundedly — it is not
//! load-bearing for correctness.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::durable::PiiStore;

pub fn spawn_purge_task(store: Arc<dyn PiiStore>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            match store.delete_expired(chrono::Utc::now()).await {
                Ok(deleted) if deleted > 0 => {
                    tracing::info!(deleted, "purged expired pii tokens");
                }
                Ok(_) => {}
                Err(err) => tracing::warn!(error = %err, "expiry purge failed"),
            }
        }
    })
}
