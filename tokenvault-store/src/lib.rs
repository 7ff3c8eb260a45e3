//! Durable persistence, write-through queue, and hot cache (§4.3, §6).
//!
//! Sits underneath `tokenvault-engine`: a Postgres-backed `TekStore` (the
//! contract `tokenvault-keys` needs), a `PiiStore` for token records, a
//! table-backed `WriteThroughQueue`, a TTL-mirrored `HotCache`, and the
//! background tasks (worker pool, expiry purge) that tie them together.

mod cache;
mod db;
mod durable;
mod error;
mod queue;
mod schema;
mod testing;
mod types;
mod workers;
mod purge;

pub use cache::{HotCache, SharedHotCache};
pub use db::{database_pool, DbConfig};
pub use durable::{PiiStore, PostgresStore};
pub use error::StoreError;
pub use purge::spawn_purge_task;
pub use queue::{PostgresQueue, WriteThroughQueue};
pub use schema::ALL_STATEMENTS;
pub use testing::{InMemoryPiiStore, InMemoryQueue};
pub use types::{PiiRecord, WriteThroughMessage};
pub use workers::{spawn_worker_pool, WorkerPoolConfig};
