//! Connection pool setup, grounded on the exponential-backoff
//! connect-check pattern used for the aggregator's database pool: build
//! the `deadpool_postgres` manager, then retry an initial connectivity
//! check with `backoff` before handing the pool back, so a container
//! racing a not-yet-ready database fails fast into a retry loop instead of
//! serving requests against a pool that has never proven it can connect.

use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod, Runtime};
use tokio_postgres::NoTls;

use crate::error::StoreError;

/// Configuration for the durable store's connection pool (§6.2, ambient
/// config surface).
#[derive(Clone, Debug)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub dbname: String,
    pub pool_max_size: usize,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 5432,
            user: "tokenvault".into(),
            password: String::new(),
            dbname: "tokenvault".into(),
            pool_max_size: 16,
        }
    }
}

/// Builds the pool and blocks until an initial connection succeeds, retrying
/// with exponential backoff up to 30 seconds total.
pub async fn database_pool(config: &DbConfig) -> Result<Pool, StoreError> {
    let mut pg_config = tokio_postgres::Config::new();
    pg_config
        .host(&config.host)
        .port(config.port)
        .user(&config.user)
        .password(&config.password)
        .dbname(&config.dbname);

    let manager_config = ManagerConfig { recycling_method: RecyclingMethod::Fast };
    let manager = Manager::from_config(pg_config, NoTls, manager_config);
    let pool = Pool::builder(manager)
        .max_size(config.pool_max_size)
        .runtime(Runtime::Tokio1)
        .build()
        .map_err(|e| StoreError::Unavailable(e.to_string()))?;

    let mut backoff = ExponentialBackoff {
        max_elapsed_time: Some(Duration::from_secs(30)),
        ..Default::default()
    };

    loop {
        match pool.get().await {
            Ok(_) => return Ok(pool),
            Err(err) => match backoff.next_backoff() {
                Some(delay) => {
                    tracing::warn!(error = %err, "database not yet reachable, retrying");
                    tokio::time::sleep(delay).await;
                }
                None => return Err(StoreError::Unavailable(err.to_string())),
            },
        }
    }
}
