//! Environment-variable configuration (§6.5), in the manner of
//! `citadel-api`'s documented `CITADEL_*` env-var block — a flat list of
//! recognised variables with defaults, read once at startup.
//!
//! ```text
//! TOKENVAULT_PORT                 Listen port (default: 8080)
//! TOKENVAULT_KEK_BASE64           Base64-encoded 32-byte platform KEK (required)
//! TOKENVAULT_DB_HOST              Postgres host (default: localhost)
//! TOKENVAULT_DB_PORT              Postgres port (default: 5432)
//! TOKENVAULT_DB_USER              Postgres user (default: tokenvault)
//! TOKENVAULT_DB_PASSWORD          Postgres password (default: empty)
//! TOKENVAULT_DB_NAME              Postgres database name (default: tokenvault)
//! TOKENVAULT_DB_POOL_SIZE         Max pool size (default: 25)
//! TOKENVAULT_WORKER_COUNT         Write-through worker count (default: 3)
//! TOKENVAULT_VISIBILITY_TIMEOUT_SECS  Queue visibility timeout (default: 300)
//! TOKENVAULT_QUEUE_BATCH_SIZE     Queue read batch size K (default: 10)
//! TOKENVAULT_CACHE_ONLY_WRITE_THROUGH  "true" to tolerate a down queue (default: false)
//! TOKENVAULT_PRESERVE_DECRYPT_ORACLE   "true" to keep the pre-rewrite error split (default: false)
//! TOKENVAULT_LOG_FORMAT           "json" for structured logs, anything else for pretty (default: pretty)
//! ```

use std::time::Duration;

use tokenvault_engine::EngineConfig;
use tokenvault_keys::StaticKek;
use tokenvault_store::{DbConfig, WorkerPoolConfig};

pub struct ApiConfig {
    pub port: u16,
    pub log_format: String,
    pub kek_base64: String,
    pub db: DbConfig,
    pub workers: WorkerPoolConfig,
    pub engine: EngineConfig,
}

impl ApiConfig {
    /// Loads configuration from the environment. A missing or malformed
    /// KEK fails startup loudly rather than falling back to a default key
    /// (§6.5: "KEK length must be exactly 32 bytes after decoding;
    /// otherwise startup fails" — checked again in [`ApiConfig::load_kek`]).
    pub fn from_env() -> anyhow::Result<Self> {
        let port = env_parse("TOKENVAULT_PORT", 8080);
        let log_format = std::env::var("TOKENVAULT_LOG_FORMAT").unwrap_or_else(|_| "pretty".into());
        let kek_base64 = std::env::var("TOKENVAULT_KEK_BASE64")
            .map_err(|_| anyhow::anyhow!("TOKENVAULT_KEK_BASE64 is required"))?;

        let db = DbConfig {
            host: std::env::var("TOKENVAULT_DB_HOST").unwrap_or_else(|_| "localhost".into()),
            port: env_parse("TOKENVAULT_DB_PORT", 5432),
            user: std::env::var("TOKENVAULT_DB_USER").unwrap_or_else(|_| "tokenvault".into()),
            password: std::env::var("TOKENVAULT_DB_PASSWORD").unwrap_or_default(),
            dbname: std::env::var("TOKENVAULT_DB_NAME").unwrap_or_else(|_| "tokenvault".into()),
            pool_max_size: env_parse("TOKENVAULT_DB_POOL_SIZE", 25),
        };

        let workers = WorkerPoolConfig {
            worker_count: env_parse("TOKENVAULT_WORKER_COUNT", 3),
            poll_interval: Duration::from_millis(200),
            batch_size: env_parse("TOKENVAULT_QUEUE_BATCH_SIZE", 10),
            visibility_timeout: Duration::from_secs(env_parse("TOKENVAULT_VISIBILITY_TIMEOUT_SECS", 300)),
        };

        let engine = EngineConfig {
            cache_only_write_through: env_flag("TOKENVAULT_CACHE_ONLY_WRITE_THROUGH"),
            preserve_decrypt_oracle: env_flag("TOKENVAULT_PRESERVE_DECRYPT_ORACLE"),
        };

        Ok(Self { port, log_format, kek_base64, db, workers, engine })
    }

    pub fn load_kek(&self) -> anyhow::Result<StaticKek> {
        StaticKek::from_base64(&self.kek_base64).map_err(|e| anyhow::anyhow!("{e}"))
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_flag(key: &str) -> bool {
    std::env::var(key).map(|v| v == "true").unwrap_or(false)
}
