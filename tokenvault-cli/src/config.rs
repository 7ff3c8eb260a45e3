//! Environment-variable configuration for the CLI binary. Same §6.5
//! surface as `tokenvault-api`'s config — the two binaries are bootstrapped
//! against the same deployment, just through different entry points, so
//! they recognise the same variable names.

use tokenvault_engine::EngineConfig;
use tokenvault_keys::StaticKek;
use tokenvault_store::DbConfig;

pub struct CliConfig {
    pub kek_base64: String,
    pub db: DbConfig,
    pub engine: EngineConfig,
}

impl CliConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let kek_base64 = std::env::var("TOKENVAULT_KEK_BASE64")
            .map_err(|_| anyhow::anyhow!("TOKENVAULT_KEK_BASE64 is required"))?;

        let db = DbConfig {
            host: std::env::var("TOKENVAULT_DB_HOST").unwrap_or_else(|_| "localhost".into()),
            port: env_parse("TOKENVAULT_DB_PORT", 5432),
            user: std::env::var("TOKENVAULT_DB_USER").unwrap_or_else(|_| "tokenvault".into()),
            password: std::env::var("TOKENVAULT_DB_PASSWORD").unwrap_or_default(),
            dbname: std::env::var("TOKENVAULT_DB_NAME").unwrap_or_else(|_| "tokenvault".into()),
            pool_max_size: env_parse("TOKENVAULT_DB_POOL_SIZE", 5),
        };

        let engine = EngineConfig {
            cache_only_write_through: env_flag("TOKENVAULT_CACHE_ONLY_WRITE_THROUGH"),
            preserve_decrypt_oracle: env_flag("TOKENVAULT_PRESERVE_DECRYPT_ORACLE"),
        };

        Ok(Self { kek_base64, db, engine })
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
