//! tokenvault — process bootstrap and operator tooling.
//!
//! Usage:
//!   tokenvault migrate
//!   tokenvault health
//!   tokenvault purge-once
//!   tokenvault workers
//!   tokenvault store-tek --org <id> --ork <key>
//!   tokenvault retrieve-tek --org <id> --ork <key>
//!
//! Everything here is out-of-band operator tooling per §6.1 — `store-tek`
//! and `retrieve-tek` are explicitly not exposed over HTTP (§4.2: rotation
//! is "a manual procedure"). `tokenvault-api` is the always-on request path;
//! this binary is what an operator runs once, or as a standalone worker
//! process, alongside it.

mod config;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use tokenvault_engine::{Engine, EngineError};
use tokenvault_keys::{InMemoryAuditSink, KeyRegistry, TracingAuditSink};
use tokenvault_store::{
    database_pool, spawn_purge_task, spawn_worker_pool, HotCache, PiiStore, PostgresQueue, PostgresStore,
    WorkerPoolConfig, ALL_STATEMENTS,
};

use config::CliConfig;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        return ExitCode::FAILURE;
    }

    let result = match args[1].as_str() {
        "migrate" => cmd_migrate().await,
        "health" => cmd_health().await,
        "purge-once" => cmd_purge_once().await,
        "workers" => cmd_workers().await,
        "store-tek" => cmd_store_tek(&args[2..]).await,
        "retrieve-tek" => cmd_retrieve_tek(&args[2..]).await,
        "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        "--version" | "-V" => {
            println!("tokenvault {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        cmd => {
            eprintln!("error: unknown command '{cmd}'");
            print_usage();
            Err(anyhow::anyhow!("unknown command"))
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn print_usage() {
    eprintln!(
        r#"tokenvault — PII tokenisation engine operator CLI

USAGE:
    tokenvault <COMMAND> [OPTIONS]

COMMANDS:
    migrate             Apply durable-store schema (pii_tokens, organization_teks, store_pii_queue)
    health              Run HealthCheck and print the result as JSON
    purge-once          Delete expired pii_tokens rows once and exit
    workers             Run the write-through worker pool and purge task in the foreground
    store-tek           Administrative TEK rotation: --org <id> --ork <key>
    retrieve-tek        Administrative TEK lookup (metadata only): --org <id> --ork <key>

OPTIONS:
    -h, --help       Print help
    -V, --version    Print version

All commands read connection and KEK configuration from the environment —
see TOKENVAULT_* variables documented in tokenvault-api.
"#
    );
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tokenvault_cli=info".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

/// Applies `tokenvault-store`'s DDL. Idempotent (`CREATE TABLE IF NOT
/// EXISTS`/`CREATE INDEX IF NOT EXISTS`) — safe to run against an
/// already-migrated database.
async fn cmd_migrate() -> anyhow::Result<()> {
    let config = CliConfig::from_env()?;
    let pool = database_pool(&config.db).await.map_err(|e| anyhow::anyhow!("{e}"))?;
    let client = pool.get().await?;
    for statement in ALL_STATEMENTS {
        client.batch_execute(statement).await?;
    }
    eprintln!("migration applied ({} statements)", ALL_STATEMENTS.len());
    Ok(())
}

/// Builds just enough of the engine to run `HealthCheck` and exits —
/// doesn't start the HTTP listener or worker pool.
async fn cmd_health() -> anyhow::Result<()> {
    let config = CliConfig::from_env()?;
    let kek = config.load_kek()?;
    let pool = database_pool(&config.db).await.map_err(|e| anyhow::anyhow!("{e}"))?;
    let store = Arc::new(PostgresStore::new(pool.clone()));
    let queue = Arc::new(PostgresQueue::new(pool));
    let cache = Arc::new(HotCache::new());
    let audit = Arc::new(InMemoryAuditSink::new());

    let registry = Arc::new(KeyRegistry::new(store.clone(), Arc::new(kek), audit.clone()));
    let engine = Engine::new(registry, store, cache, queue, audit, config.engine.clone());

    let status = engine.health_check().await;
    println!("{}", serde_json::to_string_pretty(&status)?);
    if status.status != "healthy" {
        return Err(anyhow::anyhow!("unhealthy: {:?}", status.details));
    }
    Ok(())
}

/// One-shot purge of expired `pii_tokens` rows. The periodic purge task
/// (`spawn_purge_task`) is what normally does this; this command exists so
/// an operator (or a cron job standing in for the scheduled task) can force
/// a pass without waiting out the interval.
async fn cmd_purge_once() -> anyhow::Result<()> {
    let config = CliConfig::from_env()?;
    let pool = database_pool(&config.db).await.map_err(|e| anyhow::anyhow!("{e}"))?;
    let store = PostgresStore::new(pool);
    let deleted = store.delete_expired(chrono::Utc::now()).await.map_err(|e| anyhow::anyhow!("{e}"))?;
    eprintln!("purged {deleted} expired row(s)");
    Ok(())
}

/// Runs the write-through worker pool and expiry purge task as a
/// standalone foreground process — for deployments that split the
/// always-on HTTP path (`tokenvault-api`) from the write-through drain
/// path onto separate fleets.
async fn cmd_workers() -> anyhow::Result<()> {
    let config = CliConfig::from_env()?;
    let pool = database_pool(&config.db).await.map_err(|e| anyhow::anyhow!("{e}"))?;
    let store = Arc::new(PostgresStore::new(pool.clone()));
    let queue = Arc::new(PostgresQueue::new(pool));
    let cache = Arc::new(HotCache::new());

    let handles = spawn_worker_pool(queue, store.clone(), cache, WorkerPoolConfig::default());
    spawn_purge_task(store, Duration::from_secs(3600));

    tracing::info!(workers = handles.len(), "tokenvault workers running");
    futures_wait_forever(handles).await;
    Ok(())
}

async fn futures_wait_forever(handles: Vec<tokio::task::JoinHandle<()>>) {
    for handle in handles {
        let _ = handle.await;
    }
}

/// Administrative `StoreTEK` (§4.2 `rotate`, §6.1): forces rotation of an
/// organization's TEK. Not reachable from `tokenvault-api` by design.
async fn cmd_store_tek(args: &[String]) -> anyhow::Result<()> {
    let (org, ork) = parse_org_ork(args)?;
    let engine = build_admin_engine().await?;
    match engine.store_tek(&org, &ork).await {
        Ok(summary) => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        }
        Err(err) => Err(anyhow::anyhow!(describe(&err))),
    }
}

/// Administrative `RetrieveTEK` (§6.1): resolves (creating if absent) and
/// prints metadata only — never key material.
async fn cmd_retrieve_tek(args: &[String]) -> anyhow::Result<()> {
    let (org, ork) = parse_org_ork(args)?;
    let engine = build_admin_engine().await?;
    match engine.retrieve_tek(&org, &ork).await {
        Ok(summary) => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        }
        Err(err) => Err(anyhow::anyhow!(describe(&err))),
    }
}

async fn build_admin_engine() -> anyhow::Result<Engine> {
    let config = CliConfig::from_env()?;
    let kek = config.load_kek()?;
    let pool = database_pool(&config.db).await.map_err(|e| anyhow::anyhow!("{e}"))?;
    let store = Arc::new(PostgresStore::new(pool.clone()));
    let queue = Arc::new(PostgresQueue::new(pool));
    let cache = Arc::new(HotCache::new());
    let audit = Arc::new(TracingAuditSink);

    let registry = Arc::new(KeyRegistry::new(store.clone(), Arc::new(kek), audit.clone()));
    Ok(Engine::new(registry, store, cache, queue, audit, config.engine))
}

fn parse_org_ork(args: &[String]) -> anyhow::Result<(String, String)> {
    let mut org: Option<String> = None;
    let mut ork: Option<String> = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--org" | "-o" => {
                i += 1;
                org = Some(args.get(i).ok_or_else(|| anyhow::anyhow!("missing value for --org"))?.clone());
            }
            "--ork" | "-k" => {
                i += 1;
                ork = Some(args.get(i).ok_or_else(|| anyhow::anyhow!("missing value for --ork"))?.clone());
            }
            other => return Err(anyhow::anyhow!("unknown option: {other}")),
        }
        i += 1;
    }

    Ok((
        org.ok_or_else(|| anyhow::anyhow!("missing --org"))?,
        ork.ok_or_else(|| anyhow::anyhow!("missing --ork"))?,
    ))
}

fn describe(err: &EngineError) -> String {
    err.to_string()
}
