//! tokenvault-api — thin HTTP adapter over the tokenisation engine.
//!
//! Surfaces exactly the §6.1 contracts this spec assigns to an HTTP
//! adapter: `POST /v1/tokenize`, `POST /v1/detokenize`, `GET /health`.
//! Everything else (authentication, rate limiting, a dashboard) is an
//! external collaborator per §1 — this binary does not grow one.

mod config;

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use tokenvault_engine::{
    DetokenizeRequest, Engine, EngineError, ExternalErrorCode, TokenizeRequest,
};
use tokenvault_keys::{KeyRegistry, TracingAuditSink};
use tokenvault_store::{database_pool, spawn_purge_task, spawn_worker_pool, HotCache, PostgresQueue, PostgresStore};

use config::ApiConfig;

struct AppState {
    engine: Engine,
    preserve_decrypt_oracle: bool,
}

type Shared = Arc<AppState>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ApiConfig::from_env()?;
    init_tracing(&config.log_format);

    let kek = config.load_kek()?;
    let pool = database_pool(&config.db).await.map_err(|e| anyhow::anyhow!("{e}"))?;
    let store = Arc::new(PostgresStore::new(pool.clone()));
    let queue = Arc::new(PostgresQueue::new(pool));
    let cache = Arc::new(HotCache::new());
    let audit = Arc::new(TracingAuditSink);

    let registry = Arc::new(KeyRegistry::new(store.clone(), Arc::new(kek), audit.clone()));
    let engine = Engine::new(registry, store.clone(), cache.clone(), queue.clone(), audit, config.engine.clone());

    spawn_worker_pool(queue, store.clone(), cache, config.workers.clone());
    spawn_purge_task(store, std::time::Duration::from_secs(3600));

    let state: Shared = Arc::new(AppState { engine, preserve_decrypt_oracle: config.engine.preserve_decrypt_oracle });

    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/v1/tokenize", post(tokenize_handler))
        .route("/v1/detokenize", post(detokenize_handler))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    tracing::info!(port = config.port, "tokenvault-api listening");
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

fn init_tracing(log_format: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tokenvault_api=info,tower_http=info".into());
    if log_format == "json" {
        tracing_subscriber::fmt().json().with_env_filter(env_filter).with_target(true).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }
}

async fn health_handler(State(state): State<Shared>) -> impl IntoResponse {
    let status = state.engine.health_check().await;
    let code = if status.status == "healthy" { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (code, Json(status))
}

async fn tokenize_handler(State(state): State<Shared>, Json(req): Json<TokenizeRequest>) -> Response {
    match state.engine.tokenize(req).await {
        Ok(resp) => (StatusCode::OK, Json(resp)).into_response(),
        Err(err) => error_response(&err, state.preserve_decrypt_oracle),
    }
}

async fn detokenize_handler(State(state): State<Shared>, Json(req): Json<DetokenizeRequest>) -> Response {
    match state.engine.detokenize(req).await {
        Ok(resp) => (StatusCode::OK, Json(resp)).into_response(),
        Err(err) => error_response(&err, state.preserve_decrypt_oracle),
    }
}

#[derive(Serialize)]
struct ErrorBody {
    status: &'static str,
    code: &'static str,
    message: &'static str,
}

/// Maps an `EngineError` to the wire format at the adapter boundary — the
/// one place an `EngineError` is allowed to turn into a status string
/// (§9 REDESIGN: tagged variants cross the engine boundary, sentinel
/// strings only appear here).
fn error_response(err: &EngineError, preserve_decrypt_oracle: bool) -> Response {
    let (code, message) = err.external(preserve_decrypt_oracle);
    let status = match code {
        ExternalErrorCode::ValidationError => StatusCode::BAD_REQUEST,
        ExternalErrorCode::NotFound => StatusCode::NOT_FOUND,
        ExternalErrorCode::OrkVerificationFailed => StatusCode::FORBIDDEN,
        ExternalErrorCode::KeyUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ExternalErrorCode::PersistUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ExternalErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    tracing::warn!(error = %err, "request failed");
    (status, Json(ErrorBody { status: "error", code: code_str(code), message })).into_response()
}

fn code_str(code: ExternalErrorCode) -> &'static str {
    match code {
        ExternalErrorCode::ValidationError => "VALIDATION_ERROR",
        ExternalErrorCode::NotFound => "NOT_FOUND",
        ExternalErrorCode::OrkVerificationFailed => "ORK_VERIFICATION_FAILED",
        ExternalErrorCode::KeyUnavailable => "KEY_UNAVAILABLE",
        ExternalErrorCode::PersistUnavailable => "PERSIST_UNAVAILABLE",
        ExternalErrorCode::Internal => "INTERNAL",
    }
}
