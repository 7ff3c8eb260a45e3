//! DDL for the three tables this crate owns. Applying these is
//! `tokenvault-cli`'s migration-runner job (out of scope here); this module
//! is the single source of truth for what that runner executes.
//!
//! `pii_tokens` and `organization_teks` are verbatim §6.2.

pub const CREATE_PII_TOKENS: &str = r#"
CREATE TABLE IF NOT EXISTS pii_tokens (
    reference_hash  VARCHAR(64) PRIMARY KEY,
    organization_id VARCHAR(255) NOT NULL,
    ciphertext      BYTEA NOT NULL,
    iv              BYTEA NOT NULL,
    data_type       VARCHAR(50) NOT NULL,
    client_id       VARCHAR(255) NOT NULL,
    created_at      TIMESTAMPTZ NOT NULL,
    expires_at      TIMESTAMPTZ NOT NULL,
    updated_at      TIMESTAMPTZ NOT NULL,
    metadata        JSONB NOT NULL DEFAULT '{}'
);
CREATE INDEX IF NOT EXISTS pii_tokens_org_reference_idx ON pii_tokens (organization_id, reference_hash);
CREATE INDEX IF NOT EXISTS pii_tokens_expires_at_idx ON pii_tokens (expires_at);
"#;

pub const CREATE_ORGANIZATION_TEKS: &str = r#"
CREATE TABLE IF NOT EXISTS organization_teks (
    organization_id VARCHAR(255) PRIMARY KEY,
    wrapped_tek     BYTEA NOT NULL,
    ork_hash        VARCHAR(64) NOT NULL,
    created_at      TIMESTAMPTZ NOT NULL,
    rotated_at      TIMESTAMPTZ NULL,
    version         INT NOT NULL DEFAULT 1,
    active          BOOLEAN NOT NULL DEFAULT true
);
CREATE INDEX IF NOT EXISTS organization_teks_active_idx ON organization_teks (organization_id) WHERE active;
"#;

/// `store_pii_queue`: a durable, transactional queue implemented as a
/// table rather than a separate broker — none of the example repos this
/// project was grounded on pulls in a message-broker crate, and a
/// `SELECT ... FOR UPDATE SKIP LOCKED` poll against the same Postgres
/// instance already backing the durable store gives the same
/// at-least-once, crash-safe delivery without a second moving part.
pub const CREATE_STORE_PII_QUEUE: &str = r#"
CREATE TABLE IF NOT EXISTS store_pii_queue (
    message_id BIGSERIAL PRIMARY KEY,
    reference_hash TEXT NOT NULL,
    payload JSONB NOT NULL,
    attempts INTEGER NOT NULL DEFAULT 0,
    visible_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    enqueued_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
CREATE INDEX IF NOT EXISTS store_pii_queue_visible_at_idx ON store_pii_queue (visible_at);
"#;

pub const ALL_STATEMENTS: &[&str] = &[CREATE_ORGANIZATION_TEKS, CREATE_PII_TOKENS, CREATE_STORE_PII_QUEUE];
