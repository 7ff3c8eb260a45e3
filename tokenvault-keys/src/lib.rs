//! Per-organization Tenant Encryption Key lifecycle and cache (§4.2).
//!
//! Given an organization id and the caller-presented Organization Root Key
//! (ORK), resolves the organization's active Tenant Encryption Key (TEK),
//! creating it on first use. Verifies the presented ORK against the stored
//! verifier hash before handing back anything derived from the TEK.
//!
//! What's NOT provided: durable storage (see `TekStore`, implemented for
//! Postgres in `tokenvault-store`), the platform KEK's source of truth
//! (loaded by `tokenvault-cli`), or orchestration of PII sealing itself
//! (`tokenvault-engine`).

mod audit;
mod error;
mod kek;
mod registry;
mod storage;
mod types;

pub use audit::{AuditAction, AuditEvent, AuditSink, InMemoryAuditSink, TracingAuditSink};
pub use error::KeyRegistryError;
pub use kek::{KekProvider, StaticKek};
pub use registry::KeyRegistry;
pub use storage::{InMemoryTekStore, TekStore};
pub use types::{OrgId, TekHandle, TekRecord};
