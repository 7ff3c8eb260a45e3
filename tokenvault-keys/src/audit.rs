//! Audit event plumbing, generalized from the key registry's needs so
//! `tokenvault-engine` can reuse it for PII tokenize/detokenize events
//! rather than inventing a second sink trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::info;

use crate::types::OrgId;

/// What happened. `tokenvault-engine` extends this list with PII-record
/// events (`PiiTokenized`, `PiiDetokenized`, `DetokenizeFailed`) — this
/// crate only ever emits the TEK-lifecycle variants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuditAction {
    TekCreated,
    TekRotated,
    OrkVerificationFailed,
    PiiTokenized,
    PiiDetokenized,
    DetokenizeFailed,
}

impl AuditAction {
    fn as_str(&self) -> &'static str {
        match self {
            Self::TekCreated => "TEK_CREATED",
            Self::TekRotated => "TEK_ROTATED",
            Self::OrkVerificationFailed => "ORK_VERIFICATION_FAILED",
            Self::PiiTokenized => "PII_TOKENIZED",
            Self::PiiDetokenized => "PII_DETOKENIZED",
            Self::DetokenizeFailed => "DETOKENIZE_FAILED",
        }
    }
}

/// One row of the audit trail. `reference` is set for PII events and left
/// empty for TEK-lifecycle events.
#[derive(Clone, Debug)]
pub struct AuditEvent {
    pub timestamp: DateTime<Utc>,
    pub organization_id: OrgId,
    pub action: AuditAction,
    pub reference: Option<String>,
    pub success: bool,
    pub detail: Option<String>,
}

impl AuditEvent {
    pub fn new(organization_id: OrgId, action: AuditAction, success: bool) -> Self {
        Self {
            timestamp: Utc::now(),
            organization_id,
            action,
            reference: None,
            success,
            detail: None,
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Where audit events go. Writing the durable audit log is out of scope
/// (§1 Non-goals) — this trait is the contract an external collaborator
/// implements; the two sinks below cover logging and in-process tests.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, event: AuditEvent);
}

/// Emits each event as a structured `tracing` record. The default sink in
/// production — an external log shipper reads these off stdout/stderr.
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, event: AuditEvent) {
        info!(
            organization_id = %event.organization_id,
            action = event.action.as_str(),
            reference = event.reference.as_deref().unwrap_or(""),
            success = event.success,
            detail = event.detail.as_deref().unwrap_or(""),
            "audit event"
        );
    }
}

/// Collects events in memory. Used by tests that assert on what got
/// audited without standing up a log collector.
#[derive(Default)]
pub struct InMemoryAuditSink {
    events: tokio::sync::Mutex<Vec<AuditEvent>>,
}

impl InMemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().await.clone()
    }
}

#[async_trait]
impl AuditSink for InMemoryAuditSink {
    async fn record(&self, event: AuditEvent) {
        self.events.lock().await.push(event);
    }
}
