//! Request/response payloads and the small enumerations the spec pins down
//! (allowed data types, retention policy tokens).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tokenvault_crypto::{Secret, SecretString};

use crate::error::EngineError;

/// Deserializes the wire `ork` string straight into a `Secret`, so the
/// plaintext `String` serde hands back from `Deserialize` never outlives
/// this function — it's moved into the `Secret` wrapper immediately and
/// zeroised on drop like every other ORK/TEK/FDK buffer in the engine
/// (§3 "ORK material... do[es] not survive the request that introduced
/// [it]").
fn deserialize_secret_string<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Secret::new(String::deserialize(deserializer)?))
}

/// `§6.3` allowed data types. Unknown values are rejected at validation —
/// unlike the retention policy table, there is no silent default here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Email,
    Phone,
    Ssn,
    CreditCard,
    Name,
    Address,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Ssn => "ssn",
            Self::CreditCard => "credit_card",
            Self::Name => "name",
            Self::Address => "address",
        }
    }

    pub fn parse(value: &str) -> Result<Self, EngineError> {
        match value {
            "email" => Ok(Self::Email),
            "phone" => Ok(Self::Phone),
            "ssn" => Ok(Self::Ssn),
            "credit_card" => Ok(Self::CreditCard),
            "name" => Ok(Self::Name),
            "address" => Ok(Self::Address),
            other => Err(EngineError::ValidationError(format!("unknown data_type: {other}"))),
        }
    }
}

/// `§4.4` retention policy table. An unrecognised token maps to `OneDay`
/// silently (documented spec behaviour, not a bug) — see
/// [`RetentionPolicy::parse_or_default`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetentionPolicy {
    OneDay,
    SevenDays,
    ThirtyDays,
    OneYear,
    SevenYears,
}

impl RetentionPolicy {
    pub fn hours(&self) -> i64 {
        match self {
            Self::OneDay => 24,
            Self::SevenDays => 168,
            Self::ThirtyDays => 720,
            Self::OneYear => 8_760,
            Self::SevenYears => 61_320,
        }
    }

    /// Unknown or absent policy tokens fall back to `OneDay`. This is the
    /// spec's documented behaviour (§4.4, §9 Open Question): a future wire
    /// format version may instead reject unknown tokens with
    /// `VALIDATION_ERROR`, but this version does not.
    pub fn parse_or_default(value: Option<&str>) -> Self {
        match value {
            Some("1day") | None => Self::OneDay,
            Some("7days") => Self::SevenDays,
            Some("30days") => Self::ThirtyDays,
            Some("1year") => Self::OneYear,
            Some("7years") => Self::SevenYears,
            Some(_unknown) => Self::OneDay,
        }
    }
}

/// `Tokenize` request (§4.4).
#[derive(Clone, Debug, Deserialize)]
pub struct TokenizeRequest {
    pub data: String,
    pub data_type: String,
    pub client_id: String,
    pub organization_id: String,
    #[serde(deserialize_with = "deserialize_secret_string")]
    pub ork: SecretString,
    #[serde(default)]
    pub retention_policy: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// `Tokenize` response. `token_type` is a fixed constant describing the
/// envelope format in use, matching the teacher's versioned-wire-format
/// posture (`tokenvault_crypto::wire::PROTOCOL_VERSION`).
#[derive(Clone, Debug, Serialize)]
pub struct TokenizeResponse {
    pub reference: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
    pub status: &'static str,
}

pub const TOKEN_TYPE: &str = "PII_TOKEN_V2_ENVELOPE";

/// `Detokenize` request (§4.4).
#[derive(Clone, Debug, Deserialize)]
pub struct DetokenizeRequest {
    pub reference: String,
    pub purpose: String,
    pub requesting_service: String,
    #[serde(default)]
    pub requesting_user: Option<String>,
    pub organization_id: String,
    #[serde(deserialize_with = "deserialize_secret_string")]
    pub ork: SecretString,
}

/// `Detokenize` response.
#[derive(Clone, Debug, Serialize)]
pub struct DetokenizeResponse {
    pub data: String,
    pub data_type: String,
    pub original_timestamp: DateTime<Utc>,
    pub access_logged: bool,
    pub status: &'static str,
}

/// `§6.1 HealthCheck`.
#[derive(Clone, Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub details: HealthDetails,
}

#[derive(Clone, Debug, Serialize)]
pub struct HealthDetails {
    pub kek: bool,
    pub store: bool,
    pub queue: bool,
    pub cache: bool,
}

impl HealthStatus {
    pub fn from_details(details: HealthDetails) -> Self {
        let healthy = details.kek && details.store && details.queue && details.cache;
        Self { status: if healthy { "healthy" } else { "degraded" }, details }
    }
}

/// Administrative `RetrieveTEK` result (§6.1). Never carries key material —
/// only the metadata an out-of-band rotation tool needs to decide whether
/// to act, matching the posture of not widening the admin surface beyond
/// what §4.2's rotation procedure requires.
#[derive(Clone, Debug, Serialize)]
pub struct TekSummary {
    pub organization_id: String,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub rotated_at: Option<DateTime<Utc>>,
    pub active: bool,
}

impl From<&tokenvault_keys::TekRecord> for TekSummary {
    fn from(record: &tokenvault_keys::TekRecord) -> Self {
        Self {
            organization_id: record.organization_id.as_str().to_string(),
            version: record.version,
            created_at: record.created_at,
            rotated_at: record.rotated_at,
            active: record.active,
        }
    }
}
