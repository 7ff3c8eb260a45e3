//! Input validation shared by `tokenize` and `detokenize`. Every check here
//! produces `EngineError::ValidationError` — none of it touches I/O.

use crate::error::EngineError;
use crate::types::{DataType, DetokenizeRequest, TokenizeRequest};

pub const REFERENCE_PREFIX: &str = "tok_";

fn require_non_empty(field: &str, value: &str) -> Result<(), EngineError> {
    if value.trim().is_empty() {
        return Err(EngineError::ValidationError(format!("{field} must not be empty")));
    }
    Ok(())
}

pub fn validate_tokenize(req: &TokenizeRequest) -> Result<DataType, EngineError> {
    require_non_empty("data", &req.data)?;
    require_non_empty("client_id", &req.client_id)?;
    require_non_empty("organization_id", &req.organization_id)?;
    require_non_empty("ork", &req.ork)?;
    DataType::parse(&req.data_type)
}

/// Strips the `tok_` prefix and validates the remaining hash is exactly 32
/// lowercase hex characters (§6.4: `^tok_[0-9a-f]{32}$`).
pub fn strip_reference_prefix(reference: &str) -> Result<&str, EngineError> {
    let hash = reference.strip_prefix(REFERENCE_PREFIX).unwrap_or(reference);
    if hash.len() != 32 || !hash.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase()) {
        return Err(EngineError::ValidationError("reference is not a valid tok_<32hex> value".into()));
    }
    Ok(hash)
}

pub fn validate_detokenize(req: &DetokenizeRequest) -> Result<&str, EngineError> {
    require_non_empty("purpose", &req.purpose)?;
    require_non_empty("requesting_service", &req.requesting_service)?;
    require_non_empty("organization_id", &req.organization_id)?;
    require_non_empty("ork", &req.ork)?;
    strip_reference_prefix(&req.reference)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokenvault_crypto::Secret;

    fn base_tokenize() -> TokenizeRequest {
        TokenizeRequest {
            data: "user@example.com".into(),
            data_type: "email".into(),
            client_id: "client-1".into(),
            organization_id: "acme".into(),
            ork: Secret::new("s3cret".into()),
            retention_policy: None,
            metadata: Default::default(),
        }
    }

    #[test]
    fn valid_tokenize_request_passes() {
        assert!(validate_tokenize(&base_tokenize()).is_ok());
    }

    #[test]
    fn empty_data_is_rejected() {
        let mut req = base_tokenize();
        req.data = "".into();
        assert!(matches!(validate_tokenize(&req), Err(EngineError::ValidationError(_))));
    }

    #[test]
    fn unknown_data_type_is_rejected() {
        let mut req = base_tokenize();
        req.data_type = "passport".into();
        assert!(matches!(validate_tokenize(&req), Err(EngineError::ValidationError(_))));
    }

    #[test]
    fn reference_prefix_is_stripped() {
        let hash = "0123456789abcdef0123456789abcdef";
        let stripped = strip_reference_prefix(&format!("tok_{}", &hash[..32])).unwrap();
        assert_eq!(stripped, &hash[..32]);
    }

    #[test]
    fn malformed_reference_is_rejected() {
        assert!(strip_reference_prefix("tok_not-hex").is_err());
        assert!(strip_reference_prefix("tok_short").is_err());
        assert!(strip_reference_prefix("tok_0123456789ABCDEF0123456789abcdef").is_err());
    }
}
