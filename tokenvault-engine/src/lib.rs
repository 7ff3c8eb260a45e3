//! Tokenisation engine (§4.4 C4): orchestrates the crypto primitives,
//! key registry, and persistence pipeline into `Tokenize`/`Detokenize`.
//!
//! This is the crate an adapter (`tokenvault-api`, `tokenvault-cli`) talks
//! to. It is the only place in the workspace where plaintext PII, an ORK,
//! and a derived FDK are ever in scope together — everything below it
//! handles at most one secret at a time.

mod config;
mod engine;
mod error;
mod types;
mod validation;

pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{EngineError, ExternalErrorCode};
pub use types::{
    DataType, DetokenizeRequest, DetokenizeResponse, HealthDetails, HealthStatus, RetentionPolicy, TekSummary,
    TokenizeRequest, TokenizeResponse, TOKEN_TYPE,
};
pub use validation::strip_reference_prefix;
