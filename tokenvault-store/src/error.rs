//! Store-layer errors.

use core::fmt;

#[derive(Debug)]
pub enum StoreError {
    /// The durable store (Postgres) could not be reached or returned an
    /// unexpected error. Operationally retryable.
    Unavailable(String),
    /// No record exists for the given reference hash.
    NotFound,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable(detail) => write!(f, "durable store unavailable: {detail}"),
            Self::NotFound => write!(f, "record not found"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<tokio_postgres::Error> for StoreError {
    fn from(err: tokio_postgres::Error) -> Self {
        Self::Unavailable(err.to_string())
    }
}

impl From<deadpool_postgres::PoolError> for StoreError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Unavailable(err.to_string())
    }
}

impl From<StoreError> for tokenvault_keys::KeyRegistryError {
    fn from(err: StoreError) -> Self {
        tokenvault_keys::KeyRegistryError::StoreUnavailable(err.to_string())
    }
}
