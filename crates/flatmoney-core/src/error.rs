use thiserror::Error;

use flatmoney_domain::ValidationError;

use crate::format::MaskError;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("Stored ledger is corrupted: {0}")]
    CorruptedStorage(String),
    #[error("Failed to persist ledger: {0}")]
    PersistenceWrite(String),
    #[error("Import rejected: {0}")]
    ImportValidation(String),
    #[error("Month record not found: {0}")]
    RecordNotFound(String),
    #[error("Invalid amount input: {0}")]
    Mask(#[from] MaskError),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(String),
}

impl CoreError {
    /// Only a corrupted durable record is allowed to take over the session.
    pub fn is_session_fatal(&self) -> bool {
        matches!(self, CoreError::CorruptedStorage(_))
    }
}
