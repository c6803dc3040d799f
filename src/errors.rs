use thiserror::Error;

/// Error type that captures ledger, storage, and validation failures.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Integrity error: {0}")]
    Integrity(String),
    #[error("Invalid mutation: {0}")]
    InvalidMutation(String),
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Unknown transaction type: {0}")]
    UnknownKind(String),
    #[error("Aggregate drift: {0}")]
    AggregateDrift(String),
}

impl LedgerError {
    /// True for failures that mean the persisted ledger can no longer be trusted.
    pub fn is_integrity(&self) -> bool {
        matches!(
            self,
            LedgerError::Io(_) | LedgerError::Csv(_) | LedgerError::Integrity(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
