use thiserror::Error;

/// Error type that captures common ledger failures.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Invalid reference: {0}")]
    InvalidRef(String),
    #[error("Edit rejected: {0}")]
    EditRejected(String),
    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl LedgerError {
    /// True for rejections that are reported to the user rather than treated as failures.
    pub fn is_rejection(&self) -> bool {
        matches!(self, LedgerError::EditRejected(_))
    }
}

/// User-facing CLI error wrapper.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] LedgerError),
    #[error("Invalid input: {0}")]
    Input(String),
    #[error("Command failed: {0}")]
    Command(String),
}
