//! Error types for the print fulfillment pipeline.
//!

use thiserror::Error;

use crate::config::ConfigurationError;
use crate::messaging::MessagingError;
use crate::sftp::RemoteFileError;
use crate::state_machine::StateMachineError;

#[derive(Debug, Error)]
pub enum PrintFulfillmentError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Concurrent modification of printable document {document_id} (expected version {expected_version})")]
    ConcurrentModification {
        document_id: String,
        expected_version: i64,
    },
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("State machine error: {0}")]
    StateMachine(#[from] StateMachineError),
    #[error("Photo {bucket}/{key} could not be retrieved: {reason}")]
    ObjectStorage {
        bucket: String,
        key: String,
        reason: String,
    },
    #[error("Invalid photo location: {0}")]
    InvalidPhotoLocation(String),
    #[error("Print bundle error: {0}")]
    BundleError(String),
    #[error("SFTP transport error: {0}")]
    Transport(#[from] RemoteFileError),
    #[error("Messaging error: {0}")]
    Messaging(#[from] MessagingError),
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Lock error: {0}")]
    LockError(String),
    #[error("Worker error: {0}")]
    WorkerError(String),
}

impl PrintFulfillmentError {
    /// Whether a caller should retry the whole unit of work later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConcurrentModification { .. }
                | Self::DatabaseError(_)
                | Self::Transport(_)
                | Self::ObjectStorage { .. }
                | Self::Messaging(_)
        )
    }
}

impl From<sqlx::Error> for PrintFulfillmentError {
    fn from(err: sqlx::Error) -> Self {
        PrintFulfillmentError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for PrintFulfillmentError {
    fn from(error: serde_json::Error) -> Self {
        PrintFulfillmentError::ValidationError(format!("JSON serialization error: {error}"))
    }
}

impl From<zip::result::ZipError> for PrintFulfillmentError {
    fn from(error: zip::result::ZipError) -> Self {
        PrintFulfillmentError::BundleError(error.to_string())
    }
}

impl From<std::io::Error> for PrintFulfillmentError {
    fn from(error: std::io::Error) -> Self {
        PrintFulfillmentError::BundleError(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PrintFulfillmentError>;
