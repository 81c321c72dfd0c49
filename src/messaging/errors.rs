//! # Messaging Error Types
//!
//! Failures talking to a queue. Every variant is transient from the point of
//! view of a consumer: the message stays on the queue and is read again.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MessagingError {
    #[error("Queue connection error: {message}")]
    Connection { message: String },

    #[error("Queue operation failed: {queue_name}: {operation}: {message}")]
    QueueOperation {
        queue_name: String,
        operation: String,
        message: String,
    },

    #[error("Message payload could not be encoded: {message}")]
    Payload { message: String },
}

impl MessagingError {
    pub fn queue_operation(
        queue_name: impl Into<String>,
        operation: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::QueueOperation {
            queue_name: queue_name.into(),
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Queue name of a failed operation, if known
    pub fn queue_name(&self) -> Option<&str> {
        match self {
            Self::QueueOperation { queue_name, .. } => Some(queue_name),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for MessagingError {
    fn from(err: serde_json::Error) -> Self {
        Self::Payload {
            message: err.to_string(),
        }
    }
}

/// pgmq failures outside a named queue operation, e.g. while connecting
impl From<pgmq::errors::PgmqError> for MessagingError {
    fn from(err: pgmq::errors::PgmqError) -> Self {
        Self::Connection {
            message: err.to_string(),
        }
    }
}

pub type MessagingResult<T> = Result<T, MessagingError>;
