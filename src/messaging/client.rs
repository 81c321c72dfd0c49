//! Queue client port shared by the pgmq and in-memory implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use super::errors::MessagingResult;

/// A message claimed from a queue
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedMessage {
    pub msg_id: i64,
    /// Number of times the message has been read, including this read
    pub read_ct: i32,
    pub enqueued_at: DateTime<Utc>,
    pub payload: Value,
}

impl From<pgmq::types::Message<Value>> for QueuedMessage {
    fn from(message: pgmq::types::Message<Value>) -> Self {
        Self {
            msg_id: message.msg_id,
            read_ct: message.read_ct,
            enqueued_at: message.enqueued_at,
            payload: message.message,
        }
    }
}

#[async_trait]
pub trait MessageClient: Send + Sync {
    /// Create queue if it doesn't exist
    async fn create_queue(&self, queue_name: &str) -> MessagingResult<()>;

    /// Send a JSON payload, returning the message id
    async fn send_json(&self, queue_name: &str, payload: Value) -> MessagingResult<i64>;

    /// Claim up to `qty` messages, hiding them for `visibility_timeout_seconds`
    async fn read(
        &self,
        queue_name: &str,
        visibility_timeout_seconds: i32,
        qty: i32,
    ) -> MessagingResult<Vec<QueuedMessage>>;

    /// Remove a processed message
    async fn delete(&self, queue_name: &str, msg_id: i64) -> MessagingResult<()>;

    /// Move a message to the queue's archive
    async fn archive(&self, queue_name: &str, msg_id: i64) -> MessagingResult<()>;
}

/// Serialize `message` and send it to `queue_name`
pub async fn enqueue<T: Serialize + ?Sized>(
    client: &dyn MessageClient,
    queue_name: &str,
    message: &T,
) -> MessagingResult<i64> {
    let payload = serde_json::to_value(message)?;
    client.send_json(queue_name, payload).await
}
