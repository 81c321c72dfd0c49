//! # PostgreSQL Message Queue Client (pgmq-rs)
//!
//! [`MessageClient`] backed by the pgmq extension via the pgmq-rs crate.

use async_trait::async_trait;
use pgmq::PGMQueue;
use serde_json::Value;
use tracing::{debug, info};

use super::client::{MessageClient, QueuedMessage};
use super::errors::{MessagingError, MessagingResult};

/// pgmq-rs based message queue client
#[derive(Debug, Clone)]
pub struct PgmqClient {
    pgmq: PGMQueue,
}

impl PgmqClient {
    /// Create new pgmq client using connection string
    pub async fn new(database_url: &str) -> MessagingResult<Self> {
        info!("🚀 Connecting to pgmq using pgmq-rs crate");

        let pgmq = PGMQueue::new(database_url.to_string()).await?;

        info!("✅ Connected to pgmq using pgmq-rs");
        Ok(Self { pgmq })
    }

    /// Create new pgmq client using existing connection pool
    pub async fn new_with_pool(pool: sqlx::PgPool) -> Self {
        let pgmq = PGMQueue::new_with_pool(pool).await;

        info!("✅ pgmq client created with shared pool");
        Self { pgmq }
    }
}

#[async_trait]
impl MessageClient for PgmqClient {
    async fn create_queue(&self, queue_name: &str) -> MessagingResult<()> {
        debug!("📋 Creating queue: {}", queue_name);

        self.pgmq
            .create(queue_name)
            .await
            .map_err(|e| MessagingError::queue_operation(queue_name, "create", e.to_string()))?;

        info!("✅ Queue ready: {}", queue_name);
        Ok(())
    }

    async fn send_json(&self, queue_name: &str, payload: Value) -> MessagingResult<i64> {
        let message_id = self
            .pgmq
            .send(queue_name, &payload)
            .await
            .map_err(|e| MessagingError::queue_operation(queue_name, "send", e.to_string()))?;

        debug!(queue = %queue_name, msg_id = message_id, "📤 Message sent");
        Ok(message_id)
    }

    async fn read(
        &self,
        queue_name: &str,
        visibility_timeout_seconds: i32,
        qty: i32,
    ) -> MessagingResult<Vec<QueuedMessage>> {
        let messages = self
            .pgmq
            .read_batch::<Value>(queue_name, Some(visibility_timeout_seconds), qty)
            .await
            .map_err(|e| MessagingError::queue_operation(queue_name, "read", e.to_string()))?
            .unwrap_or_default();

        if !messages.is_empty() {
            debug!(queue = %queue_name, count = messages.len(), "📨 Read messages");
        }
        Ok(messages.into_iter().map(QueuedMessage::from).collect())
    }

    async fn delete(&self, queue_name: &str, msg_id: i64) -> MessagingResult<()> {
        self.pgmq
            .delete(queue_name, msg_id)
            .await
            .map_err(|e| MessagingError::queue_operation(queue_name, "delete", e.to_string()))?;
        Ok(())
    }

    async fn archive(&self, queue_name: &str, msg_id: i64) -> MessagingResult<()> {
        debug!(queue = %queue_name, msg_id, "📦 Archiving message");

        self.pgmq
            .archive(queue_name, msg_id)
            .await
            .map_err(|e| MessagingError::queue_operation(queue_name, "archive", e.to_string()))?;
        Ok(())
    }
}
