//! # In-Memory Message Client
//!
//! Queue client for tests and single-process runs. Honours visibility
//! timeouts and read counts the same way pgmq does, so consumer retry and
//! archive behaviour can be exercised without a database.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;

use super::client::{MessageClient, QueuedMessage};
use super::errors::{MessagingError, MessagingResult};

#[derive(Debug, Clone)]
struct StoredMessage {
    msg_id: i64,
    read_ct: i32,
    enqueued_at: DateTime<Utc>,
    visible_at: DateTime<Utc>,
    payload: Value,
}

impl From<&StoredMessage> for QueuedMessage {
    fn from(stored: &StoredMessage) -> Self {
        Self {
            msg_id: stored.msg_id,
            read_ct: stored.read_ct,
            enqueued_at: stored.enqueued_at,
            payload: stored.payload.clone(),
        }
    }
}

#[derive(Debug, Default)]
struct InMemoryQueue {
    messages: Vec<StoredMessage>,
    archived: Vec<StoredMessage>,
}

#[derive(Debug, Default)]
struct State {
    queues: HashMap<String, InMemoryQueue>,
    next_id: i64,
}

#[derive(Debug, Default)]
pub struct InMemoryMessageClient {
    state: Mutex<State>,
}

impl InMemoryMessageClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Payloads still on the queue, visible or not, in send order
    pub fn pending(&self, queue_name: &str) -> Vec<Value> {
        self.state
            .lock()
            .queues
            .get(queue_name)
            .map(|queue| queue.messages.iter().map(|m| m.payload.clone()).collect())
            .unwrap_or_default()
    }

    /// Payloads moved to the archive
    pub fn archived(&self, queue_name: &str) -> Vec<Value> {
        self.state
            .lock()
            .queues
            .get(queue_name)
            .map(|queue| queue.archived.iter().map(|m| m.payload.clone()).collect())
            .unwrap_or_default()
    }

    /// Make every in-flight message on the queue visible again
    pub fn expire_visibility(&self, queue_name: &str) {
        let now = Utc::now();
        if let Some(queue) = self.state.lock().queues.get_mut(queue_name) {
            for message in &mut queue.messages {
                message.visible_at = now;
            }
        }
    }
}

#[async_trait]
impl MessageClient for InMemoryMessageClient {
    async fn create_queue(&self, queue_name: &str) -> MessagingResult<()> {
        self.state
            .lock()
            .queues
            .entry(queue_name.to_string())
            .or_default();
        Ok(())
    }

    async fn send_json(&self, queue_name: &str, payload: Value) -> MessagingResult<i64> {
        let mut state = self.state.lock();
        state.next_id += 1;
        let msg_id = state.next_id;
        let now = Utc::now();

        state
            .queues
            .entry(queue_name.to_string())
            .or_default()
            .messages
            .push(StoredMessage {
                msg_id,
                read_ct: 0,
                enqueued_at: now,
                visible_at: now,
                payload,
            });
        Ok(msg_id)
    }

    async fn read(
        &self,
        queue_name: &str,
        visibility_timeout_seconds: i32,
        qty: i32,
    ) -> MessagingResult<Vec<QueuedMessage>> {
        let mut state = self.state.lock();
        let Some(queue) = state.queues.get_mut(queue_name) else {
            return Ok(Vec::new());
        };

        let now = Utc::now();
        let hidden_until = now + Duration::seconds(i64::from(visibility_timeout_seconds));
        let limit = usize::try_from(qty).unwrap_or(0);

        let claimed = queue
            .messages
            .iter_mut()
            .filter(|message| message.visible_at <= now)
            .take(limit)
            .map(|message| {
                message.read_ct += 1;
                message.visible_at = hidden_until;
                QueuedMessage::from(&*message)
            })
            .collect();
        Ok(claimed)
    }

    async fn delete(&self, queue_name: &str, msg_id: i64) -> MessagingResult<()> {
        let mut state = self.state.lock();
        let queue = state.queues.get_mut(queue_name).ok_or_else(|| {
            MessagingError::queue_operation(queue_name, "delete", "Queue does not exist")
        })?;
        queue.messages.retain(|message| message.msg_id != msg_id);
        Ok(())
    }

    async fn archive(&self, queue_name: &str, msg_id: i64) -> MessagingResult<()> {
        let mut state = self.state.lock();
        let queue = state.queues.get_mut(queue_name).ok_or_else(|| {
            MessagingError::queue_operation(queue_name, "archive", "Queue does not exist")
        })?;
        if let Some(position) = queue.messages.iter().position(|m| m.msg_id == msg_id) {
            let message = queue.messages.remove(position);
            queue.archived.push(message);
        }
        Ok(())
    }
}
