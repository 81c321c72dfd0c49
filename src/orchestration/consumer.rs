//! # Queue Consumer
//!
//! Polls one pgmq queue and runs a typed handler for every message on a
//! bounded worker pool.
//!
//! ## Delivery Rules
//!
//! - Handler success deletes the message.
//! - A retryable handler failure leaves the message on the queue; it becomes
//!   visible again after the visibility timeout. Once it has been read
//!   `max_receive_count` times a further failure archives it.
//! - A non-retryable failure (see [`crate::error::PrintFulfillmentError::is_retryable`]) is
//!   archived on first sight.
//! - A payload that does not deserialize into the handler's message type is
//!   archived on first sight.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::QueuesConfig;
use crate::error::Result;
use crate::logging::log_error;
use crate::messaging::{MessageClient, QueuedMessage};

/// Typed handler for the messages of one queue
#[async_trait]
pub trait MessageHandler: Send + Sync + 'static {
    type Message: DeserializeOwned + Send + 'static;

    /// Short name used in log records
    fn name(&self) -> &'static str;

    async fn handle(&self, message: Self::Message) -> Result<()>;
}

/// What happened to one message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Deleted,
    Retained,
    Archived,
}

#[derive(Debug, Clone)]
pub struct ConsumerSettings {
    pub queue_name: String,
    pub visibility_timeout_seconds: i32,
    pub read_batch_size: i32,
    pub poll_interval: Duration,
    pub max_receive_count: i32,
    pub concurrency: usize,
}

impl ConsumerSettings {
    pub fn from_queues(queues: &QueuesConfig, queue_name: &str, concurrency: usize) -> Self {
        Self {
            queue_name: queue_name.to_string(),
            visibility_timeout_seconds: queues.visibility_timeout_seconds,
            read_batch_size: queues.read_batch_size,
            poll_interval: queues.poll_interval(),
            max_receive_count: queues.max_receive_count,
            concurrency: concurrency.max(1),
        }
    }
}

pub struct QueueConsumer<H: MessageHandler> {
    client: Arc<dyn MessageClient>,
    handler: Arc<H>,
    settings: ConsumerSettings,
    semaphore: Arc<Semaphore>,
}

impl<H: MessageHandler> QueueConsumer<H> {
    pub fn new(client: Arc<dyn MessageClient>, handler: Arc<H>, settings: ConsumerSettings) -> Self {
        let semaphore = Arc::new(Semaphore::new(settings.concurrency));
        Self {
            client,
            handler,
            settings,
            semaphore,
        }
    }

    pub fn queue_name(&self) -> &str {
        &self.settings.queue_name
    }

    /// Poll until `shutdown` is cancelled, then drain in-flight handlers
    pub async fn run(self, shutdown: CancellationToken) -> Result<()> {
        info!(
            queue = %self.settings.queue_name,
            handler = self.handler.name(),
            concurrency = self.settings.concurrency,
            "🚀 Starting queue consumer"
        );

        let mut join_set: JoinSet<DeliveryOutcome> = JoinSet::new();

        loop {
            while let Some(result) = join_set.try_join_next() {
                if let Err(join_error) = result {
                    error!(queue = %self.settings.queue_name, error = %join_error, "Handler task panicked");
                }
            }

            if shutdown.is_cancelled() {
                break;
            }

            let spawned = match self.poll_once(&mut join_set).await {
                Ok(spawned) => spawned,
                Err(e) => {
                    error!(queue = %self.settings.queue_name, error = %e, "Error reading queue");
                    0
                }
            };

            if spawned == 0 {
                tokio::select! {
                    _ = tokio::time::sleep(self.settings.poll_interval) => {}
                    _ = shutdown.cancelled() => break,
                }
            }
        }

        info!(
            queue = %self.settings.queue_name,
            in_flight = join_set.len(),
            "Shutdown signal received, draining queue consumer"
        );
        while let Some(result) = join_set.join_next().await {
            if let Err(join_error) = result {
                error!(queue = %self.settings.queue_name, error = %join_error, "Handler task panicked");
            }
        }
        Ok(())
    }

    /// Read as many messages as there are free workers and spawn a handler
    /// task for each; returns the number spawned.
    pub async fn poll_once(&self, join_set: &mut JoinSet<DeliveryOutcome>) -> Result<usize> {
        let available = self.semaphore.available_permits();
        if available == 0 {
            return Ok(0);
        }
        let quantity = self
            .settings
            .read_batch_size
            .min(i32::try_from(available).unwrap_or(i32::MAX));

        let messages = self
            .client
            .read(
                &self.settings.queue_name,
                self.settings.visibility_timeout_seconds,
                quantity,
            )
            .await?;

        let count = messages.len();
        if count > 0 {
            debug!(queue = %self.settings.queue_name, message_count = count, "Read messages");
        }

        for message in messages {
            let permit = match self.semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };
            let client = self.client.clone();
            let handler = self.handler.clone();
            let settings = self.settings.clone();
            join_set.spawn(async move {
                let _permit = permit;
                deliver(client.as_ref(), handler.as_ref(), &settings, message).await
            });
        }
        Ok(count)
    }

    /// Handle everything currently visible and wait for the handlers to finish
    pub async fn process_available(&self) -> Result<Vec<DeliveryOutcome>> {
        let mut join_set = JoinSet::new();
        self.poll_once(&mut join_set).await?;

        let mut outcomes = Vec::new();
        while let Some(result) = join_set.join_next().await {
            match result {
                Ok(outcome) => outcomes.push(outcome),
                Err(join_error) => {
                    error!(queue = %self.settings.queue_name, error = %join_error, "Handler task panicked")
                }
            }
        }
        Ok(outcomes)
    }
}

async fn deliver<H: MessageHandler>(
    client: &dyn MessageClient,
    handler: &H,
    settings: &ConsumerSettings,
    message: QueuedMessage,
) -> DeliveryOutcome {
    let queue = settings.queue_name.as_str();
    let msg_id = message.msg_id;

    let typed = match serde_json::from_value::<H::Message>(message.payload) {
        Ok(typed) => typed,
        Err(e) => {
            log_error(
                handler.name(),
                "deserialize",
                &e.to_string(),
                Some(&format!("queue={queue} msg_id={msg_id}")),
            );
            return archive(client, queue, msg_id).await;
        }
    };

    match handler.handle(typed).await {
        Ok(()) => {
            if let Err(e) = client.delete(queue, msg_id).await {
                warn!(queue = %queue, msg_id = msg_id, error = %e, "Failed to delete processed message");
                return DeliveryOutcome::Retained;
            }
            DeliveryOutcome::Deleted
        }
        Err(e) if !e.is_retryable() || message.read_ct >= settings.max_receive_count => {
            log_error(
                handler.name(),
                "handle",
                &e.to_string(),
                Some(&format!(
                    "queue={queue} msg_id={msg_id} read_ct={} retryable={} archived",
                    message.read_ct,
                    e.is_retryable()
                )),
            );
            archive(client, queue, msg_id).await
        }
        Err(e) => {
            warn!(
                queue = %queue,
                msg_id = msg_id,
                read_ct = message.read_ct,
                error = %e,
                "Handler failed, message left for redelivery"
            );
            DeliveryOutcome::Retained
        }
    }
}

async fn archive(client: &dyn MessageClient, queue: &str, msg_id: i64) -> DeliveryOutcome {
    match client.archive(queue, msg_id).await {
        Ok(()) => DeliveryOutcome::Archived,
        Err(e) => {
            warn!(queue = %queue, msg_id = msg_id, error = %e, "Failed to archive message");
            DeliveryOutcome::Retained
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PrintFulfillmentError;
    use crate::messaging::{enqueue, InMemoryMessageClient, ProcessPrintRequestBatchMessage};
    use parking_lot::Mutex;

    #[derive(Clone, Copy)]
    enum Failure {
        None,
        Transient,
        Permanent,
    }

    struct RecordingHandler {
        seen: Mutex<Vec<String>>,
        failure: Failure,
    }

    impl RecordingHandler {
        fn new(failure: Failure) -> Arc<Self> {
            Arc::new(Self {
                seen: Mutex::new(Vec::new()),
                failure,
            })
        }
    }

    #[async_trait]
    impl MessageHandler for RecordingHandler {
        type Message = ProcessPrintRequestBatchMessage;

        fn name(&self) -> &'static str {
            "recording"
        }

        async fn handle(&self, message: Self::Message) -> Result<()> {
            self.seen.lock().push(message.batch_id);
            match self.failure {
                Failure::None => Ok(()),
                Failure::Transient => Err(PrintFulfillmentError::DatabaseError(
                    "connection reset".to_string(),
                )),
                Failure::Permanent => Err(PrintFulfillmentError::ValidationError(
                    "malformed response file".to_string(),
                )),
            }
        }
    }

    fn settings(max_receive_count: i32) -> ConsumerSettings {
        ConsumerSettings {
            queue_name: "batches".to_string(),
            visibility_timeout_seconds: 30,
            read_batch_size: 10,
            poll_interval: Duration::from_millis(10),
            max_receive_count,
            concurrency: 2,
        }
    }

    async fn client_with_batch() -> Arc<InMemoryMessageClient> {
        let client = Arc::new(InMemoryMessageClient::new());
        client.create_queue("batches").await.unwrap();
        enqueue(
            client.as_ref(),
            "batches",
            &ProcessPrintRequestBatchMessage {
                batch_id: "BATCH1".to_string(),
            },
        )
        .await
        .unwrap();
        client
    }

    #[tokio::test]
    async fn test_success_deletes_message() {
        let client = client_with_batch().await;
        let handler = RecordingHandler::new(Failure::None);
        let consumer = QueueConsumer::new(client.clone(), handler.clone(), settings(3));

        let outcomes = consumer.process_available().await.unwrap();

        assert_eq!(outcomes, vec![DeliveryOutcome::Deleted]);
        assert_eq!(handler.seen.lock().as_slice(), ["BATCH1".to_string()]);
        assert!(client.pending("batches").is_empty());
    }

    #[tokio::test]
    async fn test_failure_retained_until_max_receive_count() {
        let client = client_with_batch().await;
        let handler = RecordingHandler::new(Failure::Transient);
        let consumer = QueueConsumer::new(client.clone(), handler, settings(2));

        assert_eq!(
            consumer.process_available().await.unwrap(),
            vec![DeliveryOutcome::Retained]
        );
        // invisible until the timeout lapses
        assert!(consumer.process_available().await.unwrap().is_empty());

        client.expire_visibility("batches");
        assert_eq!(
            consumer.process_available().await.unwrap(),
            vec![DeliveryOutcome::Archived]
        );
        assert_eq!(client.archived("batches").len(), 1);
        assert!(client.pending("batches").is_empty());
    }

    #[tokio::test]
    async fn test_permanent_failure_archived_on_first_delivery() {
        let client = client_with_batch().await;
        let handler = RecordingHandler::new(Failure::Permanent);
        let consumer = QueueConsumer::new(client.clone(), handler.clone(), settings(5));

        assert_eq!(
            consumer.process_available().await.unwrap(),
            vec![DeliveryOutcome::Archived]
        );
        assert_eq!(handler.seen.lock().len(), 1);
        assert_eq!(client.archived("batches").len(), 1);
        assert!(client.pending("batches").is_empty());
    }

    #[tokio::test]
    async fn test_undeserializable_payload_archived() {
        let client = Arc::new(InMemoryMessageClient::new());
        client.create_queue("batches").await.unwrap();
        client
            .send_json("batches", serde_json::json!({"unexpected": true}))
            .await
            .unwrap();
        let handler = RecordingHandler::new(Failure::None);
        let consumer = QueueConsumer::new(client.clone(), handler.clone(), settings(5));

        assert_eq!(
            consumer.process_available().await.unwrap(),
            vec![DeliveryOutcome::Archived]
        );
        assert!(handler.seen.lock().is_empty());
    }

    #[tokio::test]
    async fn test_run_stops_on_cancellation() {
        let client = client_with_batch().await;
        let handler = RecordingHandler::new(Failure::None);
        let consumer = QueueConsumer::new(client.clone(), handler.clone(), settings(3));
        let shutdown = CancellationToken::new();

        let running = tokio::spawn(consumer.run(shutdown.clone()));
        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown.cancel();
        running.await.unwrap().unwrap();

        assert_eq!(handler.seen.lock().len(), 1);
        assert!(client.pending("batches").is_empty());
    }
}
