//! # Messaging Module
//!
//! PostgreSQL message queue (pgmq) based messaging for the print pipeline.
//! Inbound work arrives on queues, outbound statistics and email events leave
//! through them.

pub mod client;
pub mod errors;
pub mod in_memory_client;
pub mod message;
pub mod pgmq_client;

pub use client::{enqueue, MessageClient, QueuedMessage};
pub use errors::{MessagingError, MessagingResult};
pub use in_memory_client::InMemoryMessageClient;
pub use message::*;
pub use pgmq_client::PgmqClient;
