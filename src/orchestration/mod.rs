//! # Orchestration
//!
//! Explicit wiring of the pipeline: a locked scheduler for batch assembly and
//! one polling consumer per inbound queue.
//!
//! - [`scheduler::BatchScheduler`] runs the batch job on an interval under the
//!   distributed lock.
//! - [`consumer::QueueConsumer`] reads a queue and runs a typed
//!   [`consumer::MessageHandler`] on a bounded worker pool.
//! - [`handlers`] bind each message type to its service.
//! - [`bootstrap::PrintFulfillmentSystem`] builds all of it from configuration.

pub mod bootstrap;
pub mod consumer;
pub mod handlers;
pub mod scheduler;

pub use bootstrap::{Collaborators, PrintFulfillmentSystem, SystemHandle};
pub use consumer::{ConsumerSettings, DeliveryOutcome, MessageHandler, QueueConsumer};
pub use handlers::{PrintRequestBatchHandler, PrintResponseFileHandler, PrintResponseHandler};
pub use scheduler::{BatchScheduler, TickOutcome};
