#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Print Fulfillment
//!
//! Print pipeline for electoral identity documents: voter authority
//! certificates, anonymous elector documents and temporary certificates.
//!
//! ## Overview
//!
//! Issued documents are grouped into batches, packaged into a zip bundle
//! (pipe-separated manifest plus one photo per request) and uploaded to the
//! print bureau over SFTP. The bureau answers with response files whose
//! batch-level and request-level outcomes drive each print request through an
//! append-only status history, with failure notifications to the Electoral
//! Registration Office and statistics events downstream.
//!
//! ## Module Organization
//!
//! - [`state_machine`] - Status vocabulary, bureau step mapping and transitions
//! - [`models`] - Printable document aggregate and its print requests
//! - [`database`] - Repository port, PostgreSQL and in-memory stores, distributed lock
//! - [`retention`] - Working-day aware data retention removal dates
//! - [`services`] - Batch assembly, bundle building, transmission, response processing
//! - [`sftp`] - Remote file transport
//! - [`clients`] - Object storage, ERO directory and email collaborators
//! - [`messaging`] - pgmq queue contracts and clients
//! - [`orchestration`] - Scheduler, queue consumers and bootstrap
//! - [`config`] - Layered configuration
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use print_fulfillment::config::ConfigManager;
//! use print_fulfillment::orchestration::{Collaborators, PrintFulfillmentSystem};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let (collaborators, _database) = Collaborators::connect(manager.config()).await?;
//!
//! let system = PrintFulfillmentSystem::build(manager.config(), collaborators);
//! system.create_queues().await?;
//! let handle = system.start();
//!
//! tokio::signal::ctrl_c().await?;
//! handle.stop().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! ```bash
//! cargo test --lib    # Unit tests
//! cargo test          # Unit and integration tests
//! ```
//!
//! PostgreSQL-backed tests run only when `TEST_DATABASE_URL` is set.

pub mod clients;
pub mod config;
pub mod constants;
pub mod database;
pub mod error;
pub mod logging;
pub mod messaging;
pub mod models;
pub mod orchestration;
pub mod retention;
pub mod services;
pub mod sftp;
pub mod state_machine;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use config::{ConfigManager, PrintFulfillmentConfig};
pub use database::{
    InMemoryPrintableDocumentRepository, PgPrintableDocumentRepository,
    PrintableDocumentRepository,
};
pub use error::{PrintFulfillmentError, Result};
pub use models::{PrintRequest, PrintableDocument};
pub use orchestration::{Collaborators, PrintFulfillmentSystem, SystemHandle};
pub use state_machine::{PrintRequestStatus, ResponseOutcome, StatusStep};
