//! # Persistence
//!
//! Repository port for the printable document aggregate, with a PostgreSQL
//! implementation and an in-memory implementation used by tests and local runs.
//!
//! ## Write Semantics
//!
//! - Every save is versioned per aggregate. A stale `version` fails the whole
//!   call with `ConcurrentModification`; nothing is merged.
//! - `save_all` is all-or-nothing across the documents passed in, which is what
//!   batch assignment and batch-level responses rely on.
//! - Status entries are append-only; a save only ever inserts entries that are
//!   not yet stored.

pub mod connection;
pub mod in_memory;
pub mod lock;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{PrintableDocument, SourceType};

pub use connection::{DatabaseConnection, MIGRATOR};
pub use in_memory::InMemoryPrintableDocumentRepository;
pub use lock::{DistributedLock, InMemoryDistributedLock, LockLease, PgAdvisoryLock};
pub use postgres::PgPrintableDocumentRepository;

#[async_trait]
pub trait PrintableDocumentRepository: Send + Sync {
    /// Store a newly issued document
    async fn insert(&self, document: &PrintableDocument) -> Result<()>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PrintableDocument>>;

    async fn find_by_source(
        &self,
        source_type: SourceType,
        source_reference: &str,
    ) -> Result<Vec<PrintableDocument>>;

    /// Document owning the print request with this bureau-facing id
    async fn find_by_request_id(&self, request_id: &str) -> Result<Option<PrintableDocument>>;

    /// Documents with at least one print request carrying `batch_id`
    async fn find_by_batch_id(&self, batch_id: &str) -> Result<Vec<PrintableDocument>>;

    /// Documents whose active print request is pending assignment, oldest
    /// application first
    async fn find_pending_assignment(&self, limit: usize) -> Result<Vec<PrintableDocument>>;

    /// Persist all documents in one unit of work, bumping each `version`
    async fn save_all(&self, documents: &mut [PrintableDocument]) -> Result<()>;

    async fn save(&self, document: &mut PrintableDocument) -> Result<()> {
        self.save_all(std::slice::from_mut(document)).await
    }
}
