//! In-memory printable document store.
//!
//! Same versioning and all-or-nothing rules as the PostgreSQL repository, held
//! behind a single lock so multi-document saves are atomic.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

use super::PrintableDocumentRepository;
use crate::error::{PrintFulfillmentError, Result};
use crate::models::{PrintableDocument, SourceType};

#[derive(Debug, Default)]
pub struct InMemoryPrintableDocumentRepository {
    documents: RwLock<HashMap<Uuid, PrintableDocument>>,
}

impl InMemoryPrintableDocumentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored document
    pub fn all(&self) -> Vec<PrintableDocument> {
        self.documents.read().values().cloned().collect()
    }

    fn select<F>(&self, predicate: F) -> Vec<PrintableDocument>
    where
        F: Fn(&PrintableDocument) -> bool,
    {
        let mut selected: Vec<_> = self
            .documents
            .read()
            .values()
            .filter(|document| predicate(document))
            .cloned()
            .collect();
        selected.sort_by(|a, b| {
            a.application_received_date_time
                .cmp(&b.application_received_date_time)
                .then(a.id.cmp(&b.id))
        });
        selected
    }
}

#[async_trait]
impl PrintableDocumentRepository for InMemoryPrintableDocumentRepository {
    async fn insert(&self, document: &PrintableDocument) -> Result<()> {
        let mut documents = self.documents.write();
        if documents.contains_key(&document.id) {
            return Err(PrintFulfillmentError::ValidationError(format!(
                "Printable document {} already exists",
                document.id
            )));
        }
        documents.insert(document.id, document.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PrintableDocument>> {
        Ok(self.documents.read().get(&id).cloned())
    }

    async fn find_by_source(
        &self,
        source_type: SourceType,
        source_reference: &str,
    ) -> Result<Vec<PrintableDocument>> {
        Ok(self.select(|document| {
            document.source_type == source_type && document.source_reference == source_reference
        }))
    }

    async fn find_by_request_id(&self, request_id: &str) -> Result<Option<PrintableDocument>> {
        Ok(self
            .select(|document| document.print_request(request_id).is_some())
            .into_iter()
            .next())
    }

    async fn find_by_batch_id(&self, batch_id: &str) -> Result<Vec<PrintableDocument>> {
        Ok(self.select(|document| document.print_requests_in_batch(batch_id).next().is_some()))
    }

    async fn find_pending_assignment(&self, limit: usize) -> Result<Vec<PrintableDocument>> {
        let mut pending = self.select(|document| {
            document
                .active_print_request()
                .is_some_and(|request| request.is_pending_assignment())
        });
        pending.truncate(limit);
        Ok(pending)
    }

    async fn save_all(&self, documents: &mut [PrintableDocument]) -> Result<()> {
        let mut stored = self.documents.write();

        for document in documents.iter() {
            let current_version = stored.get(&document.id).map(|existing| existing.version);
            if current_version != Some(document.version) {
                return Err(PrintFulfillmentError::ConcurrentModification {
                    document_id: document.id.to_string(),
                    expected_version: document.version,
                });
            }
        }

        for document in documents.iter_mut() {
            document.version += 1;
            stored.insert(document.id, document.clone());
        }
        Ok(())
    }
}
