//! # Batch Assembly
//!
//! Groups pending print requests into batches, oldest application first, and
//! queues each new batch for transmission.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use crate::database::PrintableDocumentRepository;
use crate::error::{PrintFulfillmentError, Result};
use crate::logging::{log_batch_operation, log_error};
use crate::messaging::{enqueue, MessageClient, ProcessPrintRequestBatchMessage};
use crate::state_machine::{assign_to_batch, release_from_batch, PrintRequestStatus};
use crate::utils::generate_batch_id;

pub struct BatchAssemblyService {
    repository: Arc<dyn PrintableDocumentRepository>,
}

impl BatchAssemblyService {
    pub fn new(repository: Arc<dyn PrintableDocumentRepository>) -> Self {
        Self { repository }
    }

    /// Assign up to `max_batch_size` pending requests to a new batch.
    ///
    /// Returns `None` without creating a batch when nothing is pending. The
    /// assignment is saved in one versioned write; on conflict no request is
    /// left assigned.
    #[instrument(skip(self))]
    pub async fn assemble_batch(&self, max_batch_size: usize) -> Result<Option<String>> {
        if max_batch_size == 0 {
            return Err(PrintFulfillmentError::ValidationError(
                "max batch size must be greater than 0".to_string(),
            ));
        }

        let mut documents = self
            .repository
            .find_pending_assignment(max_batch_size)
            .await?;
        if documents.is_empty() {
            debug!("No print requests pending assignment");
            return Ok(None);
        }

        let batch_id = generate_batch_id();
        let assigned_at = Utc::now();
        for document in &mut documents {
            if let Some(request) = document.active_print_request_mut() {
                assign_to_batch(request, &batch_id, assigned_at);
            }
        }

        self.repository.save_all(&mut documents).await?;

        log_batch_operation(
            "assemble",
            &batch_id,
            documents.len(),
            PrintRequestStatus::AssignedToBatch.as_str(),
            None,
        );
        Ok(Some(batch_id))
    }

    /// Put every request still assigned to `batch_id` back in the pending pool.
    ///
    /// Used when the batch could not be queued for transmission. Returns the
    /// number of requests released.
    #[instrument(skip(self, reason))]
    pub async fn release_batch(&self, batch_id: &str, reason: &str) -> Result<usize> {
        let mut documents: Vec<_> = self
            .repository
            .find_by_batch_id(batch_id)
            .await?
            .into_iter()
            .filter(|document| {
                document
                    .print_requests
                    .iter()
                    .any(|request| request.is_assigned_to(batch_id))
            })
            .collect();
        if documents.is_empty() {
            debug!(batch_id = %batch_id, "Nothing left assigned to batch");
            return Ok(0);
        }

        let released_at = Utc::now();
        let mut released = 0;
        for document in &mut documents {
            for request in document
                .print_requests
                .iter_mut()
                .filter(|request| request.is_assigned_to(batch_id))
            {
                release_from_batch(request, released_at, Some(reason.to_string()));
                released += 1;
            }
        }

        self.repository.save_all(&mut documents).await?;

        log_batch_operation(
            "release",
            batch_id,
            released,
            PrintRequestStatus::PendingAssignmentToBatch.as_str(),
            Some(reason),
        );
        Ok(released)
    }
}

/// One scheduled batching run
pub struct PrintRequestBatchJob {
    assembly: BatchAssemblyService,
    client: Arc<dyn MessageClient>,
    queue_name: String,
    batch_size: usize,
    max_batches_per_run: usize,
}

impl PrintRequestBatchJob {
    pub fn new(
        assembly: BatchAssemblyService,
        client: Arc<dyn MessageClient>,
        queue_name: impl Into<String>,
        batch_size: usize,
        max_batches_per_run: usize,
    ) -> Self {
        Self {
            assembly,
            client,
            queue_name: queue_name.into(),
            batch_size,
            max_batches_per_run,
        }
    }

    /// Assemble batches until nothing is pending or the per-run limit is hit,
    /// queueing each for transmission. Returns the new batch ids.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<Vec<String>> {
        let mut batch_ids = Vec::new();

        while batch_ids.len() < self.max_batches_per_run {
            let Some(batch_id) = self.assembly.assemble_batch(self.batch_size).await? else {
                break;
            };

            let message = ProcessPrintRequestBatchMessage {
                batch_id: batch_id.clone(),
            };
            if let Err(e) = enqueue(self.client.as_ref(), &self.queue_name, &message).await {
                warn!(batch_id = %batch_id, error = %e, "Batch could not be queued, releasing its requests");
                if let Err(release_error) = self
                    .assembly
                    .release_batch(&batch_id, "batch could not be queued for transmission")
                    .await
                {
                    error!(batch_id = %batch_id, "Batch left assigned without a queued message");
                    log_error(
                        "batch_assembly",
                        "release_batch",
                        &release_error.to_string(),
                        Some(&format!("batchId={batch_id}")),
                    );
                }
                return Err(e.into());
            }
            batch_ids.push(batch_id);
        }

        if !batch_ids.is_empty() {
            info!(batches = batch_ids.len(), "Queued print request batches");
        }
        Ok(batch_ids)
    }
}
