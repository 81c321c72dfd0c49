//! # Batch Transmission
//!
//! Sends an assembled batch to the bureau: build the bundle, upload it, then
//! mark every member `SENT_TO_PRINT_PROVIDER` in one versioned save.

use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument};

use super::print_file::PrintFileFactory;
use crate::database::PrintableDocumentRepository;
use crate::error::Result;
use crate::logging::log_batch_operation;
use crate::models::PrintableDocument;
use crate::sftp::SftpService;
use crate::state_machine::{advance, PrintRequestStatus};

pub struct PrintRequestBatchService {
    repository: Arc<dyn PrintableDocumentRepository>,
    print_files: PrintFileFactory,
    sftp: Arc<SftpService>,
}

impl PrintRequestBatchService {
    pub fn new(
        repository: Arc<dyn PrintableDocumentRepository>,
        print_files: PrintFileFactory,
        sftp: Arc<SftpService>,
    ) -> Self {
        Self {
            repository,
            print_files,
            sftp,
        }
    }

    /// Returns the remote path of the uploaded bundle, or `None` when the
    /// batch has no members still waiting to be sent.
    #[instrument(skip(self))]
    pub async fn send_batch(&self, batch_id: &str) -> Result<Option<String>> {
        let mut documents: Vec<PrintableDocument> = self
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
            info!(batch_id = %batch_id, "Batch has nothing left to send");
            return Ok(None);
        }

        let bundle = self
            .print_files
            .build_bundle(batch_id, &documents, Utc::now())
            .await?;
        let request_count = bundle.request_count;
        let remote_path = self.sftp.send_file(&bundle.file_name, bundle.bytes).await?;

        let sent_at = Utc::now();
        for document in &mut documents {
            for request in document
                .print_requests
                .iter_mut()
                .filter(|request| request.is_assigned_to(batch_id))
            {
                advance(request, PrintRequestStatus::SentToPrintProvider, sent_at, None);
            }
        }
        self.repository.save_all(&mut documents).await?;

        log_batch_operation(
            "send",
            batch_id,
            request_count,
            PrintRequestStatus::SentToPrintProvider.as_str(),
            Some(&remote_path),
        );
        Ok(Some(remote_path))
    }
}
