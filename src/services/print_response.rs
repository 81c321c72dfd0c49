//! # Print Response Processing
//!
//! Applies the bureau's batch-level and request-level responses to print
//! requests.
//!
//! ## Failure Policy
//!
//! - A response for an unknown request is logged and dropped.
//! - An undefined status step / outcome pair is logged and dropped; the other
//!   responses of the same file are unaffected.
//! - Persistence and transport failures are returned so the queue message is
//!   redelivered. Nothing is saved before the failure point.
//! - Notification and statistics failures are logged after the save and never
//!   returned.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use super::notification::{FailedRequest, NotificationService};
use super::statistics::StatisticsPublisher;
use crate::database::PrintableDocumentRepository;
use crate::error::{PrintFulfillmentError, Result};
use crate::logging::{log_batch_operation, log_error, log_print_response};
use crate::messaging::{
    enqueue, MessageClient, ProcessPrintResponseFileMessage, ProcessPrintResponseMessage,
};
use crate::models::PrintableDocument;
use crate::retention::RetentionDateResolver;
use crate::sftp::{RemoteFileError, SftpService};
use crate::state_machine::{
    apply_batch_outcome, apply_step_response, status_for_batch_outcome, status_for_step,
    PrintRequestStatus, ResponseOutcome, StatusStep,
};
use crate::utils::generate_request_id;

/// Bureau response file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PrintResponses {
    #[serde(default)]
    pub batch_responses: Vec<BatchResponse>,
    #[serde(default)]
    pub print_responses: Vec<PrintResponse>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResponse {
    pub batch_id: String,
    pub status: ResponseOutcome,
    pub message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintResponse {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
    pub status_step: StatusStep,
    pub status: ResponseOutcome,
    pub message: Option<String>,
}

impl PrintResponse {
    pub fn into_message(self, is_from_applications_api: Option<bool>) -> ProcessPrintResponseMessage {
        ProcessPrintResponseMessage {
            request_id: self.request_id,
            timestamp: self.timestamp,
            status_step: self.status_step,
            status: self.status,
            message: self.message,
            is_from_applications_api,
        }
    }
}

pub struct PrintResponseProcessingService {
    repository: Arc<dyn PrintableDocumentRepository>,
    notifications: Arc<NotificationService>,
    statistics: Arc<StatisticsPublisher>,
    retention: Option<Arc<RetentionDateResolver>>,
    reset_on_request_failure: bool,
}

impl PrintResponseProcessingService {
    pub fn new(
        repository: Arc<dyn PrintableDocumentRepository>,
        notifications: Arc<NotificationService>,
        statistics: Arc<StatisticsPublisher>,
        reset_on_request_failure: bool,
    ) -> Self {
        Self {
            repository,
            notifications,
            statistics,
            retention: None,
            reset_on_request_failure,
        }
    }

    /// Stamp retention removal dates on documents once they are dispatched
    pub fn with_retention(mut self, resolver: Arc<RetentionDateResolver>) -> Self {
        self.retention = Some(resolver);
        self
    }

    /// Apply a batch-level response to every request of the batch
    #[instrument(skip(self, response), fields(batch_id = %response.batch_id, outcome = %response.status))]
    pub async fn process_batch_response(
        &self,
        response: &BatchResponse,
        is_from_applications_api: bool,
    ) -> Result<()> {
        let mut documents = self.repository.find_by_batch_id(&response.batch_id).await?;
        if documents.is_empty() {
            warn!(batch_id = %response.batch_id, "No print requests found for batch response");
            return Ok(());
        }

        let mut request_count = 0;
        for document in &mut documents {
            for request in document
                .print_requests
                .iter_mut()
                .filter(|request| request.batch_id.as_deref() == Some(response.batch_id.as_str()))
            {
                apply_batch_outcome(
                    request,
                    response.status,
                    response.timestamp,
                    response.message.clone(),
                    generate_request_id,
                );
                request_count += 1;
            }
        }

        self.repository.save_all(&mut documents).await?;

        let status = status_for_batch_outcome(response.status);
        log_batch_operation(
            "batch_response",
            &response.batch_id,
            request_count,
            status.as_str(),
            response.message.as_deref(),
        );

        for document in &documents {
            self.publish_statistics(document, is_from_applications_api).await;
        }
        Ok(())
    }

    /// Apply one request-level response
    #[instrument(skip(self, response), fields(request_id = %response.request_id))]
    pub async fn process_print_response(&self, response: &ProcessPrintResponseMessage) -> Result<()> {
        if let Err(e) = status_for_step(response.status_step, response.status) {
            log_error(
                "print_response",
                "map_status",
                &e.to_string(),
                Some(&format!("requestId={}", response.request_id)),
            );
            return Ok(());
        }

        let Some(mut document) = self.repository.find_by_request_id(&response.request_id).await?
        else {
            error!(request_id = %response.request_id, "Print request not found for bureau response");
            return Ok(());
        };

        let request = document.print_request_mut(&response.request_id).ok_or_else(|| {
            PrintFulfillmentError::NotFound(format!("print request {}", response.request_id))
        })?;
        let requester_snapshot = request.clone();

        let status = apply_step_response(
            request,
            response.status_step,
            response.status,
            response.timestamp,
            response.message.clone(),
            self.reset_on_request_failure,
            generate_request_id,
        )?;

        if status == PrintRequestStatus::Dispatched {
            if let Some(retention) = &self.retention {
                retention.apply_to(&mut document).await?;
            }
        }

        self.repository.save(&mut document).await?;

        log_print_response(
            &response.request_id,
            &document.source_reference,
            &response.status_step.to_string(),
            &response.status.to_string(),
            status.as_str(),
        );

        self.publish_statistics(&document, response.is_from_applications_api.unwrap_or(false))
            .await;

        if status.requires_notification() {
            let failed = FailedRequest::new(&requester_snapshot, status, response.message.clone());
            self.notifications.notify(&document, &failed).await;
        }
        Ok(())
    }

    async fn publish_statistics(&self, document: &PrintableDocument, is_from_applications_api: bool) {
        if let Err(e) = self
            .statistics
            .publish(&document.source_reference, is_from_applications_api)
            .await
        {
            log_error(
                "print_response",
                "publish_statistics",
                &e.to_string(),
                Some(&format!("sourceReference={}", document.source_reference)),
            );
        }
    }
}

/// Handles "process print response file": batch responses are applied
/// directly, request responses are fanned out onto the response queue.
pub struct PrintResponseFileService {
    sftp: Arc<SftpService>,
    processing: Arc<PrintResponseProcessingService>,
    client: Arc<dyn MessageClient>,
    print_response_queue: String,
}

impl PrintResponseFileService {
    pub fn new(
        sftp: Arc<SftpService>,
        processing: Arc<PrintResponseProcessingService>,
        client: Arc<dyn MessageClient>,
        print_response_queue: impl Into<String>,
    ) -> Self {
        Self {
            sftp,
            processing,
            client,
            print_response_queue: print_response_queue.into(),
        }
    }

    #[instrument(skip(self, message), fields(file_name = %message.file_name))]
    pub async fn process_file(&self, message: &ProcessPrintResponseFileMessage) -> Result<()> {
        let contents = match self
            .sftp
            .fetch_file_contents(&message.directory, &message.file_name)
            .await
        {
            Ok(contents) => contents,
            Err(PrintFulfillmentError::Transport(RemoteFileError::NotFound { path })) => {
                warn!(remote_path = %path, "Response file already processed");
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let responses: PrintResponses = serde_json::from_str(&contents)?;
        let is_from_applications_api = message.is_from_applications_api.unwrap_or(false);

        for batch_response in &responses.batch_responses {
            self.processing
                .process_batch_response(batch_response, is_from_applications_api)
                .await?;
        }

        let print_response_count = responses.print_responses.len();
        for print_response in responses.print_responses {
            let queued = print_response.into_message(message.is_from_applications_api);
            enqueue(self.client.as_ref(), &self.print_response_queue, &queued).await?;
        }

        info!(
            batch_responses = responses.batch_responses.len(),
            print_responses = print_response_count,
            "Processed print response file"
        );

        self.sftp
            .remove_file(&message.directory, &message.file_name)
            .await;
        Ok(())
    }
}
