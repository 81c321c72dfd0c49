mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use common::*;
use serde_json::json;
use uuid::Uuid;

use print_fulfillment::database::PrintableDocumentRepository;
use print_fulfillment::models::SourceType;
use print_fulfillment::orchestration::DeliveryOutcome;
use print_fulfillment::{
    Collaborators, InMemoryPrintableDocumentRepository, PrintFulfillmentError,
    PrintFulfillmentSystem, PrintRequestStatus, PrintableDocument, Result,
};

fn may(day: u32, hour: u32) -> String {
    Utc.with_ymd_and_hms(2024, 5, day, hour, 0, 0)
        .unwrap()
        .to_rfc3339()
}

/// Drop a response file on the server and run it through both consumers
async fn deliver_response_file(
    pipeline: &TestPipeline,
    system: &PrintFulfillmentSystem,
    file_name: &str,
    contents: serde_json::Value,
) {
    pipeline.remote.put(
        &format!("{RESPONSE_DIRECTORY}/{file_name}"),
        contents.to_string(),
    );
    pipeline
        .send(
            &pipeline.config.queues.print_response_file_queue,
            json!({"directory": RESPONSE_DIRECTORY, "fileName": file_name}),
        )
        .await;

    let outcomes = system.response_file_consumer().process_available().await.unwrap();
    assert_eq!(outcomes, vec![DeliveryOutcome::Deleted]);
    while !system
        .response_consumer()
        .process_available()
        .await
        .unwrap()
        .is_empty()
    {}
}

/// Loses the first save to a concurrent writer, then behaves normally
struct ContendedRepository {
    inner: Arc<InMemoryPrintableDocumentRepository>,
    contended: AtomicBool,
}

#[async_trait]
impl PrintableDocumentRepository for ContendedRepository {
    async fn insert(&self, document: &PrintableDocument) -> Result<()> {
        self.inner.insert(document).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PrintableDocument>> {
        self.inner.find_by_id(id).await
    }

    async fn find_by_source(
        &self,
        source_type: SourceType,
        source_reference: &str,
    ) -> Result<Vec<PrintableDocument>> {
        self.inner.find_by_source(source_type, source_reference).await
    }

    async fn find_by_request_id(&self, request_id: &str) -> Result<Option<PrintableDocument>> {
        self.inner.find_by_request_id(request_id).await
    }

    async fn find_by_batch_id(&self, batch_id: &str) -> Result<Vec<PrintableDocument>> {
        self.inner.find_by_batch_id(batch_id).await
    }

    async fn find_pending_assignment(&self, limit: usize) -> Result<Vec<PrintableDocument>> {
        self.inner.find_pending_assignment(limit).await
    }

    async fn save_all(&self, documents: &mut [PrintableDocument]) -> Result<()> {
        if self.contended.swap(false, Ordering::SeqCst) {
            return Err(PrintFulfillmentError::ConcurrentModification {
                document_id: documents[0].id.to_string(),
                expected_version: documents[0].version,
            });
        }
        self.inner.save_all(documents).await
    }
}

async fn send_print_response(
    pipeline: &TestPipeline,
    system: &PrintFulfillmentSystem,
    response: serde_json::Value,
) -> Vec<DeliveryOutcome> {
    pipeline
        .send(&pipeline.config.queues.print_response_queue, response)
        .await;
    system.response_consumer().process_available().await.unwrap()
}

#[tokio::test]
async fn test_failed_batch_resets_requests_for_rebatching() {
    let pipeline = TestPipeline::new();
    let document = PrintableDocumentBuilder::new("REQ1").sent_in_batch("BATCH1").build();
    pipeline.insert(&document).await;
    let system = pipeline.system().await;

    deliver_response_file(
        &pipeline,
        &system,
        "status-1.json",
        json!({
            "BatchResponses": [
                {"batchId": "BATCH1", "status": "FAILED", "message": "Invalid file", "timestamp": may(2, 12)}
            ]
        }),
    )
    .await;

    let reloaded = pipeline.reload(&document).await;
    let request = &reloaded.print_requests[0];
    assert_eq!(request.current_status(), Some(PrintRequestStatus::PendingAssignmentToBatch));
    assert_ne!(request.request_id, "REQ1");
    assert_eq!(request.batch_id, None);
    assert_eq!(request.status_history.len(), 4);
    assert_eq!(
        request.status_history.current().unwrap().message.as_deref(),
        Some("Invalid file")
    );
    assert!(pipeline
        .remote
        .file(&format!("{RESPONSE_DIRECTORY}/status-1.json"))
        .is_none());
}

#[tokio::test]
async fn test_failed_batch_gives_each_member_a_new_request_id() {
    let pipeline = TestPipeline::new();
    let first = PrintableDocumentBuilder::new("REQ1").sent_in_batch("BATCH1").build();
    let second = PrintableDocumentBuilder::new("REQ2").sent_in_batch("BATCH1").build();
    let other = PrintableDocumentBuilder::new("REQ3").sent_in_batch("BATCH2").build();
    for document in [&first, &second, &other] {
        pipeline.insert(document).await;
    }
    let untouched = pipeline.reload(&other).await;
    let system = pipeline.system().await;

    deliver_response_file(
        &pipeline,
        &system,
        "status-5.json",
        json!({
            "BatchResponses": [
                {"batchId": "BATCH1", "status": "FAILED", "message": "Checksum mismatch", "timestamp": may(2, 12)}
            ]
        }),
    )
    .await;

    let mut new_request_ids = Vec::new();
    for (document, original_id) in [(&first, "REQ1"), (&second, "REQ2")] {
        let request = &pipeline.reload(document).await.print_requests[0];
        assert_eq!(request.current_status(), Some(PrintRequestStatus::PendingAssignmentToBatch));
        assert_eq!(request.batch_id, None);
        assert_ne!(request.request_id, original_id);
        new_request_ids.push(request.request_id.clone());
    }
    assert_ne!(new_request_ids[0], new_request_ids[1]);

    let reloaded_other = pipeline.reload(&other).await;
    assert_eq!(reloaded_other.version, untouched.version);
    let request = &reloaded_other.print_requests[0];
    assert_eq!(request.current_status(), Some(PrintRequestStatus::SentToPrintProvider));
    assert_eq!(request.request_id, "REQ3");
    assert_eq!(request.batch_id.as_deref(), Some("BATCH2"));
}

#[tokio::test]
async fn test_successful_batch_marks_requests_received() {
    let pipeline = TestPipeline::new();
    let first = PrintableDocumentBuilder::new("REQ1").sent_in_batch("BATCH1").build();
    let second = PrintableDocumentBuilder::new("REQ2").sent_in_batch("BATCH1").build();
    let other = PrintableDocumentBuilder::new("REQ3").sent_in_batch("BATCH2").build();
    for document in [&first, &second, &other] {
        pipeline.insert(document).await;
    }
    let system = pipeline.system().await;

    deliver_response_file(
        &pipeline,
        &system,
        "status-2.json",
        json!({
            "BatchResponses": [
                {"batchId": "BATCH1", "status": "SUCCESS", "message": null, "timestamp": may(2, 12)}
            ],
            "PrintResponses": []
        }),
    )
    .await;

    for document in [&first, &second] {
        let request = &pipeline.reload(document).await.print_requests[0];
        assert_eq!(request.current_status(), Some(PrintRequestStatus::ReceivedByPrintProvider));
        assert_eq!(request.batch_id.as_deref(), Some("BATCH1"));
    }
    assert_eq!(
        pipeline.reload(&other).await.print_requests[0].current_status(),
        Some(PrintRequestStatus::SentToPrintProvider)
    );

    let statistics = pipeline.queue(&pipeline.config.queues.voter_card_statistics_queue);
    assert_eq!(statistics.len(), 2);
    assert!(statistics.contains(&json!({"sourceReference": "SRC-REQ1"})));
}

#[tokio::test]
async fn test_response_file_fans_out_request_responses() {
    let pipeline = TestPipeline::new();
    let first = PrintableDocumentBuilder::new("REQ1").sent_in_batch("BATCH1").build();
    let second = PrintableDocumentBuilder::new("REQ2").sent_in_batch("BATCH1").build();
    pipeline.insert(&first).await;
    pipeline.insert(&second).await;
    let system = pipeline.system().await;

    pipeline.remote.put(
        &format!("{RESPONSE_DIRECTORY}/status-3.json"),
        json!({
            "BatchResponses": [
                {"batchId": "BATCH1", "status": "SUCCESS", "message": null, "timestamp": may(2, 12)}
            ],
            "PrintResponses": [
                {"requestId": "REQ1", "timestamp": may(3, 8), "statusStep": "PROCESSED", "status": "SUCCESS", "message": null},
                {"requestId": "REQ2", "timestamp": may(3, 8), "statusStep": "IN_PRODUCTION", "status": "SUCCESS", "message": null}
            ]
        })
        .to_string(),
    );
    pipeline
        .send(
            &pipeline.config.queues.print_response_file_queue,
            json!({"directory": RESPONSE_DIRECTORY, "fileName": "status-3.json", "isFromApplicationsApi": true}),
        )
        .await;

    system.response_file_consumer().process_available().await.unwrap();

    let queued = pipeline.queue(&pipeline.config.queues.print_response_queue);
    assert_eq!(queued.len(), 2);
    assert_eq!(queued[0]["requestId"], "REQ1");
    assert_eq!(queued[0]["isFromApplicationsApi"], true);
    assert!(pipeline.remote.paths().is_empty());

    let outcomes = system.response_consumer().process_available().await.unwrap();
    assert_eq!(outcomes, vec![DeliveryOutcome::Deleted; 2]);
    assert_eq!(
        pipeline.reload(&first).await.print_requests[0].current_status(),
        Some(PrintRequestStatus::ValidatedByPrintProvider)
    );
    assert_eq!(
        pipeline.reload(&second).await.print_requests[0].current_status(),
        Some(PrintRequestStatus::InProduction)
    );
    assert_eq!(
        pipeline
            .queue(&pipeline.config.queues.applications_statistics_queue)
            .len(),
        4
    );
}

#[tokio::test]
async fn test_missing_response_file_is_already_processed() {
    let pipeline = TestPipeline::new();
    let system = pipeline.system().await;

    pipeline
        .send(
            &pipeline.config.queues.print_response_file_queue,
            json!({"directory": RESPONSE_DIRECTORY, "fileName": "gone.json"}),
        )
        .await;

    let outcomes = system.response_file_consumer().process_available().await.unwrap();
    assert_eq!(outcomes, vec![DeliveryOutcome::Deleted]);
    assert!(pipeline
        .queue(&pipeline.config.queues.print_response_queue)
        .is_empty());
}

#[tokio::test]
async fn test_malformed_response_file_is_archived_without_retry() {
    let pipeline = TestPipeline::new();
    let system = pipeline.system().await;
    let queue = pipeline.config.queues.print_response_file_queue.clone();

    pipeline
        .remote
        .put(&format!("{RESPONSE_DIRECTORY}/broken.json"), "{not json");
    pipeline
        .send(&queue, json!({"directory": RESPONSE_DIRECTORY, "fileName": "broken.json"}))
        .await;

    let outcomes = system.response_file_consumer().process_available().await.unwrap();
    assert_eq!(outcomes, vec![DeliveryOutcome::Archived]);
    assert_eq!(pipeline.client.archived(&queue).len(), 1);

    // left in place for investigation
    assert!(pipeline
        .remote
        .file(&format!("{RESPONSE_DIRECTORY}/broken.json"))
        .is_some());
}

#[tokio::test]
async fn test_not_delivered_notifies_ero_once() {
    let pipeline = TestPipeline::new();
    let document = PrintableDocumentBuilder::new("REQ1")
        .sent_in_batch("BATCH1")
        .then(PrintRequestStatus::Dispatched, issued_at() + Duration::days(3))
        .build();
    pipeline.insert(&document).await;
    let system = pipeline.system().await;

    let outcomes = send_print_response(
        &pipeline,
        &system,
        json!({
            "requestId": "REQ1",
            "timestamp": may(10, 9),
            "statusStep": "NOT_DELIVERED",
            "status": "FAILED",
            "message": "Addressee unknown"
        }),
    )
    .await;
    assert_eq!(outcomes, vec![DeliveryOutcome::Deleted]);

    let request = &pipeline.reload(&document).await.print_requests[0];
    assert_eq!(request.current_status(), Some(PrintRequestStatus::NotDelivered));
    assert_eq!(request.request_id, "REQ1");

    let emails = pipeline.email.attempts();
    assert_eq!(emails.len(), 1);
    assert_eq!(emails[0].to, vec![ERO_EMAIL.to_string()]);
    assert_eq!(emails[0].cc, vec!["ero-user@camrose.gov.uk".to_string()]);
    assert!(emails[0].html_body.contains("VREQ1"));
    assert!(emails[0].html_body.contains("Addressee unknown"));
}

#[tokio::test]
async fn test_production_failure_resets_and_notifies_with_original_request() {
    let pipeline = TestPipeline::new();
    let document = PrintableDocumentBuilder::new("REQ1").sent_in_batch("BATCH1").build();
    pipeline.insert(&document).await;
    let system = pipeline.system().await;

    send_print_response(
        &pipeline,
        &system,
        json!({
            "requestId": "REQ1",
            "timestamp": may(3, 8),
            "statusStep": "IN_PRODUCTION",
            "status": "FAILED",
            "message": "Photo unusable"
        }),
    )
    .await;

    let request = &pipeline.reload(&document).await.print_requests[0];
    assert_eq!(request.current_status(), Some(PrintRequestStatus::PendingAssignmentToBatch));
    assert_ne!(request.request_id, "REQ1");
    assert!(request
        .status_history
        .entries()
        .iter()
        .any(|entry| entry.status == PrintRequestStatus::PrintProviderProductionFailed));

    let emails = pipeline.email.attempts();
    assert_eq!(emails.len(), 1);
    assert!(emails[0].html_body.contains("REQ1"));
}

#[tokio::test]
async fn test_email_failure_does_not_block_status_update() {
    let pipeline = TestPipeline::new();
    let document = PrintableDocumentBuilder::new("REQ1").sent_in_batch("BATCH1").build();
    pipeline.insert(&document).await;
    pipeline.email.fail_with("mail relay down");
    let system = pipeline.system().await;

    let outcomes = send_print_response(
        &pipeline,
        &system,
        json!({
            "requestId": "REQ1",
            "timestamp": may(3, 8),
            "statusStep": "PROCESSED",
            "status": "FAILED",
            "message": null
        }),
    )
    .await;

    assert_eq!(outcomes, vec![DeliveryOutcome::Deleted]);
    assert_eq!(pipeline.email.attempts().len(), 1);
    assert_eq!(
        pipeline.reload(&document).await.print_requests[0].current_status(),
        Some(PrintRequestStatus::PendingAssignmentToBatch)
    );
}

#[tokio::test]
async fn test_dispatched_stamps_retention_dates() {
    let pipeline = TestPipeline::new();
    let document = PrintableDocumentBuilder::new("REQ1").sent_in_batch("BATCH1").build();
    pipeline.insert(&document).await;
    let system = pipeline.system().await;

    send_print_response(
        &pipeline,
        &system,
        json!({
            "requestId": "REQ1",
            "timestamp": may(6, 15),
            "statusStep": "DISPATCHED",
            "status": "SUCCESS",
            "message": null
        }),
    )
    .await;

    let reloaded = pipeline.reload(&document).await;
    assert_eq!(
        reloaded.print_requests[0].current_status(),
        Some(PrintRequestStatus::Dispatched)
    );
    // issued 2024-04-01, 28 working days with no configured holidays
    assert_eq!(
        reloaded.initial_retention_removal_date,
        NaiveDate::from_ymd_opt(2024, 5, 9)
    );
    assert_eq!(
        reloaded.final_retention_removal_date,
        NaiveDate::from_ymd_opt(2033, 4, 1)
    );
    assert!(pipeline.email.attempts().is_empty());
}

#[tokio::test]
async fn test_unknown_request_and_undefined_combination_are_dropped() {
    let pipeline = TestPipeline::new();
    let document = PrintableDocumentBuilder::new("REQ1").sent_in_batch("BATCH1").build();
    pipeline.insert(&document).await;
    let system = pipeline.system().await;

    let ghost = send_print_response(
        &pipeline,
        &system,
        json!({
            "requestId": "GHOST",
            "timestamp": may(3, 8),
            "statusStep": "PROCESSED",
            "status": "SUCCESS",
            "message": null
        }),
    )
    .await;
    let undefined = send_print_response(
        &pipeline,
        &system,
        json!({
            "requestId": "REQ1",
            "timestamp": may(3, 9),
            "statusStep": "NOT_DELIVERED",
            "status": "SUCCESS",
            "message": null
        }),
    )
    .await;

    assert_eq!(ghost, vec![DeliveryOutcome::Deleted]);
    assert_eq!(undefined, vec![DeliveryOutcome::Deleted]);

    let reloaded = pipeline.reload(&document).await;
    assert_eq!(reloaded.version, document.version);
    assert_eq!(
        reloaded.print_requests[0].current_status(),
        Some(PrintRequestStatus::SentToPrintProvider)
    );
    assert!(pipeline.email.attempts().is_empty());
}

#[tokio::test]
async fn test_undeserializable_response_is_archived() {
    let pipeline = TestPipeline::new();
    let system = pipeline.system().await;
    let queue = pipeline.config.queues.print_response_queue.clone();

    let outcomes = send_print_response(
        &pipeline,
        &system,
        json!({"requestId": "REQ1", "statusStep": "SHREDDED"}),
    )
    .await;

    assert_eq!(outcomes, vec![DeliveryOutcome::Archived]);
    assert_eq!(pipeline.client.archived(&queue).len(), 1);
    assert!(pipeline.queue(&queue).is_empty());
}

#[tokio::test]
async fn test_full_cycle_from_pending_to_dispatched() {
    let mut pipeline = TestPipeline::new();
    // one response at a time so updates to the same document never race
    pipeline.config.workers.print_response_concurrency = 1;
    let document = PrintableDocumentBuilder::new("REQ1").build();
    pipeline.insert(&document).await;
    let system = pipeline.system().await;

    system.scheduler().tick().await.unwrap();
    system.batch_consumer().process_available().await.unwrap();
    let batch_id = pipeline.reload(&document).await.print_requests[0]
        .batch_id
        .clone()
        .expect("batched");

    let later = |minutes: i64| (Utc::now() + Duration::minutes(minutes)).to_rfc3339();
    deliver_response_file(
        &pipeline,
        &system,
        "status-cycle.json",
        json!({
            "BatchResponses": [
                {"batchId": batch_id, "status": "SUCCESS", "message": null, "timestamp": later(1)}
            ],
            "PrintResponses": [
                {"requestId": "REQ1", "timestamp": later(2), "statusStep": "PROCESSED", "status": "SUCCESS", "message": null},
                {"requestId": "REQ1", "timestamp": later(3), "statusStep": "IN_PRODUCTION", "status": "SUCCESS", "message": null},
                {"requestId": "REQ1", "timestamp": later(4), "statusStep": "DISPATCHED", "status": "SUCCESS", "message": null}
            ]
        }),
    )
    .await;

    let reloaded = pipeline.reload(&document).await;
    let statuses: Vec<_> = reloaded.print_requests[0]
        .status_history
        .entries()
        .iter()
        .map(|entry| entry.status)
        .collect();
    assert_eq!(
        statuses,
        vec![
            PrintRequestStatus::PendingAssignmentToBatch,
            PrintRequestStatus::AssignedToBatch,
            PrintRequestStatus::SentToPrintProvider,
            PrintRequestStatus::ReceivedByPrintProvider,
            PrintRequestStatus::ValidatedByPrintProvider,
            PrintRequestStatus::InProduction,
            PrintRequestStatus::Dispatched,
        ]
    );
    assert!(reloaded.final_retention_removal_date.is_some());
}

#[tokio::test]
async fn test_conflicting_save_is_retried_on_redelivery() {
    let pipeline = TestPipeline::new();
    let document = PrintableDocumentBuilder::new("REQ1").sent_in_batch("BATCH1").build();
    pipeline.insert(&document).await;

    let collaborators = Collaborators {
        repository: Arc::new(ContendedRepository {
            inner: pipeline.repository.clone(),
            contended: AtomicBool::new(true),
        }),
        ..pipeline.collaborators()
    };
    let system = PrintFulfillmentSystem::build(&pipeline.config, collaborators);
    system.create_queues().await.unwrap();

    let response_queue = pipeline.config.queues.print_response_queue.clone();
    let outcomes = send_print_response(
        &pipeline,
        &system,
        json!({
            "requestId": "REQ1",
            "timestamp": may(3, 8),
            "statusStep": "IN_PRODUCTION",
            "status": "SUCCESS",
            "message": null
        }),
    )
    .await;
    assert_eq!(outcomes, vec![DeliveryOutcome::Retained]);
    assert_eq!(
        pipeline.reload(&document).await.print_requests[0].current_status(),
        Some(PrintRequestStatus::SentToPrintProvider)
    );

    pipeline.client.expire_visibility(&response_queue);
    let outcomes = system.response_consumer().process_available().await.unwrap();
    assert_eq!(outcomes, vec![DeliveryOutcome::Deleted]);
    assert_eq!(
        pipeline.reload(&document).await.print_requests[0].current_status(),
        Some(PrintRequestStatus::InProduction)
    );
    assert!(pipeline.client.archived(&response_queue).is_empty());
    assert!(pipeline.queue(&response_queue).is_empty());
}
