//! # Print Request State Machine
//!
//! Transition helpers over a print request's status history.
//!
//! The machine accepts any append: the bureau is authoritative for which step
//! follows which, so no transition is rejected here. Callers derive the target
//! status (see [`status_for_step`]) and the machine records it.
//!
//! ```text
//! PENDING_ASSIGNMENT_TO_BATCH -> ASSIGNED_TO_BATCH -> SENT_TO_PRINT_PROVIDER
//!   -> RECEIVED_BY_PRINT_PROVIDER -> VALIDATED_BY_PRINT_PROVIDER -> IN_PRODUCTION
//!   -> DISPATCHED* -> NOT_DELIVERED*
//!
//! PRINT_PROVIDER_*_FAILED -> (reset, new request id) PENDING_ASSIGNMENT_TO_BATCH
//! ```

use chrono::{DateTime, Utc};

use super::errors::StateMachineResult;
use super::events::{status_for_step, ResponseOutcome, StatusStep};
use super::states::PrintRequestStatus;
use crate::models::{PrintRequest, PrintRequestStatusEntry};

/// Append `status` to the request's history and return the new entry
pub fn advance(
    request: &mut PrintRequest,
    status: PrintRequestStatus,
    event_date_time: DateTime<Utc>,
    message: Option<String>,
) -> PrintRequestStatusEntry {
    let entry = PrintRequestStatusEntry::new(status, event_date_time, message);
    request.status_history.append(entry).clone()
}

/// Group a pending request into `batch_id`
pub fn assign_to_batch(request: &mut PrintRequest, batch_id: &str, event_date_time: DateTime<Utc>) {
    request.batch_id = Some(batch_id.to_string());
    advance(
        request,
        PrintRequestStatus::AssignedToBatch,
        event_date_time,
        None,
    );
}

/// Undo a batch assignment the bureau never saw; the request id is kept
pub fn release_from_batch(
    request: &mut PrintRequest,
    event_date_time: DateTime<Utc>,
    message: Option<String>,
) {
    request.batch_id = None;
    advance(
        request,
        PrintRequestStatus::PendingAssignmentToBatch,
        event_date_time,
        message,
    );
}

/// Return the request to the batching pool under a fresh bureau id
pub fn reset_for_rebatching(
    request: &mut PrintRequest,
    new_request_id: String,
    event_date_time: DateTime<Utc>,
    message: Option<String>,
) {
    request.request_id = new_request_id;
    request.batch_id = None;
    advance(
        request,
        PrintRequestStatus::PendingAssignmentToBatch,
        event_date_time,
        message,
    );
}

/// Apply a batch-level bureau outcome to one member of the batch
pub fn apply_batch_outcome(
    request: &mut PrintRequest,
    outcome: ResponseOutcome,
    event_date_time: DateTime<Utc>,
    message: Option<String>,
    new_request_id: impl FnOnce() -> String,
) -> PrintRequestStatus {
    match outcome {
        ResponseOutcome::Success => {
            advance(
                request,
                PrintRequestStatus::ReceivedByPrintProvider,
                event_date_time,
                message,
            );
        }
        ResponseOutcome::Failed => {
            reset_for_rebatching(request, new_request_id(), event_date_time, message);
        }
    }
    super::events::status_for_batch_outcome(outcome)
}

/// Apply a request-level bureau response.
///
/// Returns the mapped status. When `reset_on_failure` is set, a print-provider
/// failure is followed by a reset entry at the same instant, which then becomes
/// the current status.
pub fn apply_step_response(
    request: &mut PrintRequest,
    step: StatusStep,
    outcome: ResponseOutcome,
    event_date_time: DateTime<Utc>,
    message: Option<String>,
    reset_on_failure: bool,
    new_request_id: impl FnOnce() -> String,
) -> StateMachineResult<PrintRequestStatus> {
    let status = status_for_step(step, outcome)?;
    advance(request, status, event_date_time, message.clone());

    if reset_on_failure && status.is_print_provider_failure() {
        reset_for_rebatching(request, new_request_id(), event_date_time, message);
    }

    Ok(status)
}
