use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::{StateMachineError, StateMachineResult};
use super::states::PrintRequestStatus;

/// Production step reported by the bureau for a single request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusStep {
    Processed,
    InProduction,
    Dispatched,
    NotDelivered,
}

impl fmt::Display for StatusStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Processed => write!(f, "PROCESSED"),
            Self::InProduction => write!(f, "IN_PRODUCTION"),
            Self::Dispatched => write!(f, "DISPATCHED"),
            Self::NotDelivered => write!(f, "NOT_DELIVERED"),
        }
    }
}

/// Outcome the bureau attaches to a batch or a request step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseOutcome {
    Success,
    Failed,
}

impl fmt::Display for ResponseOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "SUCCESS"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

/// Derive the target status for a bureau `(statusStep, outcome)` pair.
///
/// `NOT_DELIVERED` is only ever reported with `FAILED`; every other
/// combination outside the table is rejected.
pub fn status_for_step(
    step: StatusStep,
    outcome: ResponseOutcome,
) -> StateMachineResult<PrintRequestStatus> {
    use PrintRequestStatus as S;
    use ResponseOutcome::{Failed, Success};

    match (step, outcome) {
        (StatusStep::Processed, Success) => Ok(S::ValidatedByPrintProvider),
        (StatusStep::InProduction, Success) => Ok(S::InProduction),
        (StatusStep::Dispatched, Success) => Ok(S::Dispatched),
        (StatusStep::NotDelivered, Failed) => Ok(S::NotDelivered),
        (StatusStep::Processed, Failed) => Ok(S::PrintProviderValidationFailed),
        (StatusStep::InProduction, Failed) => Ok(S::PrintProviderProductionFailed),
        (StatusStep::Dispatched, Failed) => Ok(S::PrintProviderDispatchFailed),
        (step, outcome) => Err(StateMachineError::UndefinedStatusCombination { step, outcome }),
    }
}

/// Status appended to every member of a batch on a batch-level response
pub fn status_for_batch_outcome(outcome: ResponseOutcome) -> PrintRequestStatus {
    match outcome {
        ResponseOutcome::Success => PrintRequestStatus::ReceivedByPrintProvider,
        ResponseOutcome::Failed => PrintRequestStatus::PendingAssignmentToBatch,
    }
}
