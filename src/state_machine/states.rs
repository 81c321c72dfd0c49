use serde::{Deserialize, Serialize};
use std::fmt;

/// Print request status as tracked through bureau fulfillment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrintRequestStatus {
    /// Waiting to be grouped into a batch
    PendingAssignmentToBatch,
    /// Grouped into a batch, bundle not yet sent
    AssignedToBatch,
    /// Bundle uploaded to the bureau
    SentToPrintProvider,
    /// Bureau acknowledged the batch
    ReceivedByPrintProvider,
    /// Bureau validated the request
    ValidatedByPrintProvider,
    /// Document is being produced
    InProduction,
    /// Document posted to the applicant
    Dispatched,
    /// Returned undelivered after dispatch
    NotDelivered,
    PrintProviderValidationFailed,
    PrintProviderProductionFailed,
    PrintProviderDispatchFailed,
}

impl PrintRequestStatus {
    pub const ALL: [PrintRequestStatus; 11] = [
        Self::PendingAssignmentToBatch,
        Self::AssignedToBatch,
        Self::SentToPrintProvider,
        Self::ReceivedByPrintProvider,
        Self::ValidatedByPrintProvider,
        Self::InProduction,
        Self::Dispatched,
        Self::NotDelivered,
        Self::PrintProviderValidationFailed,
        Self::PrintProviderProductionFailed,
        Self::PrintProviderDispatchFailed,
    ];

    /// Check if this is a terminal state (no further bureau updates expected)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Dispatched | Self::NotDelivered)
    }

    /// Check if the bureau reported a failure for this request
    pub fn is_print_provider_failure(&self) -> bool {
        matches!(
            self,
            Self::PrintProviderValidationFailed
                | Self::PrintProviderProductionFailed
                | Self::PrintProviderDispatchFailed
        )
    }

    /// Statuses that must trigger an ERO / requester notification
    pub fn requires_notification(&self) -> bool {
        matches!(self, Self::NotDelivered) || self.is_print_provider_failure()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PendingAssignmentToBatch => "PENDING_ASSIGNMENT_TO_BATCH",
            Self::AssignedToBatch => "ASSIGNED_TO_BATCH",
            Self::SentToPrintProvider => "SENT_TO_PRINT_PROVIDER",
            Self::ReceivedByPrintProvider => "RECEIVED_BY_PRINT_PROVIDER",
            Self::ValidatedByPrintProvider => "VALIDATED_BY_PRINT_PROVIDER",
            Self::InProduction => "IN_PRODUCTION",
            Self::Dispatched => "DISPATCHED",
            Self::NotDelivered => "NOT_DELIVERED",
            Self::PrintProviderValidationFailed => "PRINT_PROVIDER_VALIDATION_FAILED",
            Self::PrintProviderProductionFailed => "PRINT_PROVIDER_PRODUCTION_FAILED",
            Self::PrintProviderDispatchFailed => "PRINT_PROVIDER_DISPATCH_FAILED",
        }
    }
}

impl fmt::Display for PrintRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PrintRequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|status| status.as_str() == s)
            .copied()
            .ok_or_else(|| format!("Invalid print request status: {s}"))
    }
}

/// Default state for new print requests
impl Default for PrintRequestStatus {
    fn default() -> Self {
        Self::PendingAssignmentToBatch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_check() {
        assert!(PrintRequestStatus::Dispatched.is_terminal());
        assert!(PrintRequestStatus::NotDelivered.is_terminal());
        assert!(!PrintRequestStatus::PrintProviderDispatchFailed.is_terminal());
        assert!(!PrintRequestStatus::PendingAssignmentToBatch.is_terminal());
    }

    #[test]
    fn test_notification_statuses() {
        let notifying: Vec<_> = PrintRequestStatus::ALL
            .iter()
            .filter(|s| s.requires_notification())
            .collect();
        assert_eq!(notifying.len(), 4);
        assert!(PrintRequestStatus::NotDelivered.requires_notification());
        assert!(!PrintRequestStatus::Dispatched.requires_notification());
    }

    #[test]
    fn test_state_string_conversion() {
        for status in PrintRequestStatus::ALL {
            assert_eq!(status.to_string().parse::<PrintRequestStatus>(), Ok(status));
        }
        assert!("dispatched".parse::<PrintRequestStatus>().is_err());
    }

    #[test]
    fn test_state_serde() {
        let json = serde_json::to_string(&PrintRequestStatus::ReceivedByPrintProvider).unwrap();
        assert_eq!(json, "\"RECEIVED_BY_PRINT_PROVIDER\"");

        let parsed: PrintRequestStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, PrintRequestStatus::ReceivedByPrintProvider);
    }
}
