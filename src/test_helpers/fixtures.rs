//! Printable document fixtures on a fixed clock.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use crate::models::{
    Address, CertificateFormat, CertificateLanguage, Delivery, DeliveryAddressType, DeliveryClass,
    DocumentKind, ElectoralRegistrationOffice, PrintRequest, PrintRequestStatusEntry,
    PrintableDocument, SourceType, StatusHistory,
};
use crate::state_machine::PrintRequestStatus;

pub const FIXTURE_GSS_CODE: &str = "E99999999";

/// 2024-04-01T09:00:00Z
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 4, 1, 9, 0, 0).unwrap()
}

pub fn address(street: &str, postcode: &str) -> Address {
    Address {
        street: street.to_string(),
        postcode: postcode.to_string(),
        property: Some("1".to_string()),
        locality: None,
        town: Some("Camrose".to_string()),
        area: None,
        uprn: None,
    }
}

pub fn ero() -> ElectoralRegistrationOffice {
    ElectoralRegistrationOffice {
        name: "Camrose City Council".to_string(),
        phone_number: "01234 567890".to_string(),
        email_address: "elections@camrose.gov.uk".to_string(),
        website: "https://camrose.gov.uk".to_string(),
        address: address("Town Hall Street", "CA1 1AA"),
    }
}

/// Print request whose history is a single entry with `status`
pub fn print_request_with_status(
    request_id: &str,
    status: PrintRequestStatus,
    event_date_time: DateTime<Utc>,
) -> PrintRequest {
    PrintRequest {
        id: Uuid::new_v4(),
        request_id: request_id.to_string(),
        batch_id: None,
        request_date_time: base_time(),
        first_name: "Jane".to_string(),
        middle_names: None,
        surname: "Smith".to_string(),
        certificate_language: CertificateLanguage::En,
        certificate_format: CertificateFormat::Standard,
        delivery: Delivery {
            addressee: "Jane Smith".to_string(),
            address: address("Valley Road", "CA2 2BB"),
            delivery_class: DeliveryClass::Standard,
            delivery_address_type: DeliveryAddressType::Registered,
        },
        ero_english: ero(),
        ero_welsh: None,
        photo_location_arn: format!("s3://bucket/{request_id}.png"),
        user_id: "ero-user@camrose.gov.uk".to_string(),
        requester_email: Some("ero-user@camrose.gov.uk".to_string()),
        status_history: StatusHistory::from_entries(vec![PrintRequestStatusEntry::new(
            status,
            event_date_time,
            None,
        )]),
    }
}

/// Builds a certificate with one active print request
pub struct DocumentBuilder {
    request_id: String,
    received: DateTime<Utc>,
    status: PrintRequestStatus,
    batch_id: Option<String>,
}

impl DocumentBuilder {
    pub fn new(request_id: &str) -> Self {
        Self {
            request_id: request_id.to_string(),
            received: base_time(),
            status: PrintRequestStatus::PendingAssignmentToBatch,
            batch_id: None,
        }
    }

    /// Application received `minutes` before the fixture clock
    pub fn received_minutes_ago(mut self, minutes: i64) -> Self {
        self.received = base_time() - Duration::minutes(minutes);
        self
    }

    /// Current status; the history starts at pending assignment
    pub fn status(mut self, status: PrintRequestStatus) -> Self {
        self.status = status;
        self
    }

    pub fn batch(mut self, batch_id: &str) -> Self {
        self.batch_id = Some(batch_id.to_string());
        self
    }

    pub fn build(self) -> PrintableDocument {
        let mut request = print_request_with_status(
            &self.request_id,
            PrintRequestStatus::PendingAssignmentToBatch,
            base_time(),
        );
        if self.status != PrintRequestStatus::PendingAssignmentToBatch {
            request.status_history.append(PrintRequestStatusEntry::new(
                self.status,
                base_time() + Duration::minutes(1),
                None,
            ));
        }
        request.batch_id = self.batch_id;

        PrintableDocument {
            id: Uuid::new_v4(),
            kind: DocumentKind::Certificate,
            source_type: SourceType::VoterCard,
            source_reference: format!("SRC-{}", self.request_id),
            application_reference: format!("V{}", self.request_id),
            application_received_date_time: self.received,
            gss_code: FIXTURE_GSS_CODE.to_string(),
            document_number: format!("CERT-{}", self.request_id),
            issuing_authority: "Camrose City Council".to_string(),
            issuing_authority_cy: None,
            issue_date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            suggested_expiry_date: None,
            initial_retention_removal_date: None,
            final_retention_removal_date: None,
            print_requests: vec![request],
            version: 0,
        }
    }
}
