//! Printable document builders for integration tests.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use print_fulfillment::models::{
    Address, CertificateFormat, CertificateLanguage, Delivery, DeliveryAddressType, DeliveryClass,
    DocumentKind, ElectoralRegistrationOffice, PrintRequest, PrintRequestStatusEntry,
    PrintableDocument, SourceType, StatusHistory,
};
use print_fulfillment::PrintRequestStatus;

pub const GSS_CODE: &str = "E99999999";
pub const PHOTO_BYTES: &[u8] = b"ABC";

/// 2024-04-01T09:00:00Z
pub fn issued_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 4, 1, 9, 0, 0).unwrap()
}

fn address(street: &str, postcode: &str) -> Address {
    Address {
        street: street.to_string(),
        postcode: postcode.to_string(),
        property: Some("1".to_string()),
        locality: None,
        town: Some("Camrose".to_string()),
        area: None,
        uprn: Some("100000000001".to_string()),
    }
}

pub struct PrintableDocumentBuilder {
    request_id: String,
    received: DateTime<Utc>,
    history: Vec<PrintRequestStatusEntry>,
    batch_id: Option<String>,
    source_reference: String,
}

impl PrintableDocumentBuilder {
    /// Pending certificate whose photo lives at `s3://photos/{request_id}.png`
    pub fn new(request_id: &str) -> Self {
        Self {
            request_id: request_id.to_string(),
            received: issued_at(),
            history: vec![PrintRequestStatusEntry::new(
                PrintRequestStatus::PendingAssignmentToBatch,
                issued_at(),
                None,
            )],
            batch_id: None,
            source_reference: format!("SRC-{request_id}"),
        }
    }

    pub fn received_minutes_before_issue(mut self, minutes: i64) -> Self {
        self.received = issued_at() - Duration::minutes(minutes);
        self
    }

    /// Append a status to the history at `at`
    pub fn then(mut self, status: PrintRequestStatus, at: DateTime<Utc>) -> Self {
        self.history.push(PrintRequestStatusEntry::new(status, at, None));
        self
    }

    /// Grouped into `batch_id`, bundle not yet sent
    pub fn assigned_to_batch(self, batch_id: &str) -> Self {
        let mut builder =
            self.then(PrintRequestStatus::AssignedToBatch, issued_at() + Duration::minutes(1));
        builder.batch_id = Some(batch_id.to_string());
        builder
    }

    /// Assigned and sent to the bureau in `batch_id`
    pub fn sent_in_batch(self, batch_id: &str) -> Self {
        self.assigned_to_batch(batch_id)
            .then(PrintRequestStatus::SentToPrintProvider, issued_at() + Duration::minutes(2))
    }

    pub fn source_reference(mut self, source_reference: &str) -> Self {
        self.source_reference = source_reference.to_string();
        self
    }

    pub fn build(self) -> PrintableDocument {
        let ero = ElectoralRegistrationOffice {
            name: "Camrose City Council".to_string(),
            phone_number: "01234 567890".to_string(),
            email_address: "elections@camrose.gov.uk".to_string(),
            website: "https://camrose.gov.uk".to_string(),
            address: address("Town Hall Street", "CA1 1AA"),
        };
        let request = PrintRequest {
            id: Uuid::new_v4(),
            request_id: self.request_id.clone(),
            batch_id: self.batch_id,
            request_date_time: issued_at(),
            first_name: "Jane".to_string(),
            middle_names: Some("Anne".to_string()),
            surname: "Smith".to_string(),
            certificate_language: CertificateLanguage::En,
            certificate_format: CertificateFormat::Standard,
            delivery: Delivery {
                addressee: "Jane Smith".to_string(),
                address: address("Valley Road", "CA2 2BB"),
                delivery_class: DeliveryClass::Standard,
                delivery_address_type: DeliveryAddressType::Registered,
            },
            ero_english: ero,
            ero_welsh: None,
            photo_location_arn: format!("s3://photos/{}.png", self.request_id),
            user_id: "ero-user@camrose.gov.uk".to_string(),
            requester_email: Some("ero-user@camrose.gov.uk".to_string()),
            status_history: StatusHistory::from_entries(self.history),
        };

        PrintableDocument {
            id: Uuid::new_v4(),
            kind: DocumentKind::Certificate,
            source_type: SourceType::VoterCard,
            source_reference: self.source_reference,
            application_reference: format!("V{}", self.request_id),
            application_received_date_time: self.received,
            gss_code: GSS_CODE.to_string(),
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
