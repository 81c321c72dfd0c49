//! # Print Request Model
//!
//! One attempt to have a printable document produced by the print bureau.
//!
//! Applicant, delivery and photo fields are fixed at creation. Only the
//! `request_id`, `batch_id` and the append-only status history move as the
//! request passes through the pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ero::{Address, ElectoralRegistrationOffice};
use super::status_history::{PrintRequestStatusEntry, StatusHistory};
use crate::state_machine::PrintRequestStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CertificateLanguage {
    En,
    Cy,
}

impl CertificateLanguage {
    pub fn code(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Cy => "cy",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CertificateFormat {
    Standard,
    LargePrint,
}

impl CertificateFormat {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::LargePrint => "large-print",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryClass {
    Standard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryAddressType {
    Registered,
    EroCollection,
    Alternative,
}

impl DeliveryAddressType {
    /// Bureau `deliveryOption` code
    pub fn delivery_option(&self) -> &'static str {
        match self {
            Self::EroCollection => "ero-collection",
            Self::Registered | Self::Alternative => "standard",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Delivery {
    pub addressee: String,
    pub address: Address,
    pub delivery_class: DeliveryClass,
    pub delivery_address_type: DeliveryAddressType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintRequest {
    pub id: Uuid,
    /// Bureau-facing identifier, reassigned whenever the request is reset for retry
    pub request_id: String,
    pub batch_id: Option<String>,
    pub request_date_time: DateTime<Utc>,
    pub first_name: String,
    pub middle_names: Option<String>,
    pub surname: String,
    pub certificate_language: CertificateLanguage,
    pub certificate_format: CertificateFormat,
    pub delivery: Delivery,
    pub ero_english: ElectoralRegistrationOffice,
    pub ero_welsh: Option<ElectoralRegistrationOffice>,
    /// Object storage location of the applicant photo (`s3://` URL or S3 ARN)
    pub photo_location_arn: String,
    /// Requesting user
    pub user_id: String,
    pub requester_email: Option<String>,
    pub status_history: StatusHistory,
}

impl PrintRequest {
    pub fn current_status(&self) -> Option<PrintRequestStatus> {
        self.status_history.current_status()
    }

    pub fn current_status_entry(&self) -> Option<&PrintRequestStatusEntry> {
        self.status_history.current()
    }

    pub fn is_pending_assignment(&self) -> bool {
        self.current_status() == Some(PrintRequestStatus::PendingAssignmentToBatch)
    }

    /// Member of `batch_id` still waiting for its bundle to be sent
    pub fn is_assigned_to(&self, batch_id: &str) -> bool {
        self.batch_id.as_deref() == Some(batch_id)
            && self.current_status() == Some(PrintRequestStatus::AssignedToBatch)
    }
}
