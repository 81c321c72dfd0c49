//! # Printable Document Model
//!
//! Aggregate root for certificates, temporary certificates and anonymous
//! elector documents.
//!
//! ## Overview
//!
//! A document is identified by `(source_type, source_reference)` and a globally
//! unique document number. It owns its print requests, one per issuance attempt,
//! and derives its status from the most recent request.
//!
//! ## Concurrency
//!
//! `version` is compared on every save. A writer holding a stale copy gets
//! `ConcurrentModification` and must reload rather than merge.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::print_request::PrintRequest;
use crate::state_machine::PrintRequestStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentKind {
    Certificate,
    TemporaryCertificate,
    AnonymousElectorDocument,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Certificate => "CERTIFICATE",
            Self::TemporaryCertificate => "TEMPORARY_CERTIFICATE",
            Self::AnonymousElectorDocument => "ANONYMOUS_ELECTOR_DOCUMENT",
        }
    }
}

impl std::str::FromStr for DocumentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CERTIFICATE" => Ok(Self::Certificate),
            "TEMPORARY_CERTIFICATE" => Ok(Self::TemporaryCertificate),
            "ANONYMOUS_ELECTOR_DOCUMENT" => Ok(Self::AnonymousElectorDocument),
            _ => Err(format!("Invalid document kind: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceType {
    VoterCard,
    AnonymousElectorDocument,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VoterCard => "VOTER_CARD",
            Self::AnonymousElectorDocument => "ANONYMOUS_ELECTOR_DOCUMENT",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "VOTER_CARD" => Ok(Self::VoterCard),
            "ANONYMOUS_ELECTOR_DOCUMENT" => Ok(Self::AnonymousElectorDocument),
            _ => Err(format!("Invalid source type: {s}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintableDocument {
    pub id: Uuid,
    pub kind: DocumentKind,
    pub source_type: SourceType,
    pub source_reference: String,
    pub application_reference: String,
    pub application_received_date_time: DateTime<Utc>,
    pub gss_code: String,
    /// Globally unique card / certificate number
    pub document_number: String,
    pub issuing_authority: String,
    pub issuing_authority_cy: Option<String>,
    pub issue_date: NaiveDate,
    pub suggested_expiry_date: Option<NaiveDate>,
    pub initial_retention_removal_date: Option<NaiveDate>,
    pub final_retention_removal_date: Option<NaiveDate>,
    pub print_requests: Vec<PrintRequest>,
    pub version: i64,
}

impl PrintableDocument {
    /// The request that batching and status derivation act on: the most
    /// recent by request time, later position winning ties
    pub fn active_print_request(&self) -> Option<&PrintRequest> {
        self.active_index().map(|index| &self.print_requests[index])
    }

    pub fn active_print_request_mut(&mut self) -> Option<&mut PrintRequest> {
        self.active_index()
            .map(move |index| &mut self.print_requests[index])
    }

    fn active_index(&self) -> Option<usize> {
        self.print_requests
            .iter()
            .enumerate()
            .max_by_key(|(index, request)| (request.request_date_time, *index))
            .map(|(index, _)| index)
    }

    pub fn status(&self) -> Option<PrintRequestStatus> {
        self.active_print_request()
            .and_then(PrintRequest::current_status)
    }

    pub fn print_request(&self, request_id: &str) -> Option<&PrintRequest> {
        self.print_requests
            .iter()
            .find(|request| request.request_id == request_id)
    }

    pub fn print_request_mut(&mut self, request_id: &str) -> Option<&mut PrintRequest> {
        self.print_requests
            .iter_mut()
            .find(|request| request.request_id == request_id)
    }

    pub fn print_requests_in_batch<'a>(
        &'a self,
        batch_id: &'a str,
    ) -> impl Iterator<Item = &'a PrintRequest> + 'a {
        self.print_requests
            .iter()
            .filter(move |request| request.batch_id.as_deref() == Some(batch_id))
    }
}
