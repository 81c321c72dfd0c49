//! # Message Structures for pgmq Queues
//!
//! Payloads of the inbound and outbound queues of the print pipeline. Field
//! names are camelCase on the wire to match the producers on the other side.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state_machine::{ResponseOutcome, StatusStep};

/// Send the bundle for one assembled batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessPrintRequestBatchMessage {
    pub batch_id: String,
}

/// A bureau response file has arrived on the SFTP server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessPrintResponseFileMessage {
    pub directory: String,
    pub file_name: String,
    /// Routes the statistics event; absent means the voter card route
    #[serde(default)]
    pub is_from_applications_api: Option<bool>,
}

/// One request-level bureau response, fanned out from a response file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessPrintResponseMessage {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
    pub status_step: StatusStep,
    pub status: ResponseOutcome,
    pub message: Option<String>,
    #[serde(default)]
    pub is_from_applications_api: Option<bool>,
}

/// Downstream statistics refresh for one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsUpdateMessage {
    pub source_reference: String,
}

/// Rendered email handed to the external mail transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundEmailMessage {
    pub from: String,
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub subject: String,
    pub html_body: String,
    pub requested_at: DateTime<Utc>,
}
