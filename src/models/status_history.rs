//! # Print Request Status History
//!
//! Append-only audit trail of a print request's statuses.
//!
//! ## Ordering
//!
//! The current status is the entry with the latest `event_date_time`. When two
//! entries share a timestamp the one appended later wins, so a reset appended at
//! the same instant as the failure it follows becomes current.
//!
//! ## Database Schema
//!
//! Maps to `print_request_statuses`:
//! ```sql
//! CREATE TABLE print_request_statuses (
//!   print_request_id UUID NOT NULL REFERENCES print_requests (id),
//!   sort_key INTEGER NOT NULL,
//!   status VARCHAR(64) NOT NULL,
//!   event_date_time TIMESTAMPTZ NOT NULL,
//!   message TEXT,
//!   created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!   PRIMARY KEY (print_request_id, sort_key)
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state_machine::PrintRequestStatus;

/// One immutable status entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintRequestStatusEntry {
    pub status: PrintRequestStatus,
    pub event_date_time: DateTime<Utc>,
    pub message: Option<String>,
}

impl PrintRequestStatusEntry {
    pub fn new(
        status: PrintRequestStatus,
        event_date_time: DateTime<Utc>,
        message: Option<String>,
    ) -> Self {
        Self {
            status,
            event_date_time,
            message,
        }
    }
}

/// Insertion-ordered status entries; only `append` mutates it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusHistory {
    entries: Vec<PrintRequestStatusEntry>,
}

impl StatusHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a history from persisted entries in sort-key order
    pub fn from_entries(entries: Vec<PrintRequestStatusEntry>) -> Self {
        Self { entries }
    }

    pub fn append(&mut self, entry: PrintRequestStatusEntry) -> &PrintRequestStatusEntry {
        self.entries.push(entry);
        &self.entries[self.entries.len() - 1]
    }

    /// Latest entry by event time, later insertion winning ties
    pub fn current(&self) -> Option<&PrintRequestStatusEntry> {
        self.entries
            .iter()
            .enumerate()
            .max_by_key(|(index, entry)| (entry.event_date_time, *index))
            .map(|(_, entry)| entry)
    }

    pub fn current_status(&self) -> Option<PrintRequestStatus> {
        self.current().map(|entry| entry.status)
    }

    pub fn entries(&self) -> &[PrintRequestStatusEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
