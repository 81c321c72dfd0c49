//! # Notification Triggers
//!
//! Emails the ERO, copying the original requester, when a document fails to
//! print or is returned undelivered. Failures are logged and reported as
//! `false`; they never reach the status pipeline.

use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::clients::{EmailSender, EroDirectory};
use crate::config::NotificationConfig;
use crate::logging::log_error;
use crate::models::{PrintRequest, PrintableDocument};
use crate::state_machine::PrintRequestStatus;

/// What the ERO is being told about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    NotDelivered,
    FailedToPrint,
}

impl NotificationKind {
    pub fn for_status(status: PrintRequestStatus) -> Option<Self> {
        match status {
            PrintRequestStatus::NotDelivered => Some(Self::NotDelivered),
            status if status.is_print_provider_failure() => Some(Self::FailedToPrint),
            _ => None,
        }
    }
}

/// Request details captured at the time of the bureau response, before any reset
#[derive(Debug, Clone)]
pub struct FailedRequest {
    pub request_id: String,
    pub status: PrintRequestStatus,
    pub message: Option<String>,
    pub requester_email: Option<String>,
}

impl FailedRequest {
    pub fn new(request: &PrintRequest, status: PrintRequestStatus, message: Option<String>) -> Self {
        Self {
            request_id: request.request_id.clone(),
            status,
            message,
            requester_email: request.requester_email.clone(),
        }
    }
}

pub struct NotificationService {
    ero_directory: Arc<dyn EroDirectory>,
    email_sender: Arc<dyn EmailSender>,
    config: NotificationConfig,
}

impl NotificationService {
    pub fn new(
        ero_directory: Arc<dyn EroDirectory>,
        email_sender: Arc<dyn EmailSender>,
        config: NotificationConfig,
    ) -> Self {
        Self {
            ero_directory,
            email_sender,
            config,
        }
    }

    /// Returns whether an email was handed to the sender
    #[instrument(skip_all, fields(source_reference = %document.source_reference, request_id = %failed.request_id))]
    pub async fn notify(&self, document: &PrintableDocument, failed: &FailedRequest) -> bool {
        let Some(kind) = NotificationKind::for_status(failed.status) else {
            debug!(status = %failed.status, "Status does not trigger a notification");
            return false;
        };
        if !self.config.enabled {
            debug!("Notifications disabled");
            return false;
        }

        let context = format!(
            "sourceReference={} applicationReference={} requestId={}",
            document.source_reference, document.application_reference, failed.request_id
        );

        let ero = match self.ero_directory.get_ero(&document.gss_code).await {
            Ok(ero) => ero,
            Err(e) => {
                log_error("notification", "get_ero", &e.to_string(), Some(&context));
                return false;
            }
        };

        let cc: Vec<String> = failed.requester_email.iter().cloned().collect();
        let subject = match kind {
            NotificationKind::NotDelivered => &self.config.not_delivered_subject,
            NotificationKind::FailedToPrint => &self.config.failed_to_print_subject,
        };
        let body = render_body(kind, document, failed);

        match self
            .email_sender
            .send(&ero.email_addresses, &cc, subject, &body)
            .await
        {
            Ok(recipients) => {
                info!(recipients = ?recipients, kind = ?kind, "Notification sent");
                true
            }
            Err(e) => {
                log_error("notification", "send", &e.to_string(), Some(&context));
                false
            }
        }
    }
}

fn render_body(kind: NotificationKind, document: &PrintableDocument, failed: &FailedRequest) -> String {
    let headline = match kind {
        NotificationKind::NotDelivered => "could not be delivered and has been returned",
        NotificationKind::FailedToPrint => "could not be printed",
    };
    let reason = failed
        .message
        .as_deref()
        .map(|message| format!("<p>Reason given by the print provider: {}</p>", escape_html(message)))
        .unwrap_or_default();

    format!(
        "<html><body>\
         <p>The {} with application reference {} {}.</p>\
         <p>Source reference: {}<br/>Print request: {}<br/>Status: {}</p>\
         {}\
         </body></html>",
        escape_html(document.kind.as_str()),
        escape_html(&document.application_reference),
        headline,
        escape_html(&document.source_reference),
        escape_html(&failed.request_id),
        failed.status,
        reason
    )
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}
