//! # Email Sender
//!
//! Notification emails leave the pipeline through an [`EmailSender`]. The
//! production sender writes the rendered message to an outbox queue that the
//! mail transport drains; delivery itself happens outside this crate.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::messaging::{enqueue, MessageClient, OutboundEmailMessage};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EmailNotSentError {
    #[error("Email has no recipients")]
    NoRecipients,
    #[error("Email to {recipients:?} not sent: {reason}")]
    SendFailed {
        recipients: Vec<String>,
        reason: String,
    },
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Send an HTML email, returning every recipient it was addressed to
    async fn send(
        &self,
        to: &[String],
        cc: &[String],
        subject: &str,
        html_body: &str,
    ) -> Result<Vec<String>, EmailNotSentError>;
}

fn recipients(to: &[String], cc: &[String]) -> Vec<String> {
    to.iter().chain(cc).cloned().collect()
}

/// Writes emails to the outbox queue
pub struct QueuedEmailSender {
    client: Arc<dyn MessageClient>,
    queue_name: String,
    from: String,
}

impl QueuedEmailSender {
    pub fn new(
        client: Arc<dyn MessageClient>,
        queue_name: impl Into<String>,
        from: impl Into<String>,
    ) -> Self {
        Self {
            client,
            queue_name: queue_name.into(),
            from: from.into(),
        }
    }
}

#[async_trait]
impl EmailSender for QueuedEmailSender {
    async fn send(
        &self,
        to: &[String],
        cc: &[String],
        subject: &str,
        html_body: &str,
    ) -> Result<Vec<String>, EmailNotSentError> {
        if to.is_empty() {
            return Err(EmailNotSentError::NoRecipients);
        }

        let message = OutboundEmailMessage {
            from: self.from.clone(),
            to: to.to_vec(),
            cc: cc.to_vec(),
            subject: subject.to_string(),
            html_body: html_body.to_string(),
            requested_at: Utc::now(),
        };

        let msg_id = enqueue(self.client.as_ref(), &self.queue_name, &message)
            .await
            .map_err(|e| EmailNotSentError::SendFailed {
                recipients: recipients(to, cc),
                reason: e.to_string(),
            })?;

        debug!(queue = %self.queue_name, msg_id, subject = %subject, "Email queued");
        Ok(recipients(to, cc))
    }
}

/// A captured email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentEmail {
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub subject: String,
    pub html_body: String,
}

/// Records every send attempt; can be switched to fail
#[derive(Debug, Default)]
pub struct InMemoryEmailSender {
    attempts: Mutex<Vec<SentEmail>>,
    failure: Mutex<Option<String>>,
}

impl InMemoryEmailSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every later send fails with `reason`
    pub fn fail_with(&self, reason: impl Into<String>) {
        *self.failure.lock() = Some(reason.into());
    }

    /// Every attempt, successful or not
    pub fn attempts(&self) -> Vec<SentEmail> {
        self.attempts.lock().clone()
    }
}

#[async_trait]
impl EmailSender for InMemoryEmailSender {
    async fn send(
        &self,
        to: &[String],
        cc: &[String],
        subject: &str,
        html_body: &str,
    ) -> Result<Vec<String>, EmailNotSentError> {
        self.attempts.lock().push(SentEmail {
            to: to.to_vec(),
            cc: cc.to_vec(),
            subject: subject.to_string(),
            html_body: html_body.to_string(),
        });

        if let Some(reason) = self.failure.lock().clone() {
            return Err(EmailNotSentError::SendFailed {
                recipients: recipients(to, cc),
                reason,
            });
        }
        if to.is_empty() {
            return Err(EmailNotSentError::NoRecipients);
        }
        Ok(recipients(to, cc))
    }
}
