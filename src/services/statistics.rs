//! Statistics update events for the downstream reporting subsystem.

use std::sync::Arc;
use tracing::debug;

use crate::error::Result;
use crate::messaging::{enqueue, MessageClient, StatisticsUpdateMessage};

pub struct StatisticsPublisher {
    client: Arc<dyn MessageClient>,
    voter_card_queue: String,
    applications_queue: String,
}

impl StatisticsPublisher {
    pub fn new(
        client: Arc<dyn MessageClient>,
        voter_card_queue: impl Into<String>,
        applications_queue: impl Into<String>,
    ) -> Self {
        Self {
            client,
            voter_card_queue: voter_card_queue.into(),
            applications_queue: applications_queue.into(),
        }
    }

    /// Queue the event is routed to for a given origin
    pub fn queue_for(&self, is_from_applications_api: bool) -> &str {
        if is_from_applications_api {
            &self.applications_queue
        } else {
            &self.voter_card_queue
        }
    }

    pub async fn publish(&self, source_reference: &str, is_from_applications_api: bool) -> Result<()> {
        let queue_name = self.queue_for(is_from_applications_api);
        let message = StatisticsUpdateMessage {
            source_reference: source_reference.to_string(),
        };
        enqueue(self.client.as_ref(), queue_name, &message).await?;
        debug!(queue = %queue_name, source_reference = %source_reference, "Statistics update queued");
        Ok(())
    }
}
