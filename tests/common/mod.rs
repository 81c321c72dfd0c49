#![allow(dead_code)]

pub mod builders;
pub mod strategies;

pub use builders::*;

use std::sync::Arc;

use print_fulfillment::clients::{InMemoryEmailSender, InMemoryObjectStorage, StaticEroDirectory};
use print_fulfillment::config::{EroDirectoryEntry, PrintFulfillmentConfig};
use print_fulfillment::database::{InMemoryDistributedLock, PrintableDocumentRepository};
use print_fulfillment::messaging::{InMemoryMessageClient, MessageClient};
use print_fulfillment::retention::StaticBankHolidayCalendar;
use print_fulfillment::sftp::InMemoryRemoteFileSystem;
use print_fulfillment::{
    Collaborators, InMemoryPrintableDocumentRepository, PrintFulfillmentSystem, PrintableDocument,
};

pub const ERO_EMAIL: &str = "elections@camrose.gov.uk";
pub const UPLOAD_DIRECTORY: &str = "/inbound";
pub const RESPONSE_DIRECTORY: &str = "/outbound";

/// Whole pipeline on in-memory adapters
pub struct TestPipeline {
    pub config: PrintFulfillmentConfig,
    pub repository: Arc<InMemoryPrintableDocumentRepository>,
    pub client: Arc<InMemoryMessageClient>,
    pub remote: Arc<InMemoryRemoteFileSystem>,
    pub storage: Arc<InMemoryObjectStorage>,
    pub email: Arc<InMemoryEmailSender>,
    pub lock: Arc<InMemoryDistributedLock>,
}

impl TestPipeline {
    pub fn new() -> Self {
        let mut config = PrintFulfillmentConfig::default();
        config.sftp.upload_directory = UPLOAD_DIRECTORY.to_string();
        config.queues.max_receive_count = 2;
        config.notifications.ero_directory = vec![EroDirectoryEntry {
            ero_id: "camrose-city-council".to_string(),
            name: "Camrose City Council".to_string(),
            gss_codes: vec![GSS_CODE.to_string()],
            email_addresses: vec![ERO_EMAIL.to_string()],
        }];

        Self {
            config,
            repository: Arc::new(InMemoryPrintableDocumentRepository::new()),
            client: Arc::new(InMemoryMessageClient::new()),
            remote: Arc::new(InMemoryRemoteFileSystem::new()),
            storage: Arc::new(InMemoryObjectStorage::new()),
            email: Arc::new(InMemoryEmailSender::new()),
            lock: Arc::new(InMemoryDistributedLock::new()),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            repository: self.repository.clone(),
            message_client: self.client.clone(),
            lock: self.lock.clone(),
            remote_files: self.remote.clone(),
            object_storage: self.storage.clone(),
            ero_directory: Arc::new(StaticEroDirectory::from_config(
                &self.config.notifications.ero_directory,
            )),
            email_sender: self.email.clone(),
            holiday_calendar: Arc::new(StaticBankHolidayCalendar::new(
                self.config.retention.bank_holidays.iter().copied(),
            )),
        }
    }

    pub async fn system(&self) -> PrintFulfillmentSystem {
        let system = PrintFulfillmentSystem::build(&self.config, self.collaborators());
        system.create_queues().await.expect("queues created");
        system
    }

    /// Store the document and a photo for each of its requests
    pub async fn insert(&self, document: &PrintableDocument) {
        for request in &document.print_requests {
            let location: print_fulfillment::clients::ObjectLocation = request
                .photo_location_arn
                .parse()
                .expect("fixture photo location");
            self.storage
                .put(&location.bucket, &location.key, PHOTO_BYTES.to_vec());
        }
        self.repository.insert(document).await.expect("insert");
    }

    pub async fn reload(&self, document: &PrintableDocument) -> PrintableDocument {
        self.repository
            .find_by_id(document.id)
            .await
            .expect("load")
            .expect("document present")
    }

    pub fn queue(&self, queue_name: &str) -> Vec<serde_json::Value> {
        self.client.pending(queue_name)
    }

    pub async fn send(&self, queue_name: &str, payload: serde_json::Value) {
        self.client
            .send_json(queue_name, payload)
            .await
            .expect("message sent");
    }
}
