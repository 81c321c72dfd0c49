//! Queue handlers binding each inbound message type to its service.

use async_trait::async_trait;
use std::sync::Arc;

use super::consumer::MessageHandler;
use crate::error::Result;
use crate::messaging::{
    ProcessPrintRequestBatchMessage, ProcessPrintResponseFileMessage, ProcessPrintResponseMessage,
};
use crate::services::{
    PrintRequestBatchService, PrintResponseFileService, PrintResponseProcessingService,
};

pub struct PrintRequestBatchHandler {
    service: Arc<PrintRequestBatchService>,
}

impl PrintRequestBatchHandler {
    pub fn new(service: Arc<PrintRequestBatchService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl MessageHandler for PrintRequestBatchHandler {
    type Message = ProcessPrintRequestBatchMessage;

    fn name(&self) -> &'static str {
        "print_request_batch"
    }

    async fn handle(&self, message: Self::Message) -> Result<()> {
        self.service.send_batch(&message.batch_id).await.map(|_| ())
    }
}

pub struct PrintResponseFileHandler {
    service: Arc<PrintResponseFileService>,
}

impl PrintResponseFileHandler {
    pub fn new(service: Arc<PrintResponseFileService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl MessageHandler for PrintResponseFileHandler {
    type Message = ProcessPrintResponseFileMessage;

    fn name(&self) -> &'static str {
        "print_response_file"
    }

    async fn handle(&self, message: Self::Message) -> Result<()> {
        self.service.process_file(&message).await
    }
}

pub struct PrintResponseHandler {
    service: Arc<PrintResponseProcessingService>,
}

impl PrintResponseHandler {
    pub fn new(service: Arc<PrintResponseProcessingService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl MessageHandler for PrintResponseHandler {
    type Message = ProcessPrintResponseMessage;

    fn name(&self) -> &'static str {
        "print_response"
    }

    async fn handle(&self, message: Self::Message) -> Result<()> {
        self.service.process_print_response(&message).await
    }
}
