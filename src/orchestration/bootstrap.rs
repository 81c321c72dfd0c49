//! # Bootstrap
//!
//! Builds the whole pipeline from configuration by constructor injection and
//! runs it under one shutdown token.

use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::consumer::{ConsumerSettings, QueueConsumer};
use super::handlers::{PrintRequestBatchHandler, PrintResponseFileHandler, PrintResponseHandler};
use super::scheduler::BatchScheduler;
use crate::clients::{
    EmailSender, EroDirectory, LocalObjectStorage, ObjectStorage, QueuedEmailSender,
    StaticEroDirectory,
};
use crate::config::PrintFulfillmentConfig;
use crate::database::{
    DatabaseConnection, DistributedLock, PgAdvisoryLock, PgPrintableDocumentRepository,
    PrintableDocumentRepository,
};
use crate::error::{PrintFulfillmentError, Result};
use crate::messaging::{MessageClient, PgmqClient};
use crate::retention::{
    BankHolidayCalendar, CachedBankHolidayCalendar, RetentionDateResolver,
    StaticBankHolidayCalendar,
};
use crate::services::{
    BatchAssemblyService, NotificationService, PrintFileFactory, PrintRequestBatchJob,
    PrintRequestBatchService, PrintResponseFileService, PrintResponseProcessingService,
    StatisticsPublisher,
};
use crate::sftp::{RemoteFileSystem, SftpService, Ssh2RemoteFileSystem};

/// External adapters the pipeline is built from
#[derive(Clone)]
pub struct Collaborators {
    pub repository: Arc<dyn PrintableDocumentRepository>,
    pub message_client: Arc<dyn MessageClient>,
    pub lock: Arc<dyn DistributedLock>,
    pub remote_files: Arc<dyn RemoteFileSystem>,
    pub object_storage: Arc<dyn ObjectStorage>,
    pub ero_directory: Arc<dyn EroDirectory>,
    pub email_sender: Arc<dyn EmailSender>,
    pub holiday_calendar: Arc<dyn BankHolidayCalendar>,
}

impl Collaborators {
    /// Production adapters: Postgres, pgmq, SFTP over ssh2 and local object storage
    pub async fn connect(config: &PrintFulfillmentConfig) -> Result<(Self, DatabaseConnection)> {
        let database = DatabaseConnection::connect(&config.database).await?;
        database.run_migrations().await?;
        let pool = database.pool().clone();

        let message_client: Arc<dyn MessageClient> =
            Arc::new(PgmqClient::new_with_pool(pool.clone()).await);

        let email_sender = QueuedEmailSender::new(
            message_client.clone(),
            config.queues.email_outbox_queue.clone(),
            config.notifications.sender.clone(),
        );

        let holiday_calendar = CachedBankHolidayCalendar::new(
            Arc::new(StaticBankHolidayCalendar::new(
                config.retention.bank_holidays.iter().copied(),
            )),
            config.retention.holiday_cache_ttl(),
        );

        let collaborators = Self {
            repository: Arc::new(PgPrintableDocumentRepository::new(pool.clone())),
            message_client,
            lock: Arc::new(PgAdvisoryLock::new(pool)),
            remote_files: Arc::new(Ssh2RemoteFileSystem::new(config.sftp.clone())),
            object_storage: Arc::new(LocalObjectStorage::new(
                config.object_storage.root_directory.clone(),
            )),
            ero_directory: Arc::new(StaticEroDirectory::from_config(
                &config.notifications.ero_directory,
            )),
            email_sender: Arc::new(email_sender),
            holiday_calendar: Arc::new(holiday_calendar),
        };
        Ok((collaborators, database))
    }
}

/// The assembled pipeline, ready to start
pub struct PrintFulfillmentSystem {
    queue_names: Vec<String>,
    message_client: Arc<dyn MessageClient>,
    scheduler: BatchScheduler,
    batch_consumer: QueueConsumer<PrintRequestBatchHandler>,
    response_file_consumer: QueueConsumer<PrintResponseFileHandler>,
    response_consumer: QueueConsumer<PrintResponseHandler>,
}

impl PrintFulfillmentSystem {
    pub fn build(config: &PrintFulfillmentConfig, collaborators: Collaborators) -> Self {
        let Collaborators {
            repository,
            message_client,
            lock,
            remote_files,
            object_storage,
            ero_directory,
            email_sender,
            holiday_calendar,
        } = collaborators;
        let queues = &config.queues;

        let sftp = Arc::new(SftpService::new(
            remote_files,
            config.sftp.upload_directory.clone(),
        ));

        let job = PrintRequestBatchJob::new(
            BatchAssemblyService::new(repository.clone()),
            message_client.clone(),
            queues.print_request_batch_queue.clone(),
            config.batching.batch_size,
            config.batching.max_batches_per_run,
        );
        let scheduler = BatchScheduler::new(
            Arc::new(job),
            lock,
            config.batching.lock_name.clone(),
            config.batching.schedule_interval(),
        );

        let batch_service = PrintRequestBatchService::new(
            repository.clone(),
            PrintFileFactory::new(object_storage),
            sftp.clone(),
        );

        let notifications = NotificationService::new(
            ero_directory,
            email_sender,
            config.notifications.clone(),
        );
        let statistics = StatisticsPublisher::new(
            message_client.clone(),
            queues.voter_card_statistics_queue.clone(),
            queues.applications_statistics_queue.clone(),
        );
        let retention = RetentionDateResolver::new(
            holiday_calendar,
            config.retention.initial_working_days,
        );
        let processing = Arc::new(
            PrintResponseProcessingService::new(
                repository,
                Arc::new(notifications),
                Arc::new(statistics),
                config.print_provider.reset_on_request_failure,
            )
            .with_retention(Arc::new(retention)),
        );
        let file_service = PrintResponseFileService::new(
            sftp,
            processing.clone(),
            message_client.clone(),
            queues.print_response_queue.clone(),
        );

        let workers = &config.workers;
        let batch_consumer = QueueConsumer::new(
            message_client.clone(),
            Arc::new(PrintRequestBatchHandler::new(Arc::new(batch_service))),
            ConsumerSettings::from_queues(
                queues,
                &queues.print_request_batch_queue,
                workers.print_request_batch_concurrency,
            ),
        );
        let response_file_consumer = QueueConsumer::new(
            message_client.clone(),
            Arc::new(PrintResponseFileHandler::new(Arc::new(file_service))),
            ConsumerSettings::from_queues(
                queues,
                &queues.print_response_file_queue,
                workers.print_response_file_concurrency,
            ),
        );
        let response_consumer = QueueConsumer::new(
            message_client.clone(),
            Arc::new(PrintResponseHandler::new(processing)),
            ConsumerSettings::from_queues(
                queues,
                &queues.print_response_queue,
                workers.print_response_concurrency,
            ),
        );

        Self {
            queue_names: queues
                .all_queue_names()
                .into_iter()
                .map(String::from)
                .collect(),
            message_client,
            scheduler,
            batch_consumer,
            response_file_consumer,
            response_consumer,
        }
    }

    /// Create every queue the pipeline reads or writes
    pub async fn create_queues(&self) -> Result<()> {
        for queue_name in &self.queue_names {
            self.message_client.create_queue(queue_name).await?;
        }
        Ok(())
    }

    pub fn scheduler(&self) -> &BatchScheduler {
        &self.scheduler
    }

    pub fn batch_consumer(&self) -> &QueueConsumer<PrintRequestBatchHandler> {
        &self.batch_consumer
    }

    pub fn response_file_consumer(&self) -> &QueueConsumer<PrintResponseFileHandler> {
        &self.response_file_consumer
    }

    pub fn response_consumer(&self) -> &QueueConsumer<PrintResponseHandler> {
        &self.response_consumer
    }

    /// Spawn the scheduler and the three consumers
    pub fn start(self) -> SystemHandle {
        let shutdown = CancellationToken::new();
        let mut tasks = JoinSet::new();

        let token = shutdown.clone();
        let scheduler = self.scheduler;
        tasks.spawn(async move { ("batch_scheduler", scheduler.run(token).await) });

        let token = shutdown.clone();
        let consumer = self.batch_consumer;
        tasks.spawn(async move { ("print_request_batch_consumer", consumer.run(token).await) });

        let token = shutdown.clone();
        let consumer = self.response_file_consumer;
        tasks.spawn(async move { ("print_response_file_consumer", consumer.run(token).await) });

        let token = shutdown.clone();
        let consumer = self.response_consumer;
        tasks.spawn(async move { ("print_response_consumer", consumer.run(token).await) });

        info!(component_count = tasks.len(), "✅ Print fulfillment system started");
        SystemHandle { shutdown, tasks }
    }
}

/// Running system; stop it to drain in-flight work
pub struct SystemHandle {
    shutdown: CancellationToken,
    tasks: JoinSet<(&'static str, Result<()>)>,
}

impl SystemHandle {
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Cancel every component and wait for them; reports the first failure
    pub async fn stop(mut self) -> Result<()> {
        info!("🛑 Print fulfillment system shutdown requested");
        self.shutdown.cancel();

        let mut first_error = None;
        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Ok((_, Ok(()))) => {}
                Ok((component, Err(e))) => {
                    error!(component = component, error = %e, "Component stopped with error");
                    first_error.get_or_insert(e);
                }
                Err(join_error) => {
                    error!(error = %join_error, "Component task panicked");
                    first_error.get_or_insert(PrintFulfillmentError::WorkerError(format!(
                        "component task panicked: {join_error}"
                    )));
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
