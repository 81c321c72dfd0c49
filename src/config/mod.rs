//! # Print Fulfillment Configuration
//!
//! Configuration is layered: `config/print-fulfillment.toml`, then an optional
//! `config/print-fulfillment.{environment}.toml` overlay, then environment
//! variables such as `PRINT_FULFILLMENT_SFTP__HOST`.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use print_fulfillment::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let batch_size = manager.config().batching.batch_size;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

/// Root configuration structure mirroring print-fulfillment.toml
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct PrintFulfillmentConfig {
    pub database: DatabaseConfig,
    pub queues: QueuesConfig,
    pub batching: BatchingConfig,
    pub sftp: SftpConfig,
    pub object_storage: ObjectStorageConfig,
    pub retention: RetentionConfig,
    pub notifications: NotificationConfig,
    pub workers: WorkersConfig,
    pub print_provider: PrintProviderConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/print_fulfillment_development".to_string(),
            max_connections: 10,
            acquire_timeout_seconds: 10,
        }
    }
}

impl DatabaseConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_seconds)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct QueuesConfig {
    pub print_request_batch_queue: String,
    pub print_response_file_queue: String,
    pub print_response_queue: String,
    pub voter_card_statistics_queue: String,
    pub applications_statistics_queue: String,
    pub email_outbox_queue: String,
    pub visibility_timeout_seconds: i32,
    pub poll_interval_ms: u64,
    pub read_batch_size: i32,
    /// Reads after which a failing message is archived instead of retried
    pub max_receive_count: i32,
}

impl Default for QueuesConfig {
    fn default() -> Self {
        Self {
            print_request_batch_queue: crate::constants::queues::PRINT_REQUEST_BATCH.to_string(),
            print_response_file_queue: crate::constants::queues::PRINT_RESPONSE_FILE.to_string(),
            print_response_queue: crate::constants::queues::PRINT_RESPONSE.to_string(),
            voter_card_statistics_queue: crate::constants::queues::VOTER_CARD_STATISTICS
                .to_string(),
            applications_statistics_queue: crate::constants::queues::APPLICATIONS_STATISTICS
                .to_string(),
            email_outbox_queue: crate::constants::queues::EMAIL_OUTBOX.to_string(),
            visibility_timeout_seconds: 300,
            poll_interval_ms: 1000,
            read_batch_size: 10,
            max_receive_count: 5,
        }
    }
}

impl QueuesConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn all_queue_names(&self) -> Vec<&str> {
        vec![
            &self.print_request_batch_queue,
            &self.print_response_file_queue,
            &self.print_response_queue,
            &self.voter_card_statistics_queue,
            &self.applications_statistics_queue,
            &self.email_outbox_queue,
        ]
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BatchingConfig {
    pub batch_size: usize,
    pub max_batches_per_run: usize,
    pub schedule_interval_seconds: u64,
    pub lock_name: String,
}

impl Default for BatchingConfig {
    fn default() -> Self {
        Self {
            batch_size: 200,
            max_batches_per_run: 10,
            schedule_interval_seconds: 300,
            lock_name: crate::constants::BATCHING_LOCK_NAME.to_string(),
        }
    }
}

impl BatchingConfig {
    pub fn schedule_interval(&self) -> Duration {
        Duration::from_secs(self.schedule_interval_seconds)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SftpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    pub private_key_path: Option<String>,
    pub upload_directory: String,
    pub timeout_ms: u64,
}

impl Default for SftpConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 22,
            user: "print".to_string(),
            password: None,
            private_key_path: None,
            upload_directory: "/inbound".to_string(),
            timeout_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObjectStorageConfig {
    /// Local directory holding `{bucket}/{key}` photo objects
    pub root_directory: String,
}

impl Default for ObjectStorageConfig {
    fn default() -> Self {
        Self {
            root_directory: "storage".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetentionConfig {
    pub initial_working_days: u32,
    pub holiday_cache_ttl_seconds: u64,
    pub bank_holidays: Vec<NaiveDate>,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            initial_working_days: 28,
            holiday_cache_ttl_seconds: 86_400,
            bank_holidays: Vec::new(),
        }
    }
}

impl RetentionConfig {
    pub fn holiday_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.holiday_cache_ttl_seconds)
    }
}

/// One ERO and the GSS codes it covers
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EroDirectoryEntry {
    pub ero_id: String,
    pub name: String,
    pub gss_codes: Vec<String>,
    pub email_addresses: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub enabled: bool,
    pub sender: String,
    pub not_delivered_subject: String,
    pub failed_to_print_subject: String,
    pub ero_directory: Vec<EroDirectoryEntry>,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sender: "noreply@print-fulfillment.local".to_string(),
            not_delivered_subject: "Electoral document not delivered".to_string(),
            failed_to_print_subject: "Electoral document failed to print".to_string(),
            ero_directory: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkersConfig {
    pub print_request_batch_concurrency: usize,
    pub print_response_file_concurrency: usize,
    pub print_response_concurrency: usize,
}

impl Default for WorkersConfig {
    fn default() -> Self {
        Self {
            print_request_batch_concurrency: 2,
            print_response_file_concurrency: 2,
            print_response_concurrency: 8,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PrintProviderConfig {
    /// Reset request-level print failures back to pending under a new request id
    pub reset_on_request_failure: bool,
}

impl Default for PrintProviderConfig {
    fn default() -> Self {
        Self {
            reset_on_request_failure: true,
        }
    }
}

impl PrintFulfillmentConfig {
    /// Validate configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.database.url.is_empty() {
            return Err(ConfigurationError::missing_required_field(
                "database.url",
                "database configuration",
            ));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigurationError::invalid_value(
                "database.max_connections",
                "0",
                "pool size must be greater than 0",
            ));
        }

        let queue_names = [
            ("queues.print_request_batch_queue", &self.queues.print_request_batch_queue),
            ("queues.print_response_file_queue", &self.queues.print_response_file_queue),
            ("queues.print_response_queue", &self.queues.print_response_queue),
            ("queues.voter_card_statistics_queue", &self.queues.voter_card_statistics_queue),
            (
                "queues.applications_statistics_queue",
                &self.queues.applications_statistics_queue,
            ),
            ("queues.email_outbox_queue", &self.queues.email_outbox_queue),
        ];
        for (field, name) in queue_names {
            if name.trim().is_empty() {
                return Err(ConfigurationError::missing_required_field(
                    field,
                    "queue configuration",
                ));
            }
        }

        if self.queues.visibility_timeout_seconds <= 0 {
            return Err(ConfigurationError::invalid_value(
                "queues.visibility_timeout_seconds",
                self.queues.visibility_timeout_seconds.to_string(),
                "visibility timeout must be greater than 0",
            ));
        }

        if self.queues.read_batch_size <= 0 {
            return Err(ConfigurationError::invalid_value(
                "queues.read_batch_size",
                self.queues.read_batch_size.to_string(),
                "read batch size must be greater than 0",
            ));
        }

        if self.queues.max_receive_count <= 0 {
            return Err(ConfigurationError::invalid_value(
                "queues.max_receive_count",
                self.queues.max_receive_count.to_string(),
                "max receive count must be greater than 0",
            ));
        }

        if self.batching.batch_size == 0 {
            return Err(ConfigurationError::invalid_value(
                "batching.batch_size",
                "0",
                "batch size must be greater than 0",
            ));
        }

        if self.batching.max_batches_per_run == 0 {
            return Err(ConfigurationError::invalid_value(
                "batching.max_batches_per_run",
                "0",
                "at least one batch must be allowed per run",
            ));
        }

        if self.sftp.host.trim().is_empty() {
            return Err(ConfigurationError::missing_required_field(
                "sftp.host",
                "sftp configuration",
            ));
        }

        let concurrency = [
            ("workers.print_request_batch_concurrency", self.workers.print_request_batch_concurrency),
            ("workers.print_response_file_concurrency", self.workers.print_response_file_concurrency),
            ("workers.print_response_concurrency", self.workers.print_response_concurrency),
        ];
        for (field, value) in concurrency {
            if value == 0 {
                return Err(ConfigurationError::invalid_value(
                    field,
                    "0",
                    "worker concurrency must be greater than 0",
                ));
            }
        }

        Ok(())
    }
}
