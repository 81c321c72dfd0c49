//! # SFTP Transport
//!
//! Outbound bundle upload and inbound response file handling against the
//! print bureau's SFTP server.
//!
//! Uploads are written under a temporary name and renamed into place, so the
//! bureau never picks up a partially written bundle. Response file deletion is
//! best effort: by the time it runs the response has been durably processed.

pub mod in_memory;
pub mod ssh2_client;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

pub use in_memory::InMemoryRemoteFileSystem;
pub use ssh2_client::Ssh2RemoteFileSystem;

use crate::error::Result;

const IN_PROGRESS_SUFFIX: &str = ".processing";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RemoteFileError {
    #[error("Remote file not found: {path}")]
    NotFound { path: String },
    #[error("Remote file already exists: {path}")]
    AlreadyExists { path: String },
    #[error("SFTP connection to {host} failed: {reason}")]
    Connection { host: String, reason: String },
    #[error("SFTP {operation} failed for {path}: {reason}")]
    Io {
        operation: String,
        path: String,
        reason: String,
    },
}

impl RemoteFileError {
    pub fn io(operation: &str, path: &str, reason: impl ToString) -> Self {
        Self::Io {
            operation: operation.to_string(),
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Remote directory session operations
#[async_trait]
pub trait RemoteFileSystem: Send + Sync {
    async fn write_file(&self, path: &str, bytes: Vec<u8>) -> std::result::Result<(), RemoteFileError>;

    async fn rename(&self, from: &str, to: &str) -> std::result::Result<(), RemoteFileError>;

    async fn exists(&self, path: &str) -> std::result::Result<bool, RemoteFileError>;

    async fn read_to_string(&self, path: &str) -> std::result::Result<String, RemoteFileError>;

    /// Fails with [`RemoteFileError::NotFound`] when there is nothing to remove
    async fn remove(&self, path: &str) -> std::result::Result<(), RemoteFileError>;
}

pub fn remote_path(directory: &str, file_name: &str) -> String {
    let directory = directory.trim_end_matches('/');
    if directory.is_empty() {
        file_name.to_string()
    } else {
        format!("{directory}/{file_name}")
    }
}

pub struct SftpService {
    remote: Arc<dyn RemoteFileSystem>,
    upload_directory: String,
}

impl SftpService {
    pub fn new(remote: Arc<dyn RemoteFileSystem>, upload_directory: impl Into<String>) -> Self {
        Self {
            remote,
            upload_directory: upload_directory.into(),
        }
    }

    /// Upload a bundle and return the remote path it was written to
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn send_file(&self, file_name: &str, bytes: Vec<u8>) -> Result<String> {
        let final_path = remote_path(&self.upload_directory, file_name);
        if self.remote.exists(&final_path).await? {
            return Err(RemoteFileError::AlreadyExists { path: final_path }.into());
        }

        let in_progress_path = format!("{final_path}{IN_PROGRESS_SUFFIX}");
        let uploaded = match self.remote.write_file(&in_progress_path, bytes).await {
            Ok(()) => self.remote.rename(&in_progress_path, &final_path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = uploaded {
            self.discard_partial_upload(&in_progress_path).await;
            return Err(e.into());
        }

        info!(remote_path = %final_path, "Uploaded print bundle");
        Ok(final_path)
    }

    async fn discard_partial_upload(&self, path: &str) {
        match self.remote.remove(path).await {
            Ok(()) => warn!(remote_path = %path, "Removed partial upload"),
            Err(RemoteFileError::NotFound { .. }) => {}
            Err(e) => {
                error!(remote_path = %path, error = %e, "Partial upload left on remote server")
            }
        }
    }

    pub async fn fetch_file_contents(&self, directory: &str, file_name: &str) -> Result<String> {
        let path = remote_path(directory, file_name);
        Ok(self.remote.read_to_string(&path).await?)
    }

    /// Remove a processed response file. Returns `false` when nothing was
    /// removed; never fails.
    pub async fn remove_file(&self, directory: &str, file_name: &str) -> bool {
        let path = remote_path(directory, file_name);
        match self.remote.remove(&path).await {
            Ok(()) => {
                info!(remote_path = %path, "Removed remote file");
                true
            }
            Err(RemoteFileError::NotFound { .. }) => {
                warn!(remote_path = %path, "Remote file already removed");
                false
            }
            Err(e) => {
                error!(remote_path = %path, error = %e, "Failed to remove remote file");
                false
            }
        }
    }
}
