//! In-memory remote file system used in tests and local runs.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use super::{RemoteFileError, RemoteFileSystem};

type RemoteResult<T> = Result<T, RemoteFileError>;

#[derive(Debug, Default)]
pub struct InMemoryRemoteFileSystem {
    files: Mutex<BTreeMap<String, Vec<u8>>>,
    unavailable: AtomicBool,
}

impl InMemoryRemoteFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, path: &str, contents: impl Into<Vec<u8>>) {
        self.files.lock().insert(path.to_string(), contents.into());
    }

    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.files.lock().get(path).cloned()
    }

    pub fn paths(&self) -> Vec<String> {
        self.files.lock().keys().cloned().collect()
    }

    /// Simulate a lost connection; every operation fails while set
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> RemoteResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RemoteFileError::Connection {
                host: "in-memory".to_string(),
                reason: "connection refused".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteFileSystem for InMemoryRemoteFileSystem {
    async fn write_file(&self, path: &str, bytes: Vec<u8>) -> RemoteResult<()> {
        self.check_available()?;
        self.files.lock().insert(path.to_string(), bytes);
        Ok(())
    }

    async fn rename(&self, from: &str, to: &str) -> RemoteResult<()> {
        self.check_available()?;
        let mut files = self.files.lock();
        if files.contains_key(to) {
            return Err(RemoteFileError::AlreadyExists {
                path: to.to_string(),
            });
        }
        let bytes = files.remove(from).ok_or_else(|| RemoteFileError::NotFound {
            path: from.to_string(),
        })?;
        files.insert(to.to_string(), bytes);
        Ok(())
    }

    async fn exists(&self, path: &str) -> RemoteResult<bool> {
        self.check_available()?;
        Ok(self.files.lock().contains_key(path))
    }

    async fn read_to_string(&self, path: &str) -> RemoteResult<String> {
        self.check_available()?;
        let bytes = self.file(path).ok_or_else(|| RemoteFileError::NotFound {
            path: path.to_string(),
        })?;
        String::from_utf8(bytes).map_err(|e| RemoteFileError::io("read", path, e))
    }

    async fn remove(&self, path: &str) -> RemoteResult<()> {
        self.check_available()?;
        self.files
            .lock()
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| RemoteFileError::NotFound {
                path: path.to_string(),
            })
    }
}
