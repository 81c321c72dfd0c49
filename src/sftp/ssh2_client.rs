//! # SSH2 Remote File System
//!
//! libssh2 sessions are blocking, so every operation opens a session on the
//! blocking pool, performs its SFTP calls, and drops the session.

use async_trait::async_trait;
use ssh2::{ErrorCode, OpenFlags, OpenType, RenameFlags, Session, Sftp};
use std::io::{Read, Write};
use std::net::TcpStream;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use super::{RemoteFileError, RemoteFileSystem};
use crate::config::SftpConfig;

type RemoteResult<T> = Result<T, RemoteFileError>;

/// libssh2 `LIBSSH2_FX_NO_SUCH_FILE`
const SFTP_NO_SUCH_FILE: i32 = 2;

#[derive(Debug, Clone)]
pub struct Ssh2RemoteFileSystem {
    config: SftpConfig,
}

impl Ssh2RemoteFileSystem {
    pub fn new(config: SftpConfig) -> Self {
        Self { config }
    }

    async fn with_sftp<T, F>(&self, operation: F) -> RemoteResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Sftp) -> RemoteResult<T> + Send + 'static,
    {
        let config = self.config.clone();
        let host = config.host.clone();
        tokio::task::spawn_blocking(move || {
            let (_session, sftp) = connect(&config)?;
            operation(&sftp)
        })
        .await
        .map_err(|e| RemoteFileError::Connection {
            host,
            reason: format!("SFTP task failed: {e}"),
        })?
    }
}

fn connect(config: &SftpConfig) -> RemoteResult<(Session, Sftp)> {
    let connection_error = |reason: String| RemoteFileError::Connection {
        host: config.host.clone(),
        reason,
    };

    let tcp = TcpStream::connect((config.host.as_str(), config.port))
        .map_err(|e| connection_error(e.to_string()))?;
    tcp.set_read_timeout(Some(Duration::from_millis(config.timeout_ms)))
        .map_err(|e| connection_error(e.to_string()))?;

    let mut session = Session::new().map_err(|e| connection_error(e.to_string()))?;
    session.set_tcp_stream(tcp);
    session.set_timeout(u32::try_from(config.timeout_ms).unwrap_or(u32::MAX));
    session
        .handshake()
        .map_err(|e| connection_error(e.to_string()))?;

    match (&config.private_key_path, &config.password) {
        (Some(key_path), _) => session
            .userauth_pubkey_file(&config.user, None, Path::new(key_path), None)
            .map_err(|e| connection_error(format!("public key authentication failed: {e}")))?,
        (None, Some(password)) => session
            .userauth_password(&config.user, password)
            .map_err(|e| connection_error(format!("password authentication failed: {e}")))?,
        (None, None) => {
            return Err(connection_error("no SFTP credentials configured".to_string()))
        }
    }

    let sftp = session.sftp().map_err(|e| connection_error(e.to_string()))?;
    debug!(host = %config.host, "SFTP session established");
    Ok((session, sftp))
}

fn is_no_such_file(error: &ssh2::Error) -> bool {
    matches!(error.code(), ErrorCode::SFTP(SFTP_NO_SUCH_FILE))
}

fn map_error(operation: &str, path: &str, error: ssh2::Error) -> RemoteFileError {
    if is_no_such_file(&error) {
        RemoteFileError::NotFound {
            path: path.to_string(),
        }
    } else {
        RemoteFileError::io(operation, path, error)
    }
}

#[async_trait]
impl RemoteFileSystem for Ssh2RemoteFileSystem {
    async fn write_file(&self, path: &str, bytes: Vec<u8>) -> RemoteResult<()> {
        let path = path.to_string();
        self.with_sftp(move |sftp| {
            let mut file = sftp
                .open_mode(
                    Path::new(&path),
                    OpenFlags::WRITE | OpenFlags::CREATE | OpenFlags::TRUNCATE,
                    0o644,
                    OpenType::File,
                )
                .map_err(|e| map_error("open", &path, e))?;
            file.write_all(&bytes)
                .map_err(|e| RemoteFileError::io("write", &path, e))?;
            Ok(())
        })
        .await
    }

    async fn rename(&self, from: &str, to: &str) -> RemoteResult<()> {
        let (from, to) = (from.to_string(), to.to_string());
        self.with_sftp(move |sftp| {
            sftp.rename(
                Path::new(&from),
                Path::new(&to),
                Some(RenameFlags::ATOMIC | RenameFlags::NATIVE),
            )
            .map_err(|e| map_error("rename", &from, e))
        })
        .await
    }

    async fn exists(&self, path: &str) -> RemoteResult<bool> {
        let path = path.to_string();
        self.with_sftp(move |sftp| match sftp.stat(Path::new(&path)) {
            Ok(_) => Ok(true),
            Err(e) if is_no_such_file(&e) => Ok(false),
            Err(e) => Err(RemoteFileError::io("stat", &path, e)),
        })
        .await
    }

    async fn read_to_string(&self, path: &str) -> RemoteResult<String> {
        let path = path.to_string();
        self.with_sftp(move |sftp| {
            let mut file = sftp
                .open(Path::new(&path))
                .map_err(|e| map_error("open", &path, e))?;
            let mut contents = String::new();
            file.read_to_string(&mut contents)
                .map_err(|e| RemoteFileError::io("read", &path, e))?;
            Ok(contents)
        })
        .await
    }

    async fn remove(&self, path: &str) -> RemoteResult<()> {
        let path = path.to_string();
        self.with_sftp(move |sftp| {
            sftp.unlink(Path::new(&path))
                .map_err(|e| map_error("remove", &path, e))
        })
        .await
    }
}
