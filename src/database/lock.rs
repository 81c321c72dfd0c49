//! # Distributed Lock
//!
//! Guards the scheduled batch assembly so only one process assembles at a time.
//!
//! The PostgreSQL implementation uses a session-level advisory lock:
//!
//! ```sql
//! SELECT pg_try_advisory_lock(hashtext('print_request_batching'))
//! ```
//!
//! Advisory locks belong to the session that took them, so the lease keeps its
//! own pooled connection until it is released. A lease dropped without release
//! returns the connection to the pool with the lock still held; `release`
//! should always be awaited.

use async_trait::async_trait;
use parking_lot::Mutex;
use sqlx::pool::PoolConnection;
use sqlx::{PgPool, Postgres};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{PrintFulfillmentError, Result};

/// A held lock; release it when the guarded work is finished
#[async_trait]
pub trait LockLease: Send {
    fn lock_name(&self) -> &str;

    async fn release(self: Box<Self>) -> Result<()>;
}

#[async_trait]
pub trait DistributedLock: Send + Sync {
    /// Try to take `lock_name` without waiting; `None` when another holder has it
    async fn try_acquire(&self, lock_name: &str) -> Result<Option<Box<dyn LockLease>>>;
}

/// Advisory-lock implementation
#[derive(Debug, Clone)]
pub struct PgAdvisoryLock {
    pool: PgPool,
}

impl PgAdvisoryLock {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

struct PgAdvisoryLease {
    lock_name: String,
    connection: PoolConnection<Postgres>,
}

#[async_trait]
impl LockLease for PgAdvisoryLease {
    fn lock_name(&self) -> &str {
        &self.lock_name
    }

    async fn release(mut self: Box<Self>) -> Result<()> {
        let released = sqlx::query_scalar::<_, bool>("SELECT pg_advisory_unlock(hashtext($1))")
            .bind(&self.lock_name)
            .fetch_one(&mut *self.connection)
            .await?;

        if !released {
            warn!(lock_name = %self.lock_name, "Advisory lock was not held at release");
        }
        debug!(lock_name = %self.lock_name, "Released advisory lock");
        Ok(())
    }
}

#[async_trait]
impl DistributedLock for PgAdvisoryLock {
    async fn try_acquire(&self, lock_name: &str) -> Result<Option<Box<dyn LockLease>>> {
        let mut connection = self.pool.acquire().await?;

        let acquired = sqlx::query_scalar::<_, bool>("SELECT pg_try_advisory_lock(hashtext($1))")
            .bind(lock_name)
            .fetch_one(&mut *connection)
            .await
            .map_err(|e| PrintFulfillmentError::LockError(format!("{lock_name}: {e}")))?;

        if !acquired {
            debug!(lock_name = %lock_name, "Advisory lock held elsewhere");
            return Ok(None);
        }

        Ok(Some(Box::new(PgAdvisoryLease {
            lock_name: lock_name.to_string(),
            connection,
        })))
    }
}

/// Process-local lock for tests and single-instance runs
#[derive(Debug, Clone, Default)]
pub struct InMemoryDistributedLock {
    held: Arc<Mutex<HashSet<String>>>,
}

impl InMemoryDistributedLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_held(&self, lock_name: &str) -> bool {
        self.held.lock().contains(lock_name)
    }
}

struct InMemoryLease {
    lock_name: String,
    held: Arc<Mutex<HashSet<String>>>,
}

#[async_trait]
impl LockLease for InMemoryLease {
    fn lock_name(&self) -> &str {
        &self.lock_name
    }

    async fn release(self: Box<Self>) -> Result<()> {
        self.held.lock().remove(&self.lock_name);
        Ok(())
    }
}

#[async_trait]
impl DistributedLock for InMemoryDistributedLock {
    async fn try_acquire(&self, lock_name: &str) -> Result<Option<Box<dyn LockLease>>> {
        if !self.held.lock().insert(lock_name.to_string()) {
            return Ok(None);
        }
        Ok(Some(Box::new(InMemoryLease {
            lock_name: lock_name.to_string(),
            held: self.held.clone(),
        })))
    }
}
