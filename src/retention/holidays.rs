//! Bank holiday calendars.
//!
//! The upstream holiday source is an external collaborator. This module only
//! defines the port, a fixed calendar built from configuration, and a TTL cache
//! that refreshes lazily on read.

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::error::Result;

#[async_trait]
pub trait BankHolidayCalendar: Send + Sync {
    async fn bank_holidays(&self) -> Result<HashSet<NaiveDate>>;
}

/// Fixed set of holidays, typically read from configuration
#[derive(Debug, Clone, Default)]
pub struct StaticBankHolidayCalendar {
    dates: HashSet<NaiveDate>,
}

impl StaticBankHolidayCalendar {
    pub fn new(dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            dates: dates.into_iter().collect(),
        }
    }
}

#[async_trait]
impl BankHolidayCalendar for StaticBankHolidayCalendar {
    async fn bank_holidays(&self) -> Result<HashSet<NaiveDate>> {
        Ok(self.dates.clone())
    }
}

struct CachedHolidays {
    fetched_at: Instant,
    dates: HashSet<NaiveDate>,
}

/// TTL cache over another calendar.
///
/// A failed refresh falls back to the stale set when one exists.
pub struct CachedBankHolidayCalendar {
    inner: Arc<dyn BankHolidayCalendar>,
    ttl: Duration,
    cache: RwLock<Option<CachedHolidays>>,
}

impl CachedBankHolidayCalendar {
    pub fn new(inner: Arc<dyn BankHolidayCalendar>, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            cache: RwLock::new(None),
        }
    }

    fn fresh_entry(&self) -> Option<HashSet<NaiveDate>> {
        let guard = self.cache.read();
        guard
            .as_ref()
            .filter(|cached| cached.fetched_at.elapsed() < self.ttl)
            .map(|cached| cached.dates.clone())
    }
}

#[async_trait]
impl BankHolidayCalendar for CachedBankHolidayCalendar {
    async fn bank_holidays(&self) -> Result<HashSet<NaiveDate>> {
        if let Some(dates) = self.fresh_entry() {
            return Ok(dates);
        }

        match self.inner.bank_holidays().await {
            Ok(dates) => {
                debug!(count = dates.len(), "Refreshed bank holiday cache");
                *self.cache.write() = Some(CachedHolidays {
                    fetched_at: Instant::now(),
                    dates: dates.clone(),
                });
                Ok(dates)
            }
            Err(e) => {
                let stale = self.cache.read().as_ref().map(|cached| cached.dates.clone());
                match stale {
                    Some(dates) => {
                        warn!(error = %e, "Bank holiday refresh failed, serving stale calendar");
                        Ok(dates)
                    }
                    None => Err(e),
                }
            }
        }
    }
}
