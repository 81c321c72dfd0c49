//! ERO directory lookup by local authority GSS code.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::config::EroDirectoryEntry;
use crate::error::{PrintFulfillmentError, Result};
use crate::models::EroContactDetails;

#[async_trait]
pub trait EroDirectory: Send + Sync {
    async fn get_ero(&self, gss_code: &str) -> Result<EroContactDetails>;
}

/// Directory held in memory, typically built from configuration
#[derive(Debug, Clone, Default)]
pub struct StaticEroDirectory {
    by_gss_code: HashMap<String, EroContactDetails>,
}

impl StaticEroDirectory {
    pub fn new(records: impl IntoIterator<Item = EroContactDetails>) -> Self {
        Self {
            by_gss_code: records
                .into_iter()
                .map(|record| (record.gss_code.clone(), record))
                .collect(),
        }
    }

    /// One record per GSS code an ERO is responsible for
    pub fn from_config(entries: &[EroDirectoryEntry]) -> Self {
        Self::new(entries.iter().flat_map(|entry| {
            entry.gss_codes.iter().map(|gss_code| EroContactDetails {
                ero_id: entry.ero_id.clone(),
                gss_code: gss_code.clone(),
                name: entry.name.clone(),
                email_addresses: entry.email_addresses.clone(),
            })
        }))
    }
}

#[async_trait]
impl EroDirectory for StaticEroDirectory {
    async fn get_ero(&self, gss_code: &str) -> Result<EroContactDetails> {
        self.by_gss_code
            .get(gss_code)
            .cloned()
            .ok_or_else(|| PrintFulfillmentError::NotFound(format!("ERO for gssCode {gss_code}")))
    }
}
