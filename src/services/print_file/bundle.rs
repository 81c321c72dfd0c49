//! # Print Bundle
//!
//! Zip archive sent to the bureau for one batch: a PSV manifest plus one
//! photo per request. Every photo is fetched before anything is written, so a
//! missing photo fails the batch without producing a partial archive.

use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use std::io::{Cursor, Write};
use std::sync::Arc;
use tracing::{debug, instrument};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::manifest::{render_manifest, ManifestRecord};
use crate::clients::{ObjectLocation, ObjectStorage};
use crate::error::{PrintFulfillmentError, Result};
use crate::models::{PrintRequest, PrintableDocument};

const FILE_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S%3f";

/// Assembled archive ready for upload
#[derive(Debug, Clone)]
pub struct PrintBundle {
    pub batch_id: String,
    pub file_name: String,
    pub manifest_file_name: String,
    pub request_count: usize,
    pub bytes: Vec<u8>,
}

/// `{batchId}-{17 digit timestamp}-{count}`
pub fn bundle_file_stem(batch_id: &str, created_at: DateTime<Utc>, request_count: usize) -> String {
    format!(
        "{batch_id}-{}-{request_count}",
        created_at.format(FILE_TIMESTAMP_FORMAT)
    )
}

pub fn photo_file_name(batch_id: &str, request_id: &str, extension: &str) -> String {
    format!("{batch_id}-{request_id}.{extension}")
}

struct BundleEntry<'a> {
    document: &'a PrintableDocument,
    request: &'a PrintRequest,
    photo_file_name: String,
    photo: Vec<u8>,
}

pub struct PrintFileFactory {
    storage: Arc<dyn ObjectStorage>,
}

impl PrintFileFactory {
    pub fn new(storage: Arc<dyn ObjectStorage>) -> Self {
        Self { storage }
    }

    /// Build the bundle for every request of `documents` assigned to `batch_id`
    #[instrument(skip(self, documents), fields(documents = documents.len()))]
    pub async fn build_bundle(
        &self,
        batch_id: &str,
        documents: &[PrintableDocument],
        created_at: DateTime<Utc>,
    ) -> Result<PrintBundle> {
        let members: Vec<(&PrintableDocument, &PrintRequest)> = documents
            .iter()
            .flat_map(|document| {
                document
                    .print_requests
                    .iter()
                    .filter(|request| request.is_assigned_to(batch_id))
                    .map(move |request| (document, request))
            })
            .collect();

        if members.is_empty() {
            return Err(PrintFulfillmentError::BundleError(format!(
                "Batch {batch_id} has no requests to print"
            )));
        }

        let entries = try_join_all(
            members
                .into_iter()
                .map(|(document, request)| self.fetch_entry(batch_id, document, request)),
        )
        .await?;

        let stem = bundle_file_stem(batch_id, created_at, entries.len());
        let manifest_file_name = format!("{stem}.psv");
        let records: Vec<ManifestRecord> = entries
            .iter()
            .map(|entry| ManifestRecord::new(entry.document, entry.request, &entry.photo_file_name))
            .collect();
        let manifest = render_manifest(&records);

        let bytes = write_zip(&manifest_file_name, manifest.as_bytes(), &entries)?;
        debug!(batch_id = %batch_id, size = bytes.len(), "Print bundle assembled");

        Ok(PrintBundle {
            batch_id: batch_id.to_string(),
            file_name: format!("{stem}.zip"),
            manifest_file_name,
            request_count: entries.len(),
            bytes,
        })
    }

    async fn fetch_entry<'a>(
        &self,
        batch_id: &str,
        document: &'a PrintableDocument,
        request: &'a PrintRequest,
    ) -> Result<BundleEntry<'a>> {
        let location: ObjectLocation = request.photo_location_arn.parse()?;
        let extension = location.extension().ok_or_else(|| {
            PrintFulfillmentError::InvalidPhotoLocation(request.photo_location_arn.clone())
        })?;
        let photo = self.storage.get(&location.bucket, &location.key).await?;

        Ok(BundleEntry {
            document,
            request,
            photo_file_name: photo_file_name(batch_id, &request.request_id, &extension),
            photo,
        })
    }
}

fn write_zip(manifest_file_name: &str, manifest: &[u8], entries: &[BundleEntry<'_>]) -> Result<Vec<u8>> {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    zip.start_file(manifest_file_name, options)?;
    zip.write_all(manifest)?;

    for entry in entries {
        zip.start_file(entry.photo_file_name.as_str(), options)?;
        zip.write_all(&entry.photo)?;
    }

    Ok(zip.finish()?.into_inner())
}
