//! # PostgreSQL Printable Document Repository
//!
//! Stores the aggregate across three tables:
//!
//! ```sql
//! printable_documents     -- aggregate root, carries `version`
//! print_requests          -- one row per attempt, `details` JSONB for immutable fields
//! print_request_statuses  -- append-only, UNIQUE (print_request_id, sort_key)
//! ```
//!
//! `print_requests.current_status` and `is_active` are denormalized on every
//! save so the batching query does not have to replay histories.
//!
//! Row shapes are converted to domain types by hand in this module.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use std::collections::HashMap;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::PrintableDocumentRepository;
use crate::error::{PrintFulfillmentError, Result};
use crate::models::{
    CertificateFormat, CertificateLanguage, Delivery, ElectoralRegistrationOffice, PrintRequest,
    PrintRequestStatusEntry, PrintableDocument, SourceType, StatusHistory,
};
use crate::state_machine::PrintRequestStatus;

#[derive(Debug, FromRow)]
struct PrintableDocumentRow {
    id: Uuid,
    kind: String,
    source_type: String,
    source_reference: String,
    application_reference: String,
    application_received_date_time: DateTime<Utc>,
    gss_code: String,
    document_number: String,
    issuing_authority: String,
    issuing_authority_cy: Option<String>,
    issue_date: NaiveDate,
    suggested_expiry_date: Option<NaiveDate>,
    initial_retention_removal_date: Option<NaiveDate>,
    final_retention_removal_date: Option<NaiveDate>,
    version: i64,
}

#[derive(Debug, FromRow)]
struct PrintRequestRow {
    id: Uuid,
    printable_document_id: Uuid,
    request_id: String,
    batch_id: Option<String>,
    request_date_time: DateTime<Utc>,
    details: Json<PrintRequestDetails>,
}

#[derive(Debug, FromRow)]
struct PrintRequestStatusRow {
    print_request_id: Uuid,
    status: String,
    event_date_time: DateTime<Utc>,
    message: Option<String>,
}

/// Immutable print request fields stored as JSONB
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PrintRequestDetails {
    first_name: String,
    middle_names: Option<String>,
    surname: String,
    certificate_language: CertificateLanguage,
    certificate_format: CertificateFormat,
    delivery: Delivery,
    ero_english: ElectoralRegistrationOffice,
    ero_welsh: Option<ElectoralRegistrationOffice>,
    photo_location_arn: String,
    user_id: String,
    requester_email: Option<String>,
}

impl From<&PrintRequest> for PrintRequestDetails {
    fn from(request: &PrintRequest) -> Self {
        Self {
            first_name: request.first_name.clone(),
            middle_names: request.middle_names.clone(),
            surname: request.surname.clone(),
            certificate_language: request.certificate_language,
            certificate_format: request.certificate_format,
            delivery: request.delivery.clone(),
            ero_english: request.ero_english.clone(),
            ero_welsh: request.ero_welsh.clone(),
            photo_location_arn: request.photo_location_arn.clone(),
            user_id: request.user_id.clone(),
            requester_email: request.requester_email.clone(),
        }
    }
}

fn to_print_request(row: PrintRequestRow, history: StatusHistory) -> PrintRequest {
    let details = row.details.0;
    PrintRequest {
        id: row.id,
        request_id: row.request_id,
        batch_id: row.batch_id,
        request_date_time: row.request_date_time,
        first_name: details.first_name,
        middle_names: details.middle_names,
        surname: details.surname,
        certificate_language: details.certificate_language,
        certificate_format: details.certificate_format,
        delivery: details.delivery,
        ero_english: details.ero_english,
        ero_welsh: details.ero_welsh,
        photo_location_arn: details.photo_location_arn,
        user_id: details.user_id,
        requester_email: details.requester_email,
        status_history: history,
    }
}

fn to_document(row: PrintableDocumentRow, print_requests: Vec<PrintRequest>) -> Result<PrintableDocument> {
    Ok(PrintableDocument {
        id: row.id,
        kind: row
            .kind
            .parse()
            .map_err(PrintFulfillmentError::DatabaseError)?,
        source_type: row
            .source_type
            .parse()
            .map_err(PrintFulfillmentError::DatabaseError)?,
        source_reference: row.source_reference,
        application_reference: row.application_reference,
        application_received_date_time: row.application_received_date_time,
        gss_code: row.gss_code,
        document_number: row.document_number,
        issuing_authority: row.issuing_authority,
        issuing_authority_cy: row.issuing_authority_cy,
        issue_date: row.issue_date,
        suggested_expiry_date: row.suggested_expiry_date,
        initial_retention_removal_date: row.initial_retention_removal_date,
        final_retention_removal_date: row.final_retention_removal_date,
        print_requests,
        version: row.version,
    })
}

const DOCUMENT_COLUMNS: &str = r#"
    id, kind, source_type, source_reference, application_reference,
    application_received_date_time, gss_code, document_number, issuing_authority,
    issuing_authority_cy, issue_date, suggested_expiry_date,
    initial_retention_removal_date, final_retention_removal_date, version
"#;

/// PostgreSQL-backed repository
#[derive(Debug, Clone)]
pub struct PgPrintableDocumentRepository {
    pool: PgPool,
}

impl PgPrintableDocumentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Load complete aggregates, preserving the order of `ids`
    async fn load_documents(&self, ids: &[Uuid]) -> Result<Vec<PrintableDocument>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let document_rows = sqlx::query_as::<_, PrintableDocumentRow>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM printable_documents WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        let request_rows = sqlx::query_as::<_, PrintRequestRow>(
            r#"
            SELECT id, printable_document_id, request_id, batch_id, request_date_time, details
            FROM print_requests
            WHERE printable_document_id = ANY($1)
            ORDER BY request_date_time ASC, created_at ASC
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        let status_rows = sqlx::query_as::<_, PrintRequestStatusRow>(
            r#"
            SELECT s.print_request_id, s.status, s.event_date_time, s.message
            FROM print_request_statuses s
            JOIN print_requests r ON r.id = s.print_request_id
            WHERE r.printable_document_id = ANY($1)
            ORDER BY s.print_request_id, s.sort_key ASC
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        let mut histories: HashMap<Uuid, Vec<PrintRequestStatusEntry>> = HashMap::new();
        for row in status_rows {
            let status: PrintRequestStatus = row
                .status
                .parse()
                .map_err(PrintFulfillmentError::DatabaseError)?;
            histories
                .entry(row.print_request_id)
                .or_default()
                .push(PrintRequestStatusEntry::new(
                    status,
                    row.event_date_time,
                    row.message,
                ));
        }

        let mut requests: HashMap<Uuid, Vec<PrintRequest>> = HashMap::new();
        for row in request_rows {
            let history = StatusHistory::from_entries(histories.remove(&row.id).unwrap_or_default());
            requests
                .entry(row.printable_document_id)
                .or_default()
                .push(to_print_request(row, history));
        }

        let mut documents: HashMap<Uuid, PrintableDocument> = HashMap::new();
        for row in document_rows {
            let id = row.id;
            let document = to_document(row, requests.remove(&id).unwrap_or_default())?;
            documents.insert(id, document);
        }

        Ok(ids.iter().filter_map(|id| documents.remove(id)).collect())
    }

    async fn document_ids(&self, sql: &str, bind: &str) -> Result<Vec<Uuid>> {
        Ok(sqlx::query_scalar::<_, Uuid>(sql)
            .bind(bind)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn write_print_requests(
        tx: &mut Transaction<'_, Postgres>,
        document: &PrintableDocument,
    ) -> Result<()> {
        let active_id = document.active_print_request().map(|request| request.id);

        for request in &document.print_requests {
            let current_status = request
                .current_status()
                .unwrap_or_default()
                .to_string();

            sqlx::query(
                r#"
                INSERT INTO print_requests
                    (id, printable_document_id, request_id, batch_id, request_date_time,
                     current_status, is_active, details, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW(), NOW())
                ON CONFLICT (id) DO UPDATE SET
                    request_id = EXCLUDED.request_id,
                    batch_id = EXCLUDED.batch_id,
                    current_status = EXCLUDED.current_status,
                    is_active = EXCLUDED.is_active,
                    updated_at = NOW()
                "#,
            )
            .bind(request.id)
            .bind(document.id)
            .bind(&request.request_id)
            .bind(&request.batch_id)
            .bind(request.request_date_time)
            .bind(current_status)
            .bind(Some(request.id) == active_id)
            .bind(Json(PrintRequestDetails::from(request)))
            .execute(&mut **tx)
            .await?;

            for (index, entry) in request.status_history.entries().iter().enumerate() {
                sqlx::query(
                    r#"
                    INSERT INTO print_request_statuses
                        (print_request_id, sort_key, status, event_date_time, message, created_at)
                    VALUES ($1, $2, $3, $4, $5, NOW())
                    ON CONFLICT (print_request_id, sort_key) DO NOTHING
                    "#,
                )
                .bind(request.id)
                .bind(index as i32 + 1)
                .bind(entry.status.as_str())
                .bind(entry.event_date_time)
                .bind(&entry.message)
                .execute(&mut **tx)
                .await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl PrintableDocumentRepository for PgPrintableDocumentRepository {
    #[instrument(skip(self, document), fields(document_id = %document.id))]
    async fn insert(&self, document: &PrintableDocument) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO printable_documents
                (id, kind, source_type, source_reference, application_reference,
                 application_received_date_time, gss_code, document_number, issuing_authority,
                 issuing_authority_cy, issue_date, suggested_expiry_date,
                 initial_retention_removal_date, final_retention_removal_date, version,
                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, NOW(), NOW())
            "#,
        )
        .bind(document.id)
        .bind(document.kind.as_str())
        .bind(document.source_type.as_str())
        .bind(&document.source_reference)
        .bind(&document.application_reference)
        .bind(document.application_received_date_time)
        .bind(&document.gss_code)
        .bind(&document.document_number)
        .bind(&document.issuing_authority)
        .bind(&document.issuing_authority_cy)
        .bind(document.issue_date)
        .bind(document.suggested_expiry_date)
        .bind(document.initial_retention_removal_date)
        .bind(document.final_retention_removal_date)
        .bind(document.version)
        .execute(&mut *tx)
        .await?;

        Self::write_print_requests(&mut tx, document).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PrintableDocument>> {
        Ok(self.load_documents(&[id]).await?.into_iter().next())
    }

    async fn find_by_source(
        &self,
        source_type: SourceType,
        source_reference: &str,
    ) -> Result<Vec<PrintableDocument>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id FROM printable_documents
            WHERE source_type = $1 AND source_reference = $2
            ORDER BY application_received_date_time ASC, id ASC
            "#,
        )
        .bind(source_type.as_str())
        .bind(source_reference)
        .fetch_all(&self.pool)
        .await?;
        self.load_documents(&ids).await
    }

    async fn find_by_request_id(&self, request_id: &str) -> Result<Option<PrintableDocument>> {
        let ids = self
            .document_ids(
                "SELECT printable_document_id FROM print_requests WHERE request_id = $1",
                request_id,
            )
            .await?;
        Ok(self.load_documents(&ids).await?.into_iter().next())
    }

    async fn find_by_batch_id(&self, batch_id: &str) -> Result<Vec<PrintableDocument>> {
        let ids = self
            .document_ids(
                r#"
                SELECT d.id FROM printable_documents d
                WHERE EXISTS (
                    SELECT 1 FROM print_requests r
                    WHERE r.printable_document_id = d.id AND r.batch_id = $1
                )
                ORDER BY d.application_received_date_time ASC, d.id ASC
                "#,
                batch_id,
            )
            .await?;
        self.load_documents(&ids).await
    }

    async fn find_pending_assignment(&self, limit: usize) -> Result<Vec<PrintableDocument>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT d.id FROM printable_documents d
            JOIN print_requests r ON r.printable_document_id = d.id
            WHERE r.is_active = true AND r.current_status = $1
            ORDER BY d.application_received_date_time ASC, d.id ASC
            LIMIT $2
            "#,
        )
        .bind(PrintRequestStatus::PendingAssignmentToBatch.as_str())
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;
        self.load_documents(&ids).await
    }

    #[instrument(skip(self, documents), fields(document_count = documents.len()))]
    async fn save_all(&self, documents: &mut [PrintableDocument]) -> Result<()> {
        if documents.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;

        for document in documents.iter() {
            let updated = sqlx::query(
                r#"
                UPDATE printable_documents SET
                    initial_retention_removal_date = $3,
                    final_retention_removal_date = $4,
                    version = version + 1,
                    updated_at = NOW()
                WHERE id = $1 AND version = $2
                "#,
            )
            .bind(document.id)
            .bind(document.version)
            .bind(document.initial_retention_removal_date)
            .bind(document.final_retention_removal_date)
            .execute(&mut *tx)
            .await?;

            if updated.rows_affected() == 0 {
                // Dropping the transaction rolls back every earlier write
                return Err(PrintFulfillmentError::ConcurrentModification {
                    document_id: document.id.to_string(),
                    expected_version: document.version,
                });
            }

            Self::write_print_requests(&mut tx, document).await?;
        }

        tx.commit().await?;

        for document in documents.iter_mut() {
            document.version += 1;
        }
        debug!(document_count = documents.len(), "Saved printable documents");
        Ok(())
    }
}
