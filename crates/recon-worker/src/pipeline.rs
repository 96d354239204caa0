//! Per-job orchestration: C4 (cache) → C5 (ingest) → C3 (match) → C6
//! (write) → C7 (progress), the body of each worker-loop iteration (C9).

use std::io::Cursor;

use recon_core::InvoiceCache;
use recon_ingest::{CsvIngester, IngestError};
use recon_store::batch_writer::FlushSummary;
use recon_store::{BatchWriter, ProgressReporter, StoreError};
use sqlx::PgPool;
use thiserror::Error;

use crate::config::WorkerConfig;
use crate::metrics::WorkerMetrics;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("file_content_missing")]
    FileContentMissing,
    #[error("missing_required_column: {0}")]
    MissingRequiredColumn(&'static str),
    #[error("{0}")]
    Store(#[from] StoreError),
}

impl JobError {
    /// Short machine-stable code stored on `ReconciliationJob.last_error`.
    pub fn code(&self) -> String {
        match self {
            JobError::FileContentMissing => "file_content_missing".to_string(),
            JobError::MissingRequiredColumn(col) => format!("missing_required_column:{col}"),
            JobError::Store(e) => e.code().to_string(),
        }
    }
}

impl From<IngestError> for JobError {
    fn from(e: IngestError) -> Self {
        match e {
            IngestError::MissingRequiredColumn(col) => JobError::MissingRequiredColumn(col),
            IngestError::Csv(_) => JobError::MissingRequiredColumn("unreadable_header"),
        }
    }
}

/// Processes one claimed job end to end. Errors here are always `JobFatal`
/// from the caller's point of view — the worker loop calls `JobQueue::fail`
/// with `JobError::code()`.
pub async fn process_job(
    pool: &PgPool,
    batch_id: uuid::Uuid,
    file_content: &[u8],
    config: &WorkerConfig,
    metrics: &WorkerMetrics,
) -> Result<(), JobError> {
    if file_content.is_empty() {
        return Err(JobError::FileContentMissing);
    }

    ProgressReporter::mark_processing(pool, batch_id).await?;

    let invoices = recon_store::invoices::load_eligible(pool).await?;
    let mut cache = InvoiceCache::build(&invoices);
    tracing::info!(batch_id = %batch_id, eligible_invoices = cache.len(), "invoice cache built");

    let mut ingester = CsvIngester::new(Cursor::new(file_content))?;
    let mut writer = BatchWriter::new(batch_id, config.batch_flush_size);
    let mut total_rows: i64 = 0;

    while let Some(row) = ingester.next() {
        let candidates = cache.candidates_for(&row.amount);
        let decision = recon_core::match_row(
            &row.description,
            &row.amount,
            row.transaction_date,
            &candidates,
            &config.matcher,
        );

        if let Some(invoice_id) = decision.invoice_id {
            cache.reserve(invoice_id);
        }
        record_decision_metric(metrics, decision.status);

        if writer.push(row, decision) {
            let summary = flush_and_report(pool, &mut writer, batch_id).await?;
            total_rows += summary.inserted;
        }
    }

    if writer.pending() > 0 {
        let summary = flush_and_report(pool, &mut writer, batch_id).await?;
        total_rows += summary.inserted;
    }

    tracing::info!(
        batch_id = %batch_id,
        total_rows,
        invalid_rows = ingester.invalid_row_count(),
        "ingestion complete"
    );

    ProgressReporter::finalize(pool, batch_id, total_rows).await?;
    Ok(())
}

async fn flush_and_report(pool: &PgPool, writer: &mut BatchWriter, batch_id: uuid::Uuid) -> Result<FlushSummary, JobError> {
    let summary = writer.flush(pool).await?;
    ProgressReporter::apply(pool, batch_id, summary).await?;
    Ok(summary)
}

fn record_decision_metric(metrics: &WorkerMetrics, status: recon_core::Bucket) {
    match status {
        recon_core::Bucket::AutoMatched => metrics.rows_auto_matched.inc(),
        recon_core::Bucket::NeedsReview => metrics.rows_needs_review.inc(),
        recon_core::Bucket::Unmatched => metrics.rows_unmatched.inc(),
    };
}
