//! Progress reporter (C7): writes running counters onto the owning batch
//! row after every flush, and the final tuple at job completion.

use sqlx::PgPool;
use uuid::Uuid;

use crate::batch_writer::FlushSummary;
use crate::error::StoreError;

pub struct ProgressReporter;

impl ProgressReporter {
    /// Applies one flush's counts to the batch row. Uses parameter binding
    /// (not string-built SQL) so the write is observable to concurrent
    /// readers without holding any lock they'd contend on.
    pub async fn apply(pool: &PgPool, batch_id: Uuid, summary: FlushSummary) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE reconciliation_batches
             SET processed_count = processed_count + $2,
                 auto_matched = auto_matched + $3,
                 needs_review = needs_review + $4,
                 unmatched = unmatched + $5
             WHERE id = $1",
        )
        .bind(batch_id)
        .bind(summary.inserted)
        .bind(summary.auto_matched)
        .bind(summary.needs_review)
        .bind(summary.unmatched)
        .execute(pool)
        .await
        .map_err(StoreError::ProgressWriteFailed)?;
        Ok(())
    }

    /// Marks the batch `processing` once its job starts, but only if it is
    /// still `uploading` (the upload path may already have advanced it).
    pub async fn mark_processing(pool: &PgPool, batch_id: Uuid) -> Result<(), StoreError> {
        sqlx::query("UPDATE reconciliation_batches SET status = 'processing' WHERE id = $1 AND status = 'uploading'")
            .bind(batch_id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Writes `total_transactions` and transitions the batch to `completed`
    /// in one update, as required at job finalization.
    pub async fn finalize(pool: &PgPool, batch_id: Uuid, total_transactions: i64) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE reconciliation_batches
             SET total_transactions = $2, status = 'completed', completed_at = now()
             WHERE id = $1",
        )
        .bind(batch_id)
        .bind(total_transactions)
        .execute(pool)
        .await
        .map_err(StoreError::ProgressWriteFailed)?;
        Ok(())
    }
}
