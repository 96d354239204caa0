//! Batch writer (C6): buffers `(row, decision)` pairs and flushes them to
//! `bank_transactions` in fixed-size, transactional multi-row inserts.

use recon_core::model::{Bucket, MatchDecision, TransactionRow};
use serde_json::Value;
use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

use crate::error::StoreError;

pub const DEFAULT_FLUSH_SIZE: usize = 500;

/// Per-status counts produced by a single flush, consumed by the progress
/// reporter (C7).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushSummary {
    pub inserted: i64,
    pub auto_matched: i64,
    pub needs_review: i64,
    pub unmatched: i64,
}

impl FlushSummary {
    fn record(&mut self, status: Bucket) {
        self.inserted += 1;
        match status {
            Bucket::AutoMatched => self.auto_matched += 1,
            Bucket::NeedsReview => self.needs_review += 1,
            Bucket::Unmatched => self.unmatched += 1,
        }
    }
}

pub struct BatchWriter {
    batch_id: Uuid,
    flush_size: usize,
    buffer: Vec<(TransactionRow, MatchDecision)>,
}

impl BatchWriter {
    pub fn new(batch_id: Uuid, flush_size: usize) -> Self {
        Self {
            batch_id,
            flush_size,
            buffer: Vec::with_capacity(flush_size),
        }
    }

    /// Buffers a decided row. Returns `true` when the buffer has reached
    /// `flush_size` and the caller should call [`BatchWriter::flush`].
    pub fn push(&mut self, row: TransactionRow, decision: MatchDecision) -> bool {
        self.buffer.push((row, decision));
        self.buffer.len() >= self.flush_size
    }

    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Inserts the buffered rows in one transactional multi-row statement.
    /// On failure the whole buffer is rolled back and nothing is counted;
    /// the caller fails the job with `batch_insert_failed`.
    pub async fn flush(&mut self, pool: &PgPool) -> Result<FlushSummary, StoreError> {
        if self.buffer.is_empty() {
            return Ok(FlushSummary::default());
        }

        let mut summary = FlushSummary::default();
        let mut tx = pool.begin().await.map_err(StoreError::BatchInsertFailed)?;

        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(
            "INSERT INTO bank_transactions \
             (id, batch_id, transaction_date, description, amount, reference_number, \
              status, matched_invoice_id, confidence, match_details) ",
        );

        builder.push_values(&self.buffer, |mut b, (row, decision)| {
            let details: Value = serde_json::to_value(&decision.details).unwrap_or(Value::Null);
            b.push_bind(Uuid::new_v4())
                .push_bind(self.batch_id)
                .push_bind(row.transaction_date)
                .push_bind(row.description.clone())
                .push_bind(row.amount.clone())
                .push_bind(row.reference_number.clone())
                .push_bind(status_str(decision.status))
                .push_bind(decision.invoice_id)
                .push_bind(decision_confidence(decision))
                .push_bind(details);
        });

        builder
            .build()
            .execute(&mut *tx)
            .await
            .map_err(StoreError::BatchInsertFailed)?;

        tx.commit().await.map_err(StoreError::BatchInsertFailed)?;

        for (_, decision) in self.buffer.drain(..) {
            summary.record(decision.status);
        }

        Ok(summary)
    }
}

fn status_str(bucket: Bucket) -> &'static str {
    match bucket {
        Bucket::AutoMatched => "auto_matched",
        Bucket::NeedsReview => "needs_review",
        Bucket::Unmatched => "unmatched",
    }
}

fn decision_confidence(decision: &MatchDecision) -> Option<f64> {
    match decision.status {
        Bucket::Unmatched => None,
        _ => Some(decision.confidence),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_reports_when_flush_size_reached() {
        let mut writer = BatchWriter::new(Uuid::new_v4(), 2);
        let row = TransactionRow {
            transaction_date: chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            description: "X".to_string(),
            amount: "1.00".to_string(),
            reference_number: None,
        };
        let decision = recon_core::match_row("X", "1.00", row.transaction_date, &[], &recon_core::MatcherConfig::default());
        assert!(!writer.push(row.clone(), decision.clone()));
        assert!(writer.push(row, decision));
        assert_eq!(writer.pending(), 2);
    }
}
