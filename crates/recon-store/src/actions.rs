//! External action contracts (spec.md §6). The HTTP handlers that invoke
//! these are out of scope for the core, but the operations themselves — and
//! the invariant that every one adjusts batch counters atomically in the
//! same transaction as the status change — belong here so an external
//! caller has something real to call.

use sqlx::{PgPool, Row};
use thiserror::Error;
use uuid::Uuid;

use crate::error::StoreError;

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("transaction not found")]
    TransactionNotFound,
    #[error("invalid precondition: current status is {current_status}")]
    InvalidPrecondition { current_status: String },
    #[error("invoice {invoice_id} is already paid")]
    InvoiceAlreadyPaid { invoice_id: Uuid },
    #[error("unrecognized batch counter column: {0}")]
    UnknownCounterColumn(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<sqlx::Error> for ActionError {
    fn from(e: sqlx::Error) -> Self {
        ActionError::Store(StoreError::Database(e))
    }
}

async fn locked_status(tx: &mut sqlx::Transaction<'_, sqlx::Postgres>, transaction_id: Uuid) -> Result<String, ActionError> {
    let row = sqlx::query("SELECT status FROM bank_transactions WHERE id = $1 FOR UPDATE")
        .bind(transaction_id)
        .fetch_optional(&mut **tx)
        .await?;
    let row = row.ok_or(ActionError::TransactionNotFound)?;
    Ok(row.try_get::<String, _>("status")?)
}

/// The only columns `adjust_batch_counters` is ever allowed to splice into
/// SQL. `bank_transactions.status` has no CHECK constraint, so a column name
/// derived from it must be checked against this list before interpolation.
const COUNTER_COLUMNS: &[&str] = &["auto_matched", "needs_review", "unmatched", "confirmed", "external"];

fn validate_counter_column(column: &str) -> Result<&str, ActionError> {
    COUNTER_COLUMNS
        .iter()
        .find(|&&c| c == column)
        .copied()
        .ok_or_else(|| ActionError::UnknownCounterColumn(column.to_string()))
}

async fn adjust_batch_counters(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    batch_id: Uuid,
    decrement_column: &str,
    increment_column: &str,
) -> Result<(), ActionError> {
    let decrement_column = validate_counter_column(decrement_column)?;
    let increment_column = validate_counter_column(increment_column)?;
    let sql = format!(
        "UPDATE reconciliation_batches SET {decrement_column} = {decrement_column} - 1, {increment_column} = {increment_column} + 1 WHERE id = $1"
    );
    sqlx::query(&sql).bind(batch_id).execute(&mut **tx).await?;
    Ok(())
}

/// `status ∈ {auto_matched, needs_review} → confirmed`.
pub async fn confirm(pool: &PgPool, transaction_id: Uuid, batch_id: Uuid) -> Result<(), ActionError> {
    let mut tx = pool.begin().await?;
    let status = locked_status(&mut tx, transaction_id).await?;
    if status != "auto_matched" && status != "needs_review" {
        return Err(ActionError::InvalidPrecondition { current_status: status });
    }

    sqlx::query("UPDATE bank_transactions SET status = 'confirmed' WHERE id = $1")
        .bind(transaction_id)
        .execute(&mut *tx)
        .await?;
    adjust_batch_counters(&mut tx, batch_id, &status, "confirmed").await?;
    write_audit(&mut tx, transaction_id, "confirmed", None, None, None).await?;

    tx.commit().await?;
    Ok(())
}

/// `status ∈ {auto_matched, needs_review} → unmatched`, clearing the match.
pub async fn reject(pool: &PgPool, transaction_id: Uuid, batch_id: Uuid) -> Result<(), ActionError> {
    let mut tx = pool.begin().await?;
    let status = locked_status(&mut tx, transaction_id).await?;
    if status != "auto_matched" && status != "needs_review" {
        return Err(ActionError::InvalidPrecondition { current_status: status });
    }

    sqlx::query(
        "UPDATE bank_transactions SET status = 'unmatched', matched_invoice_id = NULL, confidence = NULL WHERE id = $1",
    )
    .bind(transaction_id)
    .execute(&mut *tx)
    .await?;
    adjust_batch_counters(&mut tx, batch_id, &status, "unmatched").await?;
    write_audit(&mut tx, transaction_id, "rejected", None, None, None).await?;

    tx.commit().await?;
    Ok(())
}

/// Any status → confirmed, asserting `invoice_id` with full confidence.
/// Enforces the "target invoice not paid" precondition against the invoice
/// record before asserting the match.
pub async fn manual_match(
    pool: &PgPool,
    transaction_id: Uuid,
    batch_id: Uuid,
    invoice_id: Uuid,
) -> Result<(), ActionError> {
    let mut tx = pool.begin().await?;
    let status = locked_status(&mut tx, transaction_id).await?;

    if crate::invoices::is_paid(&mut tx, invoice_id).await? {
        return Err(ActionError::InvoiceAlreadyPaid { invoice_id });
    }

    sqlx::query(
        "UPDATE bank_transactions SET status = 'confirmed', matched_invoice_id = $2, confidence = 100.00 WHERE id = $1",
    )
    .bind(transaction_id)
    .bind(invoice_id)
    .execute(&mut *tx)
    .await?;
    adjust_batch_counters(&mut tx, batch_id, &status, "confirmed").await?;
    write_audit(&mut tx, transaction_id, "manual_matched", None, Some(invoice_id), None).await?;

    tx.commit().await?;
    Ok(())
}

/// Any non-`confirmed` status → external, clearing the match.
pub async fn mark_external(pool: &PgPool, transaction_id: Uuid, batch_id: Uuid) -> Result<(), ActionError> {
    let mut tx = pool.begin().await?;
    let status = locked_status(&mut tx, transaction_id).await?;
    if status == "confirmed" {
        return Err(ActionError::InvalidPrecondition { current_status: status });
    }

    sqlx::query("UPDATE bank_transactions SET status = 'external', matched_invoice_id = NULL WHERE id = $1")
        .bind(transaction_id)
        .execute(&mut *tx)
        .await?;
    adjust_batch_counters(&mut tx, batch_id, &status, "external").await?;
    write_audit(&mut tx, transaction_id, "marked_external", None, None, None).await?;

    tx.commit().await?;
    Ok(())
}

/// Confirms every `auto_matched` row in a batch; one audit row per changed
/// row, one batch-counter adjustment for the whole set.
pub async fn bulk_confirm(pool: &PgPool, batch_id: Uuid) -> Result<u64, ActionError> {
    let mut tx = pool.begin().await?;

    let ids: Vec<Uuid> = sqlx::query(
        "SELECT id FROM bank_transactions WHERE batch_id = $1 AND status = 'auto_matched' FOR UPDATE",
    )
    .bind(batch_id)
    .fetch_all(&mut *tx)
    .await?
    .into_iter()
    .map(|row| row.try_get::<Uuid, _>("id"))
    .collect::<Result<_, _>>()?;

    if ids.is_empty() {
        tx.commit().await?;
        return Ok(0);
    }

    sqlx::query("UPDATE bank_transactions SET status = 'confirmed' WHERE batch_id = $1 AND status = 'auto_matched'")
        .bind(batch_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        "UPDATE reconciliation_batches SET auto_matched = auto_matched - $2, confirmed = confirmed + $2 WHERE id = $1",
    )
    .bind(batch_id)
    .bind(ids.len() as i64)
    .execute(&mut *tx)
    .await?;

    for id in &ids {
        write_audit(&mut tx, *id, "confirmed", None, None, None).await?;
    }

    tx.commit().await?;
    Ok(ids.len() as u64)
}

async fn write_audit(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    transaction_id: Uuid,
    action: &str,
    previous_invoice_id: Option<Uuid>,
    new_invoice_id: Option<Uuid>,
    reason: Option<&str>,
) -> Result<(), ActionError> {
    sqlx::query(
        "INSERT INTO match_audit_log (id, transaction_id, action, previous_invoice_id, new_invoice_id, actor, reason, created_at)
         VALUES ($1, $2, $3, $4, $5, 'operator', $6, now())",
    )
    .bind(Uuid::new_v4())
    .bind(transaction_id)
    .bind(action)
    .bind(previous_invoice_id)
    .bind(new_invoice_id)
    .bind(reason)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
