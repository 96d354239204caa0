//! Loads the eligible-invoice set that [`recon_core::InvoiceCache`] is built
//! from. The loader materializes everything eagerly — it must not stream —
//! and does not rely on the database's return ordering (the cache imposes
//! its own canonical sort).

use chrono::{DateTime, Utc};
use recon_core::model::{Invoice, InvoiceStatus};
use sqlx::{FromRow, PgPool, Row};
use uuid::Uuid;

use crate::error::StoreError;

struct InvoiceRow(Invoice);

impl FromRow<'_, sqlx::postgres::PgRow> for InvoiceRow {
    fn from_row(row: &sqlx::postgres::PgRow) -> sqlx::Result<Self> {
        let status: String = row.try_get("status")?;
        let paid_at: Option<DateTime<Utc>> = row.try_get("paid_at")?;
        Ok(InvoiceRow(Invoice {
            id: row.try_get("id")?,
            invoice_number: row.try_get("invoice_number")?,
            customer_name: row.try_get("customer_name")?,
            amount: row.try_get("amount")?,
            due_date: row.try_get("due_date")?,
            status: parse_status(&status),
            paid_at,
        }))
    }
}

fn parse_status(s: &str) -> InvoiceStatus {
    match s {
        "draft" => InvoiceStatus::Draft,
        "paid" => InvoiceStatus::Paid,
        "overdue" => InvoiceStatus::Overdue,
        _ => InvoiceStatus::Sent,
    }
}

/// Loads every invoice eligible for matching (`status ∈ {sent, overdue}` AND
/// `paid_at` absent). Filtering at the SQL layer is an optimization only —
/// [`recon_core::model::Invoice::is_eligible`] remains the source of truth.
pub async fn load_eligible(pool: &PgPool) -> Result<Vec<Invoice>, StoreError> {
    let rows = sqlx::query_as::<_, InvoiceRow>(
        "SELECT id, invoice_number, customer_name, amount, due_date, status, paid_at
         FROM invoices
         WHERE status IN ('sent', 'overdue') AND paid_at IS NULL",
    )
    .fetch_all(pool)
    .await
    .map_err(StoreError::CacheLoadFailed)?;

    Ok(rows.into_iter().map(|r| r.0).collect())
}

/// Reads whether `invoice_id` is currently paid, within the caller's
/// transaction — used by `actions::manual_match` to enforce the "target
/// invoice not paid" precondition before asserting a match.
pub async fn is_paid(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    invoice_id: Uuid,
) -> Result<bool, StoreError> {
    let row = sqlx::query("SELECT status, paid_at FROM invoices WHERE id = $1")
        .bind(invoice_id)
        .fetch_optional(&mut **tx)
        .await?;

    let Some(row) = row else {
        return Ok(false);
    };
    let status: String = row.try_get("status")?;
    let paid_at: Option<DateTime<Utc>> = row.try_get("paid_at")?;
    Ok(parse_status(&status) == InvoiceStatus::Paid || paid_at.is_some())
}
