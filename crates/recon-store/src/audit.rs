//! Append-only match audit log. The core writes the `auto_matched` entry
//! implicitly; external actions (out of scope here) always write one.

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::StoreError;

pub async fn record_auto_matched(pool: &PgPool, transaction_id: Uuid, invoice_id: Uuid) -> Result<(), StoreError> {
    sqlx::query(
        "INSERT INTO match_audit_log (id, transaction_id, action, new_invoice_id, actor, created_at)
         VALUES ($1, $2, 'auto_matched', $3, 'system', now())",
    )
    .bind(Uuid::new_v4())
    .bind(transaction_id)
    .bind(invoice_id)
    .execute(pool)
    .await?;
    Ok(())
}
