//! Job queue (C8): single-table work queue with `SELECT ... FOR UPDATE SKIP
//! LOCKED` claiming, stale-job recovery, and at-most-once processing.

use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Row};
use uuid::Uuid;

use crate::error::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    fn as_str(self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    fn parse(s: &str) -> Self {
        match s {
            "processing" => JobStatus::Processing,
            "completed" => JobStatus::Completed,
            "failed" => JobStatus::Failed,
            _ => JobStatus::Queued,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Job {
    pub id: Uuid,
    pub batch_id: Uuid,
    pub file_content: Vec<u8>,
    pub status: JobStatus,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FromRow<'_, sqlx::postgres::PgRow> for Job {
    fn from_row(row: &sqlx::postgres::PgRow) -> sqlx::Result<Self> {
        let status: String = row.try_get("status")?;
        Ok(Job {
            id: row.try_get("id")?,
            batch_id: row.try_get("batch_id")?,
            file_content: row.try_get("file_content")?,
            status: JobStatus::parse(&status),
            attempts: row.try_get("attempts")?,
            last_error: row.try_get("last_error")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct QueueConfig {
    pub stale_threshold: Duration,
    pub max_attempts: i32,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            stale_threshold: Duration::from_secs(600),
            max_attempts: 1,
        }
    }
}

pub struct JobQueue {
    pool: PgPool,
    config: QueueConfig,
}

impl JobQueue {
    pub fn new(pool: PgPool, config: QueueConfig) -> Self {
        Self { pool, config }
    }

    /// Atomically selects the oldest claimable row (queued, or stale
    /// processing) and marks it processing. Returns `None` when there is no
    /// work — the caller should sleep `POLL_INTERVAL_MS` and retry.
    pub async fn claim(&self) -> Result<Option<Job>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let stale_interval = format!("{} seconds", self.config.stale_threshold.as_secs());

        let row = sqlx::query_as::<_, Job>(
            "SELECT id, batch_id, file_content, status, attempts, last_error, created_at, updated_at
             FROM reconciliation_jobs
             WHERE status = 'queued'
                OR (status = 'processing' AND updated_at < now() - $1::interval)
             ORDER BY created_at ASC
             FOR UPDATE SKIP LOCKED
             LIMIT 1",
        )
        .bind(&stale_interval)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(mut job) = row else {
            tx.commit().await?;
            return Ok(None);
        };

        sqlx::query(
            "UPDATE reconciliation_jobs
             SET status = 'processing', attempts = attempts + 1, updated_at = now()
             WHERE id = $1",
        )
        .bind(job.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        job.status = JobStatus::Processing;
        job.attempts += 1;
        Ok(Some(job))
    }

    pub async fn complete(&self, job_id: Uuid) -> Result<(), StoreError> {
        sqlx::query("UPDATE reconciliation_jobs SET status = 'completed', updated_at = now() WHERE id = $1")
            .bind(job_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Fails a job. Re-queues it if attempts remain under `MAX_ATTEMPTS`,
    /// otherwise marks it (and its owning batch) permanently failed.
    /// Returns `true` when the failure was terminal.
    pub async fn fail(&self, job: &Job, error: &str) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;

        if job.attempts < self.config.max_attempts {
            sqlx::query(
                "UPDATE reconciliation_jobs SET status = 'queued', last_error = $2, updated_at = now() WHERE id = $1",
            )
            .bind(job.id)
            .bind(error)
            .execute(&mut *tx)
            .await?;
            tx.commit().await?;
            return Ok(false);
        }

        sqlx::query(
            "UPDATE reconciliation_jobs SET status = 'failed', last_error = $2, updated_at = now() WHERE id = $1",
        )
        .bind(job.id)
        .bind(error)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE reconciliation_batches SET status = 'failed', completed_at = now() WHERE id = $1",
        )
        .bind(job.batch_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }

    /// Counts rows currently claimable by [`JobQueue::claim`]: `queued`, or
    /// stale `processing`. Used only to report `queue_depth` on `/metrics`.
    pub async fn claimable_count(&self) -> Result<i64, StoreError> {
        let stale_interval = format!("{} seconds", self.config.stale_threshold.as_secs());
        let row: (i64,) = sqlx::query_as(
            "SELECT count(*) FROM reconciliation_jobs
             WHERE status = 'queued'
                OR (status = 'processing' AND updated_at < now() - $1::interval)",
        )
        .bind(&stale_interval)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.0)
    }

    /// Moves stale `processing` rows back to `queued` without touching
    /// `attempts`. Intended to run once at worker startup; `claim` already
    /// covers the steady-state case inline.
    pub async fn recover_stale(&self) -> Result<u64, StoreError> {
        let stale_interval = format!("{} seconds", self.config.stale_threshold.as_secs());
        let result = sqlx::query(
            "UPDATE reconciliation_jobs
             SET status = 'queued', updated_at = now()
             WHERE status = 'processing' AND updated_at < now() - $1::interval",
        )
        .bind(&stale_interval)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_status_round_trips() {
        assert_eq!(JobStatus::parse("processing").as_str(), "processing");
        assert_eq!(JobStatus::parse("completed").as_str(), "completed");
        assert_eq!(JobStatus::parse("failed").as_str(), "failed");
        assert_eq!(JobStatus::parse("queued").as_str(), "queued");
        assert_eq!(JobStatus::parse("anything-else").as_str(), "queued");
    }
}
