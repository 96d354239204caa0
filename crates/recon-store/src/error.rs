use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invoice cache load failed: {0}")]
    CacheLoadFailed(#[source] sqlx::Error),
    #[error("file_content_missing")]
    FileContentMissing,
    #[error("batch_insert_failed: {0}")]
    BatchInsertFailed(#[source] sqlx::Error),
    #[error("progress_write_failed: {0}")]
    ProgressWriteFailed(#[source] sqlx::Error),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// A short, machine-stable code suitable for `ReconciliationJob.last_error`.
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::CacheLoadFailed(_) => "invoice_cache_load_failed",
            StoreError::FileContentMissing => "file_content_missing",
            StoreError::BatchInsertFailed(_) => "batch_insert_failed",
            StoreError::ProgressWriteFailed(_) => "progress_write_failed",
            StoreError::Database(_) => "database_error",
        }
    }
}
