//! Postgres-backed persistence for the reconciliation pipeline: the job
//! queue (C8), the batch writer (C6), the progress reporter (C7), the audit
//! log, and the external action surface (out of the core's scope to expose
//! over HTTP, but implemented here as plain functions).

pub mod actions;
pub mod audit;
pub mod batch_writer;
pub mod error;
pub mod invoices;
pub mod progress;
pub mod queue;

pub use batch_writer::{BatchWriter, FlushSummary, DEFAULT_FLUSH_SIZE};
pub use error::StoreError;
pub use progress::ProgressReporter;
pub use queue::{Job, JobQueue, JobStatus, QueueConfig};
