//! Prometheus metrics for worker observability.

use std::sync::Arc;

use prometheus_client::encoding::text::encode;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;

#[derive(Clone)]
pub struct WorkerMetrics {
    pub queue_depth: Gauge,
    pub active_jobs: Gauge,
    pub jobs_completed: Counter,
    pub jobs_failed: Counter,
    pub rows_auto_matched: Counter,
    pub rows_needs_review: Counter,
    pub rows_unmatched: Counter,
    pub reaper_reclaimed: Counter,
    registry: Arc<Registry>,
}

impl WorkerMetrics {
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let queue_depth = Gauge::default();
        registry.register("recon_queue_depth", "Number of claimable jobs", queue_depth.clone());

        let active_jobs = Gauge::default();
        registry.register(
            "recon_worker_active_jobs",
            "Number of jobs currently being processed by this worker",
            active_jobs.clone(),
        );

        let jobs_completed = Counter::default();
        registry.register("recon_worker_jobs_completed_total", "Total jobs completed", jobs_completed.clone());

        let jobs_failed = Counter::default();
        registry.register("recon_worker_jobs_failed_total", "Total jobs permanently failed", jobs_failed.clone());

        let rows_auto_matched = Counter::default();
        registry.register(
            "recon_rows_auto_matched_total",
            "Transaction rows auto-matched",
            rows_auto_matched.clone(),
        );

        let rows_needs_review = Counter::default();
        registry.register(
            "recon_rows_needs_review_total",
            "Transaction rows flagged for review",
            rows_needs_review.clone(),
        );

        let rows_unmatched = Counter::default();
        registry.register("recon_rows_unmatched_total", "Transaction rows left unmatched", rows_unmatched.clone());

        let reaper_reclaimed = Counter::default();
        registry.register(
            "recon_reaper_jobs_reclaimed_total",
            "Stale jobs reclaimed at startup",
            reaper_reclaimed.clone(),
        );

        Self {
            queue_depth,
            active_jobs,
            jobs_completed,
            jobs_failed,
            rows_auto_matched,
            rows_needs_review,
            rows_unmatched,
            reaper_reclaimed,
            registry: Arc::new(registry),
        }
    }

    pub fn encode(&self) -> String {
        let mut buf = String::new();
        encode(&mut buf, &self.registry).unwrap();
        buf
    }
}

impl Default for WorkerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_produces_valid_prometheus_text() {
        let metrics = WorkerMetrics::new();
        metrics.jobs_completed.inc();
        let output = metrics.encode();
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE recon_queue_depth gauge"));
        assert!(output.contains("recon_worker_jobs_completed_total_total 1"));
    }
}
