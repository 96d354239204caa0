//! `/health`, `/ready`, `/metrics` HTTP surface. Runs alongside the poll
//! loop on a separate port; it is ops tooling, not one of the out-of-scope
//! external collaborators (§1 excludes the batch/transaction CRUD API, not
//! liveness/metrics endpoints).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::Router;

use crate::metrics::WorkerMetrics;

#[derive(Clone)]
pub struct HealthState {
    pub metrics: WorkerMetrics,
    pub ready: Arc<AtomicBool>,
}

pub fn health_router(state: HealthState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/metrics", get(metrics))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn ready(State(state): State<HealthState>) -> &'static str {
    if state.ready.load(Ordering::Relaxed) {
        "ready"
    } else {
        "not ready"
    }
}

async fn metrics(State(state): State<HealthState>) -> String {
    state.metrics.encode()
}
