mod config;
mod health;
mod job_loop;
mod metrics;
mod pipeline;

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use config::WorkerConfig;
use health::{health_router, HealthState};
use metrics::WorkerMetrics;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = WorkerConfig::from_env()?;
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .context("failed to connect to database")?;

    let metrics = WorkerMetrics::new();
    let ready = Arc::new(AtomicBool::new(false));

    let health_state = HealthState {
        metrics: metrics.clone(),
        ready: ready.clone(),
    };
    let health_port = config.health_port;
    tokio::spawn(async move {
        let listener = tokio::net::TcpListener::bind(("0.0.0.0", health_port)).await.expect("bind health port");
        axum::serve(listener, health_router(health_state)).await.expect("health server crashed");
    });

    let queue = recon_store::JobQueue::new(pool.clone(), config.queue);
    let reclaimed = queue.recover_stale().await.context("stale-job recovery failed")?;
    if reclaimed > 0 {
        tracing::info!(reclaimed, "recovered stale jobs at startup");
        metrics.reaper_reclaimed.inc_by(reclaimed);
    }

    ready.store(true, std::sync::atomic::Ordering::Relaxed);
    tracing::info!("worker ready, entering poll loop");

    job_loop::run_job_loop(pool, queue, config, metrics).await
}
