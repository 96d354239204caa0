//! Worker loop (C9): poll → claim → orchestrate → finalize → complete/fail.

use sqlx::PgPool;
use tokio::signal::unix::{signal, SignalKind};

use crate::config::WorkerConfig;
use crate::metrics::WorkerMetrics;
use crate::pipeline;

pub async fn run_job_loop(pool: PgPool, queue: recon_store::JobQueue, config: WorkerConfig, metrics: WorkerMetrics) -> anyhow::Result<()> {
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    loop {
        if let Ok(depth) = queue.claimable_count().await {
            metrics.queue_depth.set(depth);
        }

        tokio::select! {
            _ = sigterm.recv() => {
                tracing::info!("received SIGTERM, finishing current iteration then exiting");
                break;
            }
            _ = sigint.recv() => {
                tracing::info!("received SIGINT, finishing current iteration then exiting");
                break;
            }
            job = queue.claim() => {
                let job = match job {
                    Ok(job) => job,
                    Err(err) => {
                        tracing::warn!(error = %err, "claim failed, retrying next poll tick");
                        tokio::time::sleep(config.poll_interval).await;
                        continue;
                    }
                };
                let Some(job) = job else {
                    tokio::time::sleep(config.poll_interval).await;
                    continue;
                };

                metrics.active_jobs.inc();
                let span = tracing::info_span!("job", job_id = %job.id, batch_id = %job.batch_id, attempt = job.attempts);
                let _enter = span.enter();
                tracing::info!("claimed job");

                let result = pipeline::process_job(&pool, job.batch_id, &job.file_content, &config, &metrics).await;

                match result {
                    Ok(()) => {
                        queue.complete(job.id).await?;
                        metrics.jobs_completed.inc();
                        tracing::info!("job completed");
                    }
                    Err(err) => {
                        let code = err.code();
                        tracing::warn!(error = %code, "job failed");
                        let terminal = queue.fail(&job, &code).await?;
                        if terminal {
                            metrics.jobs_failed.inc();
                        }
                    }
                }
                metrics.active_jobs.dec();
            }
        }
    }

    Ok(())
}
