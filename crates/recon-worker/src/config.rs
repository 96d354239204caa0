//! Environment-driven worker configuration (spec.md §6 "Configuration").

use std::time::Duration;

use anyhow::Context;
use recon_core::MatcherConfig;
use recon_store::QueueConfig;

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub database_url: String,
    pub poll_interval: Duration,
    pub batch_flush_size: usize,
    pub health_port: u16,
    pub matcher: MatcherConfig,
    pub queue: QueueConfig,
}

impl WorkerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

        let poll_interval_ms: u64 = std::env::var("POLL_INTERVAL_MS")
            .unwrap_or_else(|_| "1000".to_string())
            .parse()
            .context("POLL_INTERVAL_MS must be an integer")?;

        let stale_threshold_secs: u64 = std::env::var("STALE_THRESHOLD_SECS")
            .unwrap_or_else(|_| "600".to_string())
            .parse()
            .context("STALE_THRESHOLD_SECS must be an integer")?;

        let max_attempts: i32 = std::env::var("MAX_ATTEMPTS")
            .unwrap_or_else(|_| "1".to_string())
            .parse()
            .context("MAX_ATTEMPTS must be an integer")?;

        let batch_flush_size: usize = std::env::var("BATCH_FLUSH_SIZE")
            .unwrap_or_else(|_| "500".to_string())
            .parse()
            .context("BATCH_FLUSH_SIZE must be an integer")?;

        let health_port: u16 = std::env::var("HEALTH_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .context("HEALTH_PORT must be an integer")?;

        Ok(Self {
            database_url,
            poll_interval: Duration::from_millis(poll_interval_ms),
            batch_flush_size,
            health_port,
            matcher: MatcherConfig::from_env(),
            queue: QueueConfig {
                stale_threshold: Duration::from_secs(stale_threshold_secs),
                max_attempts,
            },
        })
    }
}
