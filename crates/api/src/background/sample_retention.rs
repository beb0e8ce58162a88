//! Periodic pruning of persisted samples.
//!
//! Keeps the newest `keep` rows of `metric_samples` per host, matching the
//! in-memory history capacity, so the table stays bounded.

use std::time::Duration;

use hostwatch_db::repositories::SampleRepo;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

/// How often the pruning job runs.
pub const PRUNE_INTERVAL: Duration = Duration::from_secs(3600);

/// Run the pruning loop until `cancel` is triggered.
pub async fn run(pool: PgPool, keep: usize, every: Duration, cancel: CancellationToken) {
    let keep = i64::try_from(keep).unwrap_or(i64::MAX);
    tracing::info!(keep, interval_secs = every.as_secs(), "Sample retention job started");

    let mut interval = tokio::time::interval(every);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Sample retention job stopping");
                break;
            }
            _ = interval.tick() => {
                match SampleRepo::prune_per_host(&pool, keep).await {
                    Ok(deleted) if deleted > 0 => {
                        tracing::info!(deleted, "Sample retention: pruned old rows");
                    }
                    Ok(_) => tracing::debug!("Sample retention: nothing to prune"),
                    Err(e) => {
                        tracing::error!(error = %e, "Sample retention: prune failed");
                    }
                }
            }
        }
    }
}
