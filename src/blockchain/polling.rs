use crate::blockchain::client::ChainClient;
use crate::jobs::{run_job, Job, JobOutcome};
use crate::blockchain::indexer::CycleOutcome;
use crate::state::AppState;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Run the indexing cycle every `config.indexer.interval` until shutdown.
/// Each tick is handled to completion before the next one is taken.
pub async fn start_indexer_polling<C: ChainClient + 'static>(state: Arc<AppState<C>>, shutdown: CancellationToken) {
    let period = state.config.indexer.interval;
    info!("Starting indexer polling every {:?}", period);

    run_every(period, shutdown, "indexer", || {
        let state = state.clone();
        async move {
            match run_job(&state, Job::Indexer).await {
                Ok(JobOutcome::Indexer(CycleOutcome::Completed(report))) => {
                    if report.blocks_indexed > 0 {
                        info!(
                            "Indexed {} blocks, {} new transactions",
                            report.blocks_indexed, report.transactions_inserted
                        );
                    }
                }
                Ok(outcome) => debug!("Indexer tick: {:?}", outcome),
                Err(e) => error!("Error in indexer cycle: {}", e),
            }
        }
    })
    .await;
}

/// Recalculate wallet metrics and network stats every `config.metrics_interval`.
pub async fn start_metrics_polling<C: ChainClient + 'static>(state: Arc<AppState<C>>, shutdown: CancellationToken) {
    let period = state.config.metrics_interval;
    info!("Starting metrics recalculation every {:?}", period);

    run_every(period, shutdown, "metrics", || {
        let state = state.clone();
        async move {
            // Recalculation ends with a stats refresh of its own.
            if let Err(e) = run_job(&state, Job::Metrics).await {
                error!("Error in metrics recalculation: {}", e);
                if let Err(e) = run_job(&state, Job::NetworkStats).await {
                    error!("Error updating network stats: {}", e);
                }
            }
        }
    })
    .await;
}

async fn run_every<F, Fut>(period: Duration, shutdown: CancellationToken, name: &str, mut tick: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = ()>,
{
    let mut ticker = interval(period);
    // A slow cycle delays the next one instead of queueing a burst.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            // An in-flight run always finishes so the run lease is released.
            _ = ticker.tick() => tick().await,
            _ = shutdown.cancelled() => {
                info!("Shutting down {} polling", name);
                break;
            }
        }
    }
}
