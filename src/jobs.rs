//! On-demand triggers. The periodic schedules and a manual "run now" both go
//! through here, so both respect the indexer's run lease.

use crate::blockchain::client::ChainClient;
use crate::blockchain::indexer::{new_lease_owner, CycleOutcome};
use crate::error::ServiceError;
use crate::scoring::update_network_stats;
use crate::state::AppState;
use std::fmt;
use std::str::FromStr;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Job {
    Indexer,
    Metrics,
    NetworkStats,
}

impl FromStr for Job {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "indexer" => Ok(Job::Indexer),
            "metrics" => Ok(Job::Metrics),
            "network-stats" => Ok(Job::NetworkStats),
            other => Err(ServiceError::InvalidJob(other.to_string())),
        }
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Job::Indexer => write!(f, "indexer"),
            Job::Metrics => write!(f, "metrics"),
            Job::NetworkStats => write!(f, "network-stats"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Indexer(CycleOutcome),
    MetricsRecalculated,
    NetworkStatsUpdated,
}

pub async fn run_job<C: ChainClient>(state: &AppState<C>, job: Job) -> Result<JobOutcome, ServiceError> {
    info!("Running job: {}", job);

    match job {
        Job::Indexer => {
            let outcome = state.indexer.run_cycle(&new_lease_owner()).await?;
            Ok(JobOutcome::Indexer(outcome))
        }
        Job::Metrics => {
            state.metrics.recalculate_all_metrics().await?;
            Ok(JobOutcome::MetricsRecalculated)
        }
        Job::NetworkStats => {
            update_network_stats(&state.db_pool).await?;
            Ok(JobOutcome::NetworkStatsUpdated)
        }
    }
}
