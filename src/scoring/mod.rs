//! Wallet scoring: cached counters, ARC score, rank and percentile.
//!
//! Counters are always recounted from the stored transactions and daily
//! activity rows. The wallet's cached counters are outputs of this module,
//! never inputs.

pub mod aggregator;
pub mod overview;

use crate::config::ScoringConfig;
use crate::db::{activity, transaction, wallet};
use crate::error::ServiceError;
use sqlx::SqlitePool;
use tracing::{error, info};

pub use aggregator::{median, update_network_stats};

/// `min(max_score, transactions * tx_weight + active_days * day_weight)`
pub fn arc_score(config: &ScoringConfig, transaction_count: i64, active_days: i64) -> f64 {
    let raw = transaction_count as f64 * config.tx_weight + active_days as f64 * config.day_weight;
    raw.min(config.max_score)
}

/// Percentile of a 1-based rank among `total` wallets. Rank 1 approaches 100, rank `total` is 0.
pub fn percentile(rank: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    (total - rank) as f64 / total as f64 * 100.0
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WalletMetrics {
    pub total_transactions: i64,
    pub active_days: i64,
    pub arc_score: f64,
}

#[derive(Clone)]
pub struct MetricsService {
    db_pool: SqlitePool,
    config: ScoringConfig,
}

impl MetricsService {
    pub fn new(db_pool: SqlitePool, config: ScoringConfig) -> Self {
        Self { db_pool, config }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db_pool
    }

    /// Recount one wallet and write its counters and score back. Does not re-rank.
    pub async fn recompute_wallet_metrics(&self, address: &str) -> Result<WalletMetrics, ServiceError> {
        let total_transactions = transaction::count_from(&self.db_pool, address).await?;
        let active_days = activity::count_active_days(&self.db_pool, address).await?;
        let arc_score = arc_score(&self.config, total_transactions, active_days);

        wallet::update_metrics(&self.db_pool, address, total_transactions, active_days, arc_score).await?;

        Ok(WalletMetrics {
            total_transactions,
            active_days,
            arc_score,
        })
    }

    /// Score a single wallet and refresh the ranking so its rank is current.
    pub async fn score_wallet(&self, address: &str) -> Result<WalletMetrics, ServiceError> {
        let metrics = self.recompute_wallet_metrics(address).await?;
        self.recalculate_ranks().await?;
        Ok(metrics)
    }

    /// Rank every wallet from scratch by score. Returns the number of wallets ranked.
    pub async fn recalculate_ranks(&self) -> Result<usize, ServiceError> {
        let addresses = wallet::get_addresses_by_score(&self.db_pool).await?;
        let total = addresses.len() as i64;

        let ranks: Vec<(String, i64, f64)> = addresses
            .into_iter()
            .enumerate()
            .map(|(position, address)| {
                let rank = position as i64 + 1;
                (address, rank, percentile(rank, total))
            })
            .collect();

        wallet::write_ranks(&self.db_pool, &ranks).await?;
        Ok(ranks.len())
    }

    /// Recount every wallet in one pass, rank once, then refresh network stats.
    /// A wallet that fails to recount is logged and keeps its previous values.
    pub async fn recalculate_all_metrics(&self) -> Result<(), ServiceError> {
        info!("Recalculating all wallet metrics...");

        let addresses = wallet::get_all_addresses(&self.db_pool).await?;
        let mut failed = 0usize;

        for address in &addresses {
            if let Err(e) = self.recompute_wallet_metrics(address).await {
                error!("Error calculating metrics for {}: {}", address, e);
                failed += 1;
            }
        }

        let ranked = self.recalculate_ranks().await?;
        update_network_stats(&self.db_pool).await?;

        info!(
            "All metrics recalculated: {} wallets ranked, {} failed",
            ranked, failed
        );
        Ok(())
    }
}
