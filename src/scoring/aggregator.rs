// Network-wide aggregates, recomputed wholesale from the stored wallets,
// transactions and cursor on every pass.

use crate::db::{indexer_state, network_stats, transaction, wallet};
use crate::error::ServiceError;
use crate::models::NetworkStats;
use sqlx::SqlitePool;
use tracing::debug;

/// Median of ascending-sorted values. Even counts average the two middle values.
pub fn median(sorted: &[i64]) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) as f64 / 2.0
    } else {
        sorted[mid] as f64
    }
}

pub async fn compute_network_stats(db_pool: &SqlitePool) -> Result<NetworkStats, ServiceError> {
    let total_wallets = wallet::count_wallets(db_pool).await?;
    let total_transactions = transaction::count_all(db_pool).await?;
    let active_counts = wallet::active_transaction_counts(db_pool).await?;

    let avg_transactions_per_wallet = if total_wallets > 0 {
        total_transactions as f64 / total_wallets as f64
    } else {
        0.0
    };

    let last_processed_block = indexer_state::last_block_number(db_pool).await?.unwrap_or(0);

    Ok(NetworkStats {
        total_wallets,
        total_transactions,
        total_active_wallets: active_counts.len() as i64,
        avg_transactions_per_wallet,
        median_transactions_per_wallet: median(&active_counts),
        last_processed_block,
        last_updated: chrono::Utc::now().timestamp(),
    })
}

/// Recompute the stats row and replace it in a single write.
pub async fn update_network_stats(db_pool: &SqlitePool) -> Result<NetworkStats, ServiceError> {
    let stats = compute_network_stats(db_pool).await?;
    network_stats::replace_stats(db_pool, &stats).await?;

    debug!(
        "Network stats updated: {} wallets, {} transactions, {} active",
        stats.total_wallets, stats.total_transactions, stats.total_active_wallets
    );
    Ok(stats)
}
