use sqlx::{Pool, Sqlite};
use crate::models::NetworkStats;

/// Stats row, created with zeros on first read.
pub async fn get_stats(pool: &Pool<Sqlite>) -> Result<NetworkStats, sqlx::Error> {
    sqlx::query("INSERT INTO network_stats (id) VALUES (1) ON CONFLICT(id) DO NOTHING")
        .execute(pool)
        .await?;

    sqlx::query_as::<_, NetworkStats>(
        r#"SELECT total_wallets, total_transactions, total_active_wallets,
                  avg_transactions_per_wallet, median_transactions_per_wallet,
                  last_processed_block, last_updated
           FROM network_stats WHERE id = 1"#,
    )
    .fetch_one(pool)
    .await
}

/// Replace the whole row in a single statement.
pub async fn replace_stats(pool: &Pool<Sqlite>, stats: &NetworkStats) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO network_stats
        (id, total_wallets, total_transactions, total_active_wallets, avg_transactions_per_wallet,
         median_transactions_per_wallet, last_processed_block, last_updated)
        VALUES (1, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            total_wallets = excluded.total_wallets,
            total_transactions = excluded.total_transactions,
            total_active_wallets = excluded.total_active_wallets,
            avg_transactions_per_wallet = excluded.avg_transactions_per_wallet,
            median_transactions_per_wallet = excluded.median_transactions_per_wallet,
            last_processed_block = excluded.last_processed_block,
            last_updated = excluded.last_updated
        "#,
    )
    .bind(stats.total_wallets)
    .bind(stats.total_transactions)
    .bind(stats.total_active_wallets)
    .bind(stats.avg_transactions_per_wallet)
    .bind(stats.median_transactions_per_wallet)
    .bind(stats.last_processed_block)
    .bind(stats.last_updated)
    .execute(pool)
    .await?;

    Ok(())
}
