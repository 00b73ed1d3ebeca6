use sqlx::{Pool, Sqlite, SqliteConnection};
use crate::models::{LeaderboardEntry, Wallet};

const WALLET_COLUMNS: &str = "address, first_seen_at, last_seen_at, total_transactions, active_days, \
     arc_score, rank, percentile, status";

/// Insert the wallet or widen its seen window. `last_seen_at` only moves
/// forward and `first_seen_at` only moves back, whatever order blocks arrive in.
pub async fn upsert_seen(
    conn: &mut SqliteConnection,
    address: &str,
    seen_at: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO wallets (address, first_seen_at, last_seen_at)
        VALUES (?, ?, ?)
        ON CONFLICT(address) DO UPDATE SET
            first_seen_at = MIN(first_seen_at, excluded.first_seen_at),
            last_seen_at = MAX(last_seen_at, excluded.last_seen_at)
        "#,
    )
    .bind(address)
    .bind(seen_at)
    .bind(seen_at)
    .execute(conn)
    .await?;

    Ok(())
}

pub async fn get_wallet(pool: &Pool<Sqlite>, address: &str) -> Result<Option<Wallet>, sqlx::Error> {
    sqlx::query_as::<_, Wallet>(&format!("SELECT {WALLET_COLUMNS} FROM wallets WHERE address = ?"))
        .bind(address)
        .fetch_optional(pool)
        .await
}

pub async fn get_all_addresses(pool: &Pool<Sqlite>) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar("SELECT address FROM wallets ORDER BY first_seen_at ASC, address ASC")
        .fetch_all(pool)
        .await
}

pub async fn update_metrics(
    pool: &Pool<Sqlite>,
    address: &str,
    total_transactions: i64,
    active_days: i64,
    arc_score: f64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE wallets SET total_transactions = ?, active_days = ?, arc_score = ? WHERE address = ?",
    )
    .bind(total_transactions)
    .bind(active_days)
    .bind(arc_score)
    .bind(address)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Every wallet in rank order. Ties on score fall back to first-seen time, then address.
pub async fn get_addresses_by_score(pool: &Pool<Sqlite>) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT address FROM wallets ORDER BY arc_score DESC, first_seen_at ASC, address ASC",
    )
    .fetch_all(pool)
    .await
}

/// Write all ranks in one transaction so readers never see a half-ranked table.
pub async fn write_ranks(pool: &Pool<Sqlite>, ranks: &[(String, i64, f64)]) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    for (address, rank, percentile) in ranks {
        sqlx::query("UPDATE wallets SET rank = ?, percentile = ? WHERE address = ?")
            .bind(rank)
            .bind(percentile)
            .bind(address)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(())
}

pub async fn count_wallets(pool: &Pool<Sqlite>) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM wallets")
        .fetch_one(pool)
        .await
}

pub async fn count_active_wallets(pool: &Pool<Sqlite>) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM wallets WHERE total_transactions > 0")
        .fetch_one(pool)
        .await
}

/// Cached transaction counts of active wallets, ascending.
pub async fn active_transaction_counts(pool: &Pool<Sqlite>) -> Result<Vec<i64>, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT total_transactions FROM wallets WHERE total_transactions > 0 ORDER BY total_transactions ASC",
    )
    .fetch_all(pool)
    .await
}

pub async fn get_leaderboard(
    pool: &Pool<Sqlite>,
    offset: i64,
    limit: i64,
) -> Result<(Vec<LeaderboardEntry>, i64), sqlx::Error> {
    let total = count_active_wallets(pool).await?;

    let entries = sqlx::query_as::<_, LeaderboardEntry>(
        r#"SELECT rank, address, arc_score, percentile, total_transactions, active_days, status
           FROM wallets
           WHERE total_transactions > 0
           ORDER BY arc_score DESC, first_seen_at ASC, address ASC
           LIMIT ? OFFSET ?"#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok((entries, total))
}
