use sqlx::{Pool, Sqlite, SqliteConnection};
use crate::models::DailyActivity;

/// Add one transaction to the wallet's count for `day`.
pub async fn increment(
    conn: &mut SqliteConnection,
    wallet_address: &str,
    day: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO daily_activity (wallet_address, day, transaction_count)
        VALUES (?, ?, 1)
        ON CONFLICT(wallet_address, day) DO UPDATE SET
            transaction_count = transaction_count + 1
        "#,
    )
    .bind(wallet_address)
    .bind(day)
    .execute(conn)
    .await?;

    Ok(())
}

pub async fn count_active_days(pool: &Pool<Sqlite>, wallet_address: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM daily_activity WHERE wallet_address = ?")
        .bind(wallet_address)
        .fetch_one(pool)
        .await
}

pub async fn get_recent(
    pool: &Pool<Sqlite>,
    wallet_address: &str,
    limit: i64,
) -> Result<Vec<DailyActivity>, sqlx::Error> {
    sqlx::query_as::<_, DailyActivity>(
        r#"SELECT wallet_address, day, transaction_count
           FROM daily_activity
           WHERE wallet_address = ?
           ORDER BY day DESC
           LIMIT ?"#,
    )
    .bind(wallet_address)
    .bind(limit)
    .fetch_all(pool)
    .await
}
