//! Cursor store: the singleton `indexer_state` row.
//!
//! Run exclusion is a lease rather than a bare flag. Acquiring it is one
//! conditional `UPDATE`, so two triggers racing on the same database can never
//! both observe "idle" and proceed. An expired lease may be taken over, which
//! recovers from a process that died mid-cycle.

use sqlx::{Pool, Sqlite};
use crate::models::IndexerState;

const STATE_COLUMNS: &str = "last_block_number, last_block_hash, is_running, last_run_at, \
     error_message, lease_owner, lease_expires_at";

/// Create the row on first use with the configured start block.
pub async fn ensure_state(pool: &Pool<Sqlite>, start_block: u64) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO indexer_state (id, last_block_number, is_running) VALUES (1, ?, 0)
         ON CONFLICT(id) DO NOTHING",
    )
    .bind(start_block as i64)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn get_state(pool: &Pool<Sqlite>, start_block: u64) -> Result<IndexerState, sqlx::Error> {
    ensure_state(pool, start_block).await?;

    sqlx::query_as::<_, IndexerState>(&format!("SELECT {STATE_COLUMNS} FROM indexer_state WHERE id = 1"))
        .fetch_one(pool)
        .await
}

/// Last indexed block, or `None` if the cursor has never been created.
pub async fn last_block_number(pool: &Pool<Sqlite>) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar("SELECT last_block_number FROM indexer_state WHERE id = 1")
        .fetch_optional(pool)
        .await
}

/// Idle -> Running. Returns `false` if another owner holds an unexpired lease.
pub async fn try_acquire(
    pool: &Pool<Sqlite>,
    owner: &str,
    now: i64,
    ttl_secs: i64,
    start_block: u64,
) -> Result<bool, sqlx::Error> {
    ensure_state(pool, start_block).await?;

    let result = sqlx::query(
        r#"
        UPDATE indexer_state
        SET is_running = 1, lease_owner = ?, lease_expires_at = ?
        WHERE id = 1
          AND (is_running = 0 OR lease_expires_at IS NULL OR lease_expires_at <= ?)
        "#,
    )
    .bind(owner)
    .bind(now + ttl_secs)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Extend a held lease to `now + ttl_secs`. Returns `false` if `owner` no
/// longer holds it.
pub async fn renew(pool: &Pool<Sqlite>, owner: &str, now: i64, ttl_secs: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE indexer_state
        SET lease_expires_at = ?
        WHERE id = 1 AND is_running = 1 AND lease_owner = ?
        "#,
    )
    .bind(now + ttl_secs)
    .bind(owner)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Move the cursor forward. A lower block number than the stored one is ignored.
pub async fn advance_cursor(
    pool: &Pool<Sqlite>,
    block_number: u64,
    block_hash: Option<&str>,
    now: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO indexer_state (id, last_block_number, last_block_hash, is_running, last_run_at)
        VALUES (1, ?1, ?2, 0, ?3)
        ON CONFLICT(id) DO UPDATE SET
            last_block_number = excluded.last_block_number,
            last_block_hash = excluded.last_block_hash,
            last_run_at = excluded.last_run_at
        WHERE indexer_state.last_block_number <= excluded.last_block_number
        "#,
    )
    .bind(block_number as i64)
    .bind(block_hash)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}

/// Running -> Idle. Clears any previous error.
pub async fn release(pool: &Pool<Sqlite>, owner: &str, now: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE indexer_state
        SET is_running = 0, lease_owner = NULL, lease_expires_at = NULL,
            error_message = NULL, last_run_at = ?
        WHERE id = 1 AND lease_owner = ?
        "#,
    )
    .bind(now)
    .bind(owner)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Running -> Failed. The cursor is left where the last completed block put it.
pub async fn mark_failed(
    pool: &Pool<Sqlite>,
    owner: &str,
    error_message: &str,
    now: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE indexer_state
        SET is_running = 0, lease_owner = NULL, lease_expires_at = NULL,
            error_message = ?, last_run_at = ?
        WHERE id = 1 AND lease_owner = ?
        "#,
    )
    .bind(error_message)
    .bind(now)
    .bind(owner)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}
