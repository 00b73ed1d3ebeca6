use sqlx::{Pool, Sqlite, SqliteConnection};
use crate::models::Transaction;

const TRANSACTION_COLUMNS: &str = "hash, block_number, block_hash, from_address, to_address, value, \
     gas_used, gas_price, timestamp, transaction_index, status, is_contract_creation, contract_address";

pub async fn exists(pool: &Pool<Sqlite>, hash: &str) -> Result<bool, sqlx::Error> {
    let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM transactions WHERE hash = ?")
        .bind(hash)
        .fetch_optional(pool)
        .await?;

    Ok(found.is_some())
}

/// Insert a transaction row. Returns `false` when the hash was already stored.
pub async fn insert_transaction(
    conn: &mut SqliteConnection,
    transaction: &Transaction,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO transactions
        (hash, block_number, block_hash, from_address, to_address, value, gas_used, gas_price,
         timestamp, transaction_index, status, is_contract_creation, contract_address)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(hash) DO NOTHING
        "#,
    )
    .bind(&transaction.hash)
    .bind(transaction.block_number)
    .bind(&transaction.block_hash)
    .bind(&transaction.from_address)
    .bind(&transaction.to_address)
    .bind(&transaction.value)
    .bind(&transaction.gas_used)
    .bind(&transaction.gas_price)
    .bind(transaction.timestamp)
    .bind(transaction.transaction_index)
    .bind(transaction.status)
    .bind(transaction.is_contract_creation)
    .bind(&transaction.contract_address)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

pub async fn count_all(pool: &Pool<Sqlite>) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM transactions")
        .fetch_one(pool)
        .await
}

pub async fn count_from(pool: &Pool<Sqlite>, address: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM transactions WHERE from_address = ?")
        .bind(address)
        .fetch_one(pool)
        .await
}

/// Transactions sent by `address`, newest first, with the total count.
pub async fn get_transactions_from(
    pool: &Pool<Sqlite>,
    address: &str,
    offset: i64,
    limit: i64,
) -> Result<(Vec<Transaction>, i64), sqlx::Error> {
    let total = count_from(pool, address).await?;

    let rows = sqlx::query_as::<_, Transaction>(&format!(
        "SELECT {TRANSACTION_COLUMNS} FROM transactions
         WHERE from_address = ?
         ORDER BY timestamp DESC, block_number DESC, transaction_index DESC
         LIMIT ? OFFSET ?"
    ))
    .bind(address)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok((rows, total))
}
