use crate::blockchain::client::ChainClient;
use crate::blockchain::models::{extract_transaction, Block, ChainTransaction};
use crate::db::{activity, transaction, wallet};
use crate::error::ServiceError;
use sqlx::SqlitePool;
use tracing::debug;

/// What happened to one transaction of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Wallet, transaction and daily activity rows were written.
    Inserted,
    /// The hash is already stored; nothing was written.
    Duplicate,
    /// The node has no receipt for it yet.
    ReceiptMissing,
    /// The transaction has no sender.
    NoSender,
}

/// Ingest one transaction of `block`.
///
/// The wallet upsert, the transaction insert and the daily-activity increment
/// commit together. The insert is conflict-guarded on the hash, so a replay that
/// slips past the existence check still cannot double count.
pub async fn ingest_transaction<C: ChainClient>(
    client: &C,
    db_pool: &SqlitePool,
    tx: &ChainTransaction,
    block: &Block,
) -> Result<IngestOutcome, ServiceError> {
    if tx.from.is_none() {
        return Ok(IngestOutcome::NoSender);
    }

    let Some(receipt) = client.get_receipt(&tx.hash).await? else {
        debug!("No receipt yet for transaction {}", tx.hash);
        return Ok(IngestOutcome::ReceiptMissing);
    };

    if transaction::exists(db_pool, &tx.hash).await? {
        debug!("Transaction {} already indexed", tx.hash);
        return Ok(IngestOutcome::Duplicate);
    }

    let Some(record) = extract_transaction(block, tx, &receipt) else {
        return Ok(IngestOutcome::NoSender);
    };

    let mut db_tx = db_pool.begin().await?;

    wallet::upsert_seen(&mut db_tx, &record.from_address, block.timestamp).await?;

    if !transaction::insert_transaction(&mut db_tx, &record).await? {
        db_tx.rollback().await?;
        debug!("Transaction {} inserted concurrently, skipping", tx.hash);
        return Ok(IngestOutcome::Duplicate);
    }

    activity::increment(&mut db_tx, &record.from_address, block.day()).await?;

    db_tx.commit().await?;
    debug!("Processed transaction {}", tx.hash);

    Ok(IngestOutcome::Inserted)
}
