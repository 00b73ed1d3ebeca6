//! Block ingestion engine.
//!
//! One cycle: acquire the run lease, work out the next batch of blocks after the
//! cursor, index them in order, release the lease. Blocks are delivered at
//! least once; transactions within a block are best-effort.

use crate::blockchain::client::ChainClient;
use crate::blockchain::processor::{ingest_transaction, IngestOutcome};
use crate::config::IndexerConfig;
use crate::db::indexer_state;
use crate::error::ServiceError;
use crate::models::IndexerState;
use sqlx::SqlitePool;
use std::ops::RangeInclusive;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Result of indexing a single block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockOutcome {
    /// The node does not have the block yet. The cursor was not moved.
    NotFound,
    /// The block was processed and the cursor advanced to it.
    Indexed(BlockReport),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockReport {
    pub inserted: usize,
    pub duplicates: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub blocks_indexed: u64,
    pub transactions_inserted: usize,
    pub transactions_failed: usize,
    /// Block the cycle stopped at because the node did not have it.
    pub stopped_at: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Disabled,
    /// Another cycle holds the run lease.
    Skipped,
    Completed(CycleReport),
}

pub struct Indexer<C> {
    client: Arc<C>,
    db_pool: SqlitePool,
    config: IndexerConfig,
}

impl<C: ChainClient> Indexer<C> {
    pub fn new(client: Arc<C>, db_pool: SqlitePool, config: IndexerConfig) -> Self {
        Self { client, db_pool, config }
    }

    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    pub async fn state(&self) -> Result<IndexerState, ServiceError> {
        Ok(indexer_state::get_state(&self.db_pool, self.config.start_block).await?)
    }

    /// The contiguous blocks after the cursor, capped at `batch_size` blocks and
    /// at the current chain height. Empty when the cursor is caught up.
    pub async fn compute_blocks_to_index(&self) -> Result<Vec<u64>, ServiceError> {
        let state = self.state().await?;
        let current_height = self.client.current_height().await?;
        let last_indexed = state.last_block_number.max(0) as u64;

        Ok(block_range(last_indexed, current_height, self.config.batch_size)
            .map(|range| range.collect())
            .unwrap_or_default())
    }

    /// Index one block. Per-transaction failures, undecodable entries included,
    /// are logged and counted; they never abort the block. Errors returned here
    /// are block-level: the block fetch or the cursor write failed.
    ///
    /// The caller must hold the run lease; [`Indexer::run_cycle`] is the
    /// lease-guarded entry point.
    pub(crate) async fn index_block(&self, number: u64) -> Result<BlockOutcome, ServiceError> {
        debug!("Indexing block {}", number);

        let Some(block) = self.client.get_block(number).await? else {
            warn!("Block {} not found", number);
            return Ok(BlockOutcome::NotFound);
        };

        let mut report = BlockReport {
            failed: block.malformed_transactions,
            ..Default::default()
        };

        for tx in &block.transactions {
            if tx.from.is_none() {
                report.skipped += 1;
                continue;
            }

            match ingest_transaction(self.client.as_ref(), &self.db_pool, tx, &block).await {
                Ok(IngestOutcome::Inserted) => report.inserted += 1,
                Ok(IngestOutcome::Duplicate) => report.duplicates += 1,
                Ok(IngestOutcome::ReceiptMissing | IngestOutcome::NoSender) => report.skipped += 1,
                Err(e) => {
                    error!("Error processing transaction {}: {}", tx.hash, e);
                    report.failed += 1;
                }
            }
        }

        indexer_state::advance_cursor(&self.db_pool, number, block.hash.as_deref(), now_secs()).await?;

        if !block.transactions.is_empty() {
            debug!(
                "Indexed block {} with {} transactions ({} new, {} failed)",
                number,
                block.transactions.len(),
                report.inserted,
                report.failed
            );
        }

        Ok(BlockOutcome::Indexed(report))
    }

    /// One indexing cycle under the run lease.
    ///
    /// A failure that escapes the batch moves the state to Failed with the
    /// message recorded, and the next trigger retries from the cursor.
    pub async fn run_cycle(&self, owner: &str) -> Result<CycleOutcome, ServiceError> {
        if !self.config.enabled {
            debug!("Indexer disabled, skipping cycle");
            return Ok(CycleOutcome::Disabled);
        }

        let acquired = indexer_state::try_acquire(
            &self.db_pool,
            owner,
            now_secs(),
            self.config.lease_ttl.as_secs() as i64,
            self.config.start_block,
        )
        .await?;

        if !acquired {
            debug!("Indexer already running, skipping...");
            return Ok(CycleOutcome::Skipped);
        }

        match self.index_pending(owner).await {
            Ok(report) => {
                if !indexer_state::release(&self.db_pool, owner, now_secs()).await? {
                    warn!("Run lease of {} was taken over before release", owner);
                }
                Ok(CycleOutcome::Completed(report))
            }
            Err(e) => {
                error!("Indexing cycle failed: {}", e);
                match indexer_state::mark_failed(&self.db_pool, owner, &e.to_string(), now_secs()).await {
                    Ok(true) => {}
                    Ok(false) => warn!("Run lease of {} is gone, failure not recorded", owner),
                    Err(mark_err) => error!("Failed to record indexer failure: {}", mark_err),
                }
                Err(e)
            }
        }
    }

    /// Push the lease expiry forward. Fails with `LeaseLost` once another owner
    /// has taken the lease over.
    async fn renew_lease(&self, owner: &str) -> Result<(), ServiceError> {
        let renewed = indexer_state::renew(
            &self.db_pool,
            owner,
            now_secs(),
            self.config.lease_ttl.as_secs() as i64,
        )
        .await?;

        if renewed {
            Ok(())
        } else {
            Err(ServiceError::LeaseLost(owner.to_string()))
        }
    }

    async fn index_pending(&self, owner: &str) -> Result<CycleReport, ServiceError> {
        let mut report = CycleReport::default();

        let blocks = self.compute_blocks_to_index().await?;
        let (Some(first), Some(last)) = (blocks.first(), blocks.last()) else {
            debug!("No blocks to index");
            return Ok(report);
        };

        info!("Indexing {} blocks ({} to {})", blocks.len(), first, last);

        for number in blocks {
            self.renew_lease(owner).await?;

            match self.index_block(number).await? {
                BlockOutcome::Indexed(block) => {
                    report.blocks_indexed += 1;
                    report.transactions_inserted += block.inserted;
                    report.transactions_failed += block.failed;
                }
                BlockOutcome::NotFound => {
                    // Indexing past a missing block would skip it for good.
                    report.stopped_at = Some(number);
                    break;
                }
            }
        }

        info!(
            "Indexed {} blocks, {} new transactions, {} failed",
            report.blocks_indexed, report.transactions_inserted, report.transactions_failed
        );

        Ok(report)
    }
}

/// `[last + 1 ..= min(last + batch_size, height)]`, or `None` when `height <= last`.
pub fn block_range(last_indexed: u64, current_height: u64, batch_size: u64) -> Option<RangeInclusive<u64>> {
    if current_height <= last_indexed || batch_size == 0 {
        return None;
    }

    let end = last_indexed.saturating_add(batch_size).min(current_height);
    Some(last_indexed + 1..=end)
}

pub fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Fresh owner id for one cycle's run lease.
pub fn new_lease_owner() -> String {
    format!("indexer-{}", uuid::Uuid::new_v4())
}
