//! Block and transaction ingestion

#[cfg(test)]
mod tests {
    use crate::blockchain::client::ChainClient;
    use crate::blockchain::indexer::{block_range, BlockOutcome, BlockReport};
    use crate::blockchain::models::{Block, Receipt, RpcBlock};
    use crate::blockchain::processor::{ingest_transaction, IngestOutcome};
    use crate::db::{activity, indexer_state, transaction, wallet};
    use crate::models::day_bucket;
    use crate::tests::mock_chain::{tx, DAY, DAY_ONE};
    use crate::tests::setup;
    use alloy_primitives::U256;
    use serde_json::json;

    const MIXED_CASE_SENDER: &str = "0xABCdef0123456789ABCDEF0123456789abcdef01";
    const SENDER: &str = "0xabcdef0123456789abcdef0123456789abcdef01";
    const OTHER: &str = "0x1111111111111111111111111111111111111111";
    const RECIPIENT: &str = "0x2222222222222222222222222222222222222222";

    async fn count_rows(pool: &sqlx::SqlitePool, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_blocks_to_index_from_empty_store() {
        let (_chain, state) = setup(50, 100).await;

        let blocks = state.indexer.compute_blocks_to_index().await.unwrap();

        assert_eq!(blocks, (1..=50).collect::<Vec<u64>>());
    }

    #[tokio::test]
    async fn test_blocks_to_index_is_capped_by_batch_size() {
        let (_chain, state) = setup(1_000, 100).await;
        indexer_state::ensure_state(&state.db_pool, 0).await.unwrap();
        indexer_state::advance_cursor(&state.db_pool, 250, None, 0).await.unwrap();

        let blocks = state.indexer.compute_blocks_to_index().await.unwrap();

        assert_eq!(blocks.len(), 100);
        assert_eq!(blocks.first(), Some(&251));
        assert_eq!(blocks.last(), Some(&350));
    }

    #[tokio::test]
    async fn test_blocks_to_index_empty_when_caught_up() {
        let (_chain, state) = setup(10, 100).await;
        indexer_state::ensure_state(&state.db_pool, 0).await.unwrap();
        indexer_state::advance_cursor(&state.db_pool, 10, None, 0).await.unwrap();

        assert!(state.indexer.compute_blocks_to_index().await.unwrap().is_empty());

        indexer_state::advance_cursor(&state.db_pool, 12, None, 0).await.unwrap();
        assert!(state.indexer.compute_blocks_to_index().await.unwrap().is_empty());
    }

    #[test]
    fn test_block_range_bound() {
        for last in [0u64, 1, 7, 99, 500] {
            for height in [0u64, 1, 5, 50, 100, 101, 600, 10_000] {
                for batch in [1u64, 10, 100] {
                    let count = block_range(last, height, batch).map(|r| r.count() as u64).unwrap_or(0);
                    if height > last {
                        assert_eq!(count, height.min(last + batch) - last, "L={last} H={height} B={batch}");
                        let range = block_range(last, height, batch).unwrap();
                        assert_eq!(*range.start(), last + 1);
                    } else {
                        assert_eq!(count, 0, "L={last} H={height} B={batch}");
                    }
                }
            }
        }
    }

    #[tokio::test]
    async fn test_index_block_lowercases_sender() {
        let (chain, state) = setup(50, 100).await;
        chain.add_block(1, DAY_ONE, vec![tx("0xaa01", MIXED_CASE_SENDER, Some(RECIPIENT))]);

        let outcome = state.indexer.index_block(1).await.unwrap();
        let BlockOutcome::Indexed(report) = outcome else {
            panic!("expected block 1 to be indexed, got {outcome:?}");
        };
        assert_eq!(report.inserted, 1);

        assert!(wallet::get_wallet(&state.db_pool, MIXED_CASE_SENDER).await.unwrap().is_none());
        let stored = wallet::get_wallet(&state.db_pool, SENDER).await.unwrap().expect("wallet row");
        assert_eq!(stored.address, SENDER);
        assert_eq!(stored.first_seen_at, DAY_ONE);
        assert_eq!(stored.rank, None);
        assert_eq!(stored.percentile, None);
        assert_eq!(stored.status, "active");

        state.metrics.recalculate_all_metrics().await.unwrap();
        let scored = wallet::get_wallet(&state.db_pool, SENDER).await.unwrap().unwrap();
        assert_eq!(scored.total_transactions, 1);
        assert_eq!(scored.active_days, 1);
        assert_eq!(scored.rank, Some(1));
    }

    #[tokio::test]
    async fn test_stored_transaction_fields() {
        let (chain, state) = setup(50, 100).await;
        chain.add_block(3, DAY_ONE, vec![tx("0xaa01", SENDER, Some("0xABCD000000000000000000000000000000000000"))]);

        state.indexer.index_block(3).await.unwrap();

        let (rows, total) = transaction::get_transactions_from(&state.db_pool, SENDER, 0, 10).await.unwrap();
        assert_eq!(total, 1);
        let stored = &rows[0];
        assert_eq!(stored.hash, "0xaa01");
        assert_eq!(stored.block_number, 3);
        assert_eq!(stored.block_hash.as_deref(), Some("0xblock3"));
        assert_eq!(stored.to_address.as_deref(), Some("0xabcd000000000000000000000000000000000000"));
        assert_eq!(stored.value, "1000");
        assert_eq!(stored.gas_used, "21000");
        assert_eq!(stored.gas_price, "20");
        assert_eq!(stored.timestamp, DAY_ONE);
        assert_eq!(stored.status, 1);
        assert!(!stored.is_contract_creation);
        assert_eq!(stored.contract_address, None);
    }

    #[tokio::test]
    async fn test_contract_creation_from_receipt() {
        let (chain, state) = setup(50, 100).await;
        chain.add_block(1, DAY_ONE, vec![tx("0xc0de", SENDER, None)]);
        chain.set_receipt(Receipt {
            transaction_hash: "0xc0de".to_string(),
            transaction_index: Some(0),
            gas_used: U256::from(500_000u64),
            status: 0,
            contract_address: Some("0xC0FFEE0000000000000000000000000000000000".to_string()),
        });

        state.indexer.index_block(1).await.unwrap();

        let (rows, _) = transaction::get_transactions_from(&state.db_pool, SENDER, 0, 10).await.unwrap();
        assert_eq!(rows[0].to_address, None);
        assert!(rows[0].is_contract_creation);
        assert_eq!(rows[0].contract_address.as_deref(), Some("0xc0ffee0000000000000000000000000000000000"));
        assert_eq!(rows[0].status, 0);
        assert_eq!(rows[0].gas_used, "500000");
    }

    #[tokio::test]
    async fn test_reindexing_block_is_idempotent() {
        let (chain, state) = setup(50, 100).await;
        chain.add_block(
            1,
            DAY_ONE,
            vec![
                tx("0xaa01", SENDER, Some(RECIPIENT)),
                tx("0xaa02", SENDER, Some(RECIPIENT)),
                tx("0xaa03", OTHER, Some(RECIPIENT)),
            ],
        );

        state.indexer.index_block(1).await.unwrap();
        let second = state.indexer.index_block(1).await.unwrap();

        assert_eq!(
            second,
            BlockOutcome::Indexed(BlockReport {
                inserted: 0,
                duplicates: 3,
                skipped: 0,
                failed: 0,
            })
        );
        assert_eq!(count_rows(&state.db_pool, "transactions").await, 3);
        assert_eq!(count_rows(&state.db_pool, "wallets").await, 2);
        assert_eq!(count_rows(&state.db_pool, "daily_activity").await, 2);

        let days = activity::get_recent(&state.db_pool, SENDER, 30).await.unwrap();
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].transaction_count, 2);
    }

    #[tokio::test]
    async fn test_duplicate_hash_is_a_noop() {
        let (chain, state) = setup(50, 100).await;
        chain.add_block(1, DAY_ONE, vec![tx("0xdup", SENDER, Some(RECIPIENT))]);
        let block = chain.get_block(1).await.unwrap().unwrap();
        let t = &block.transactions[0];

        let first = ingest_transaction(chain.as_ref(), &state.db_pool, t, &block).await.unwrap();
        let second = ingest_transaction(chain.as_ref(), &state.db_pool, t, &block).await.unwrap();

        assert_eq!(first, IngestOutcome::Inserted);
        assert_eq!(second, IngestOutcome::Duplicate);
        assert_eq!(transaction::count_all(&state.db_pool).await.unwrap(), 1);
        assert_eq!(activity::get_recent(&state.db_pool, SENDER, 30).await.unwrap()[0].transaction_count, 1);
    }

    #[tokio::test]
    async fn test_missing_receipt_is_skipped() {
        let (chain, state) = setup(50, 100).await;
        chain.add_block(
            1,
            DAY_ONE,
            vec![tx("0xaa01", SENDER, Some(RECIPIENT)), tx("0xpending", OTHER, Some(RECIPIENT))],
        );
        chain.remove_receipt("0xpending");

        let outcome = state.indexer.index_block(1).await.unwrap();

        let BlockOutcome::Indexed(report) = outcome else {
            panic!("expected block to be indexed");
        };
        assert_eq!(report.inserted, 1);
        assert_eq!(report.skipped, 1);
        assert!(wallet::get_wallet(&state.db_pool, OTHER).await.unwrap().is_none());
        assert_eq!(indexer_state::last_block_number(&state.db_pool).await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn test_transaction_failure_does_not_abort_block() {
        let (chain, state) = setup(50, 100).await;
        chain.add_block(
            7,
            DAY_ONE,
            vec![
                tx("0xaa01", SENDER, Some(RECIPIENT)),
                tx("0xbroken", OTHER, Some(RECIPIENT)),
                tx("0xaa03", SENDER, Some(RECIPIENT)),
            ],
        );
        chain.fail_receipt("0xbroken");

        let outcome = state.indexer.index_block(7).await.unwrap();

        let BlockOutcome::Indexed(report) = outcome else {
            panic!("expected block to be indexed");
        };
        assert_eq!(report.inserted, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(transaction::count_all(&state.db_pool).await.unwrap(), 2);

        let cursor = indexer_state::get_state(&state.db_pool, 0).await.unwrap();
        assert_eq!(cursor.last_block_number, 7);
        assert_eq!(cursor.last_block_hash.as_deref(), Some("0xblock7"));
    }

    #[tokio::test]
    async fn test_malformed_transaction_does_not_stall_block() {
        let (chain, state) = setup(50, 100).await;
        let raw = json!({
            "number": "0x8",
            "hash": "0xblock8",
            "timestamp": "0x6553f100",
            "transactions": [
                {"hash": "0xaa01", "from": SENDER, "to": RECIPIENT, "value": "0x1"},
                {"hash": "0xaa02", "from": OTHER, "to": RECIPIENT, "value": "not-hex"}
            ]
        });
        let block: Block = serde_json::from_value::<RpcBlock>(raw).unwrap().into();
        chain.insert_block(block);

        let outcome = state.indexer.index_block(8).await.unwrap();

        let BlockOutcome::Indexed(report) = outcome else {
            panic!("expected block to be indexed");
        };
        assert_eq!(report.inserted, 1);
        assert_eq!(report.failed, 1);
        assert!(transaction::exists(&state.db_pool, "0xaa01").await.unwrap());
        assert_eq!(transaction::count_all(&state.db_pool).await.unwrap(), 1);

        let cursor = indexer_state::get_state(&state.db_pool, 0).await.unwrap();
        assert_eq!(cursor.last_block_number, 8);
        assert_eq!(cursor.last_block_hash.as_deref(), Some("0xblock8"));
    }

    #[tokio::test]
    async fn test_transaction_without_sender_is_skipped() {
        let (chain, state) = setup(50, 100).await;
        let mut anonymous = tx("0xanon", SENDER, None);
        anonymous.from = None;
        chain.add_block(1, DAY_ONE, vec![anonymous]);

        let outcome = state.indexer.index_block(1).await.unwrap();

        let BlockOutcome::Indexed(report) = outcome else {
            panic!("expected block to be indexed");
        };
        assert_eq!(report.skipped, 1);
        assert_eq!(transaction::count_all(&state.db_pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_empty_block_advances_cursor() {
        let (chain, state) = setup(50, 100).await;
        chain.add_block(4, DAY_ONE, Vec::new());

        let outcome = state.indexer.index_block(4).await.unwrap();

        assert_eq!(outcome, BlockOutcome::Indexed(Default::default()));
        let cursor = indexer_state::get_state(&state.db_pool, 0).await.unwrap();
        assert_eq!(cursor.last_block_number, 4);
        assert_eq!(cursor.last_block_hash.as_deref(), Some("0xblock4"));
    }

    #[tokio::test]
    async fn test_missing_block_leaves_cursor() {
        let (_chain, state) = setup(50, 100).await;

        let outcome = state.indexer.index_block(9).await.unwrap();

        assert_eq!(outcome, BlockOutcome::NotFound);
        assert_eq!(indexer_state::get_state(&state.db_pool, 0).await.unwrap().last_block_number, 0);
    }

    #[tokio::test]
    async fn test_seen_window_only_widens() {
        let (chain, state) = setup(50, 100).await;
        chain.add_block(2, DAY_ONE + DAY, vec![tx("0xlate", SENDER, Some(RECIPIENT))]);
        chain.add_block(1, DAY_ONE, vec![tx("0xearly", SENDER, Some(RECIPIENT))]);

        // Out of order, as a retry after a partial failure would deliver them.
        state.indexer.index_block(2).await.unwrap();
        state.indexer.index_block(1).await.unwrap();

        let stored = wallet::get_wallet(&state.db_pool, SENDER).await.unwrap().unwrap();
        assert_eq!(stored.first_seen_at, DAY_ONE);
        assert_eq!(stored.last_seen_at, DAY_ONE + DAY);
    }

    #[tokio::test]
    async fn test_daily_activity_buckets_by_utc_day() {
        let (chain, state) = setup(50, 100).await;
        chain.add_block(1, DAY_ONE, vec![tx("0xd1a", SENDER, Some(RECIPIENT))]);
        chain.add_block(2, DAY_ONE + 600, vec![tx("0xd1b", SENDER, Some(RECIPIENT))]);
        chain.add_block(3, DAY_ONE + DAY, vec![tx("0xd2a", SENDER, Some(RECIPIENT))]);

        for number in 1..=3 {
            state.indexer.index_block(number).await.unwrap();
        }

        let days = activity::get_recent(&state.db_pool, SENDER, 30).await.unwrap();
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].day, day_bucket(DAY_ONE + DAY));
        assert_eq!(days[0].transaction_count, 1);
        assert_eq!(days[1].day, day_bucket(DAY_ONE));
        assert_eq!(days[1].transaction_count, 2);
        assert_eq!(day_bucket(DAY_ONE), 1_699_920_000);
    }
}
