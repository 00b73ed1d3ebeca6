use arc_score_indexer::{
    config::Config,
    db::{activity, connection, network_stats, transaction, wallet},
    models::{day_bucket, Transaction},
    scoring::MetricsService,
};

/// Write one synthetic transaction to the configured database and run a
/// scoring pass over it.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env();

    println!("Establishing database connection...");
    let pool = connection::establish_connection(&config.database_url).await?;
    println!("✅ Database connection established!");

    let now = chrono::Utc::now().timestamp();
    let test_tx = Transaction {
        hash: format!("0xtest{now:x}"),
        block_number: 0,
        block_hash: None,
        from_address: "0x000000000000000000000000000000000000dead".to_string(),
        to_address: None,
        value: "0".to_string(),
        gas_used: "21000".to_string(),
        gas_price: "1".to_string(),
        timestamp: now,
        transaction_index: 0,
        status: 1,
        is_contract_creation: false,
        contract_address: None,
    };

    println!("Adding test transaction...");
    let mut conn = pool.begin().await?;
    wallet::upsert_seen(&mut conn, &test_tx.from_address, now).await?;
    let inserted = transaction::insert_transaction(&mut conn, &test_tx).await?;
    if inserted {
        activity::increment(&mut conn, &test_tx.from_address, day_bucket(now)).await?;
    }
    conn.commit().await?;
    println!("✅ Transaction added: {}", inserted);

    let (txs, total) = transaction::get_transactions_from(&pool, &test_tx.from_address, 0, 10).await?;
    println!("Found {} transactions (total count: {})", txs.len(), total);

    println!("Recalculating metrics...");
    MetricsService::new(pool.clone(), config.scoring)
        .recalculate_all_metrics()
        .await?;

    if let Some(stored) = wallet::get_wallet(&pool, &test_tx.from_address).await? {
        println!(
            "✅ {}: score {} rank {:?} ({} txs over {} days)",
            stored.address, stored.arc_score, stored.rank, stored.total_transactions, stored.active_days
        );
    }

    let stats = network_stats::get_stats(&pool).await?;
    println!(
        "✅ Network: {} wallets, {} transactions, median {}",
        stats.total_wallets, stats.total_transactions, stats.median_transactions_per_wallet
    );

    println!("All tests completed successfully!");
    Ok(())
}
