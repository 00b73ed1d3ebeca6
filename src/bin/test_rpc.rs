use arc_score_indexer::{
    blockchain::{
        client::{ChainClient, EvmClient},
        models::extract_transaction,
    },
    config::Config,
    validation::to_checksum_address,
};
use tracing::{error, info, warn, Level};

/// Smoke test against the configured node: height, the latest block with its
/// receipts, and balance lookups for the first sender found.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = Config::from_env();
    info!("Testing RPC node at {}", config.rpc_url);
    let client = EvmClient::new(&config)?;

    let height = client.current_height().await?;
    info!("✅ Current block height: {}", height);

    let Some(block) = client.get_block(height).await? else {
        warn!("Block {} not returned yet", height);
        return Ok(());
    };
    info!(
        "✅ Block {} ({:?}) at {} with {} transactions",
        block.number,
        block.hash,
        block.timestamp,
        block.transactions.len()
    );

    let mut sender = None;
    for tx in block.transactions.iter().take(5) {
        match client.get_receipt(&tx.hash).await {
            Ok(Some(receipt)) => match extract_transaction(&block, tx, &receipt) {
                Some(record) => {
                    info!(
                        "   {} from {} status {} gas {}",
                        record.hash, record.from_address, record.status, record.gas_used
                    );
                    sender.get_or_insert(record.from_address);
                }
                None => warn!("   {} has no sender", tx.hash),
            },
            Ok(None) => warn!("   No receipt yet for {}", tx.hash),
            Err(e) => error!("❌ Receipt lookup failed for {}: {}", tx.hash, e),
        }
    }

    let Some(address) = sender else {
        info!("No senders in the latest block, skipping balance checks");
        return Ok(());
    };

    info!("Checksummed sender: {}", to_checksum_address(&address)?);
    let native = client.get_balance(&address).await;
    let token = client.get_token_balance(&config.token_address, &address).await;
    let decimals = client.token_decimals(&config.token_address).await;
    info!("✅ Balances: native {} / token {} ({} decimals)", native, token, decimals);

    Ok(())
}
