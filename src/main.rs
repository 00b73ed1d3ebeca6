// Load configuration
// Set up logging
// Create database connection pool
// Build the chain client and shared state
// Either run one job on demand, or run both schedules until Ctrl-C

use arc_score_indexer::{
    blockchain::{self, EvmClient},
    config::Config,
    db, jobs,
    state::AppState,
};

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting arc-score-indexer");

    let config = Config::from_env();
    tracing::info!("Configuration loaded: {:?}", config);

    let db_pool = db::connection::establish_connection(&config.database_url).await?;
    let client = Arc::new(EvmClient::new(&config)?);
    let state = Arc::new(AppState::new(config, db_pool, client));

    // `arc-score-indexer run <indexer|metrics|network-stats>`
    let args: Vec<String> = std::env::args().skip(1).collect();
    if let [command, job] = args.as_slice() {
        if command == "run" {
            let job: jobs::Job = job.parse()?;
            let outcome = jobs::run_job(&state, job).await?;
            tracing::info!("Job {} finished: {:?}", job, outcome);
            return Ok(());
        }
    }
    if !args.is_empty() {
        return Err("usage: arc-score-indexer [run <indexer|metrics|network-stats>]".into());
    }

    let shutdown = CancellationToken::new();

    let indexer_handle = tokio::spawn(blockchain::start_indexer_polling(state.clone(), shutdown.clone()));
    let metrics_handle = tokio::spawn(blockchain::start_metrics_polling(state.clone(), shutdown.clone()));
    tracing::info!("Indexer and metrics schedules started");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");
    shutdown.cancel();

    let _ = indexer_handle.await;
    let _ = metrics_handle.await;

    state.db_pool.close().await;
    tracing::info!("Stopped");
    Ok(())
}
