pub mod client;
pub mod indexer;
pub mod models;
pub mod polling;
pub mod processor;

// Re-exports for convenience
pub use client::{ChainClient, EvmClient};
pub use indexer::Indexer;
pub use polling::{start_indexer_polling, start_metrics_polling};
