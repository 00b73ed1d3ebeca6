pub mod blockchain;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod jobs;
pub mod models;
pub mod scoring;
pub mod state;
pub mod validation;

#[cfg(test)]
pub mod tests;

// Re-export specific items for convenience
pub use blockchain::indexer::{CycleOutcome, CycleReport};
pub use error::ServiceError;
pub use jobs::{run_job, Job};
pub use models::{NetworkStats, Transaction, Wallet, WalletOverview};
pub use scoring::MetricsService;
pub use state::AppState;
