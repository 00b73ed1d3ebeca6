
mod cache_tests;
mod ingestion_tests;

use crate::db::connection;
use crate::state::AppState;
use mock_chain::{test_config, MockChain};
use std::sync::Arc;

/// Fresh in-memory database and a mock chain at `height`.
pub async fn setup(height: u64, batch_size: u64) -> (Arc<MockChain>, AppState<MockChain>) {
    let db_pool = connection::in_memory().await.expect("Failed to create in-memory database");
    let chain = Arc::new(MockChain::new(height));
    let state = AppState::new(test_config(batch_size), db_pool, chain.clone());
    (chain, state)
}
