use crate::blockchain::client::ClientError;
use crate::validation::ValidationError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("RPC unavailable: {0}")]
    RpcUnavailable(#[from] ClientError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid address: {0}")]
    InvalidAddress(#[from] ValidationError),

    #[error("Run lease lost by {0}")]
    LeaseLost(String),

    #[error("Unknown job: {0}. Must be 'indexer', 'metrics' or 'network-stats'")]
    InvalidJob(String),
}
