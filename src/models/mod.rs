// Stored entities and the read-side views built from them.
// Timestamps are unix seconds; `day` values are UTC midnights.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const SECONDS_PER_DAY: i64 = 86_400;

/// Truncate a unix timestamp to the UTC midnight of its day.
pub fn day_bucket(timestamp: i64) -> i64 {
    timestamp.div_euclid(SECONDS_PER_DAY) * SECONDS_PER_DAY
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    pub address: String,
    pub first_seen_at: i64,
    pub last_seen_at: i64,
    pub total_transactions: i64,
    pub active_days: i64,
    pub arc_score: f64,
    pub rank: Option<i64>,
    pub percentile: Option<f64>,
    pub status: String,
}

impl Wallet {
    /// A wallet that has never been through a scoring pass.
    pub fn needs_scoring(&self) -> bool {
        self.arc_score == 0.0 || self.rank.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub hash: String,
    pub block_number: i64,
    pub block_hash: Option<String>,
    pub from_address: String,
    pub to_address: Option<String>,
    pub value: String,
    pub gas_used: String,
    pub gas_price: String,
    pub timestamp: i64,
    pub transaction_index: i64,
    pub status: i64,
    pub is_contract_creation: bool,
    pub contract_address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DailyActivity {
    pub wallet_address: String,
    pub day: i64,
    pub transaction_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct IndexerState {
    pub last_block_number: i64,
    pub last_block_hash: Option<String>,
    pub is_running: bool,
    pub last_run_at: Option<i64>,
    pub error_message: Option<String>,
    pub lease_owner: Option<String>,
    pub lease_expires_at: Option<i64>,
}

/// Observable run state of the indexer, derived from the cursor row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunState {
    Idle,
    Running,
    Failed,
}

impl IndexerState {
    pub fn run_state(&self) -> RunState {
        if self.is_running {
            RunState::Running
        } else if self.error_message.is_some() {
            RunState::Failed
        } else {
            RunState::Idle
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct NetworkStats {
    pub total_wallets: i64,
    pub total_transactions: i64,
    pub total_active_wallets: i64,
    pub avg_transactions_per_wallet: f64,
    pub median_transactions_per_wallet: f64,
    pub last_processed_block: i64,
    pub last_updated: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Balances {
    pub native: String,
    pub token: String,
    pub token_decimals: u8,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletOverview {
    pub address: String,
    pub arc_score: f64,
    pub rank: Option<i64>,
    pub percentile: Option<f64>,
    pub total_transactions: i64,
    pub active_days: i64,
    pub first_seen_at: Option<i64>,
    pub last_seen_at: Option<i64>,
    pub status: String,
    pub recent_transactions: Vec<Transaction>,
    pub activity_data: Vec<DailyActivity>,
    pub balance: Balances,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: Option<i64>,
    #[serde(rename = "wallet")]
    pub address: String,
    #[serde(rename = "score")]
    pub arc_score: f64,
    pub percentile: Option<f64>,
    pub total_transactions: i64,
    pub active_days: i64,
    pub status: String,
}

// Paged responses
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub meta: Meta,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    pub total: i64,
    pub offset: i64,
    pub limit: i64,
    pub has_more: bool,
}

impl Meta {
    pub fn new(total: i64, offset: i64, limit: i64) -> Self {
        Self {
            total,
            offset,
            limit,
            has_more: offset + limit < total,
        }
    }
}
