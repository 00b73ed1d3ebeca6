// Configuration for the indexer process:
// - RPC endpoint URL and client limits
// - Database connection string
// - Indexer schedule, batch size, start block and run lease
// - Scoring tunables
// - Balance cache settings

use dotenv::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// USDC on the Arc testnet, the default token for balance lookups.
pub const DEFAULT_TOKEN_ADDRESS: &str = "0x3600000000000000000000000000000000000000";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub rpc_url: String,
    pub rpc_timeout_secs: u64,
    pub rpc_rate_limit: Option<u32>,
    pub rpc_max_retries: usize,
    pub indexer: IndexerConfig,
    pub scoring: ScoringConfig,
    pub metrics_interval: Duration,
    pub token_address: String,
    pub balance_cache_ttl: Duration,
    pub balance_cache_max_capacity: u64,
}

#[derive(Debug, Clone)]
pub struct IndexerConfig {
    pub enabled: bool,
    pub batch_size: u64,
    pub start_block: u64,
    pub interval: Duration,
    pub lease_ttl: Duration,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            batch_size: 100,
            start_block: 0,
            interval: Duration::from_secs(30),
            lease_ttl: Duration::from_secs(600),
        }
    }
}

/// Coefficients of the ARC score: `min(max_score, txs * tx_weight + days * day_weight)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringConfig {
    pub tx_weight: f64,
    pub day_weight: f64,
    pub max_score: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            tx_weight: 0.1,
            day_weight: 2.0,
            max_score: 100.0,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:arc_score.db".to_string());
        let rpc_url = env::var("ARC_RPC_URL")
            .unwrap_or_else(|_| "https://rpc.testnet.arc.network".to_string());
        let rpc_timeout_secs = parse_var("RPC_TIMEOUT_SECS", 30);
        let rpc_rate_limit = env::var("RPC_RATE_LIMIT")
            .map(|v| v.parse().ok())
            .unwrap_or(None);
        let rpc_max_retries = parse_var("RPC_MAX_RETRIES", 2);

        let indexer = IndexerConfig {
            // Anything but the literal "true" keeps the indexer off.
            enabled: env::var("INDEXER_ENABLED").map(|v| v == "true").unwrap_or(false),
            batch_size: parse_var("INDEXER_BATCH_SIZE", 100u64).max(1),
            start_block: parse_var("INDEXER_START_BLOCK", 0),
            interval: Duration::from_secs(parse_var("INDEXER_INTERVAL_SECS", 30)),
            lease_ttl: Duration::from_secs(parse_var("INDEXER_LEASE_SECS", 600)),
        };

        let defaults = ScoringConfig::default();
        let scoring = ScoringConfig {
            tx_weight: parse_var("ARC_SCORE_TX_WEIGHT", defaults.tx_weight),
            day_weight: parse_var("ARC_SCORE_DAY_WEIGHT", defaults.day_weight),
            max_score: parse_var("ARC_SCORE_MAX", defaults.max_score),
        };

        let metrics_interval = Duration::from_secs(parse_var("METRICS_INTERVAL_SECS", 300));
        let token_address = env::var("TOKEN_ADDRESS").unwrap_or_else(|_| DEFAULT_TOKEN_ADDRESS.to_string());
        let balance_cache_ttl = Duration::from_secs(parse_var("BALANCE_CACHE_TTL", 30));
        let balance_cache_max_capacity = parse_var("BALANCE_CACHE_MAX_CAPACITY", 10_000);

        Self {
            database_url,
            rpc_url,
            rpc_timeout_secs,
            rpc_rate_limit,
            rpc_max_retries,
            indexer,
            scoring,
            metrics_interval,
            token_address,
            balance_cache_ttl,
            balance_cache_max_capacity,
        }
    }
}

fn parse_var<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
