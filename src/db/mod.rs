pub mod activity;
pub mod connection;
pub mod indexer_state;
pub mod network_stats;
pub mod transaction;
pub mod wallet;

pub const INIT_SCHEMA: &str = r#"
-- Wallets seen as transaction senders
CREATE TABLE IF NOT EXISTS wallets (
    address TEXT PRIMARY KEY,
    first_seen_at INTEGER NOT NULL,
    last_seen_at INTEGER NOT NULL,
    total_transactions INTEGER NOT NULL DEFAULT 0,
    active_days INTEGER NOT NULL DEFAULT 0,
    arc_score REAL NOT NULL DEFAULT 0,
    rank INTEGER,
    percentile REAL,
    status TEXT NOT NULL DEFAULT 'active'
);

-- Ingested transactions, unique by hash
CREATE TABLE IF NOT EXISTS transactions (
    hash TEXT PRIMARY KEY,
    block_number INTEGER NOT NULL,
    block_hash TEXT,
    from_address TEXT NOT NULL,
    to_address TEXT,
    value TEXT NOT NULL,
    gas_used TEXT NOT NULL,
    gas_price TEXT NOT NULL,
    timestamp INTEGER NOT NULL,
    transaction_index INTEGER NOT NULL,
    status INTEGER NOT NULL DEFAULT 1,
    is_contract_creation BOOLEAN NOT NULL DEFAULT 0,
    contract_address TEXT,
    FOREIGN KEY (from_address) REFERENCES wallets(address)
);

-- One row per wallet per UTC day
CREATE TABLE IF NOT EXISTS daily_activity (
    wallet_address TEXT NOT NULL,
    day INTEGER NOT NULL,
    transaction_count INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (wallet_address, day),
    FOREIGN KEY (wallet_address) REFERENCES wallets(address)
);

-- Cursor store singleton
CREATE TABLE IF NOT EXISTS indexer_state (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    last_block_number INTEGER NOT NULL DEFAULT 0,
    last_block_hash TEXT,
    is_running BOOLEAN NOT NULL DEFAULT 0,
    last_run_at INTEGER,
    error_message TEXT,
    lease_owner TEXT,
    lease_expires_at INTEGER
);

-- Network aggregate singleton
CREATE TABLE IF NOT EXISTS network_stats (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    total_wallets INTEGER NOT NULL DEFAULT 0,
    total_transactions INTEGER NOT NULL DEFAULT 0,
    total_active_wallets INTEGER NOT NULL DEFAULT 0,
    avg_transactions_per_wallet REAL NOT NULL DEFAULT 0,
    median_transactions_per_wallet REAL NOT NULL DEFAULT 0,
    last_processed_block INTEGER NOT NULL DEFAULT 0,
    last_updated INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_transactions_from_time ON transactions(from_address, timestamp);
CREATE INDEX IF NOT EXISTS idx_transactions_block ON transactions(block_number);
CREATE INDEX IF NOT EXISTS idx_wallets_score ON wallets(arc_score DESC);
CREATE INDEX IF NOT EXISTS idx_wallets_rank ON wallets(rank);
"#;
