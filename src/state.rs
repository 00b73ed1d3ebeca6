use crate::blockchain::client::{ChainClient, EvmClient};
use crate::blockchain::indexer::Indexer;
use crate::cache;
use crate::config::Config;
use crate::scoring::overview::WalletService;
use crate::scoring::MetricsService;
use sqlx::SqlitePool;
use std::sync::Arc;

/// Services built once at startup and shared by every trigger.
pub struct AppState<C = EvmClient> {
    pub config: Config,
    pub db_pool: SqlitePool,
    pub indexer: Indexer<C>,
    pub metrics: MetricsService,
    pub wallets: WalletService<C>,
}

impl<C: ChainClient> AppState<C> {
    pub fn new(config: Config, db_pool: SqlitePool, client: Arc<C>) -> Self {
        let metrics = MetricsService::new(db_pool.clone(), config.scoring);
        let indexer = Indexer::new(client.clone(), db_pool.clone(), config.indexer.clone());
        let wallets = WalletService::new(
            client,
            metrics.clone(),
            cache::init_cache(&config),
            config.token_address.clone(),
        );

        Self {
            config,
            db_pool,
            indexer,
            metrics,
            wallets,
        }
    }
}
