// Read-side queries handed to the request layer: wallet overview with live
// balances, a wallet's sent transactions, the leaderboard and network stats.

use crate::blockchain::client::{ChainClient, ClientError, DEFAULT_TOKEN_DECIMALS};
use crate::cache::{BalanceCacheManager, CacheKey};
use crate::db::{activity, network_stats, transaction, wallet};
use crate::error::ServiceError;
use crate::models::{Balances, LeaderboardEntry, Meta, NetworkStats, Page, Transaction, WalletOverview};
use crate::scoring::MetricsService;
use crate::validation::{normalize_address, validate_address};
use std::sync::Arc;
use tracing::{debug, error, warn};

const RECENT_TRANSACTIONS: i64 = 10;
const ACTIVITY_DAYS: i64 = 30;
pub const MAX_PAGE_SIZE: i64 = 1000;

pub struct WalletService<C> {
    client: Arc<C>,
    metrics: MetricsService,
    balance_cache: BalanceCacheManager,
    token_address: String,
}

impl<C: ChainClient> WalletService<C> {
    pub fn new(
        client: Arc<C>,
        metrics: MetricsService,
        balance_cache: BalanceCacheManager,
        token_address: String,
    ) -> Self {
        Self {
            client,
            metrics,
            balance_cache,
            token_address,
        }
    }

    /// Overview of a wallet. A wallet that has never been scored is scored first.
    /// Addresses that were never seen on chain get zeroed metrics; no row is created.
    pub async fn get_wallet_overview(&self, address: &str) -> Result<WalletOverview, ServiceError> {
        validate_address(address)?;
        let address = normalize_address(address);
        let db_pool = self.metrics.pool();

        let mut stored = wallet::get_wallet(db_pool, &address).await?;

        if stored.as_ref().is_some_and(|w| w.needs_scoring()) {
            debug!("Scoring wallet {} on demand", address);
            if let Err(e) = self.metrics.score_wallet(&address).await {
                error!("On-demand scoring failed for {}: {}", address, e);
            }
            stored = wallet::get_wallet(db_pool, &address).await?;
        }

        let (recent_transactions, total_transactions) =
            transaction::get_transactions_from(db_pool, &address, 0, RECENT_TRANSACTIONS).await?;
        let activity_data = activity::get_recent(db_pool, &address, ACTIVITY_DAYS).await?;
        let active_days = activity::count_active_days(db_pool, &address).await?;
        let balance = self.balances(&address).await;

        Ok(WalletOverview {
            address: address.clone(),
            arc_score: stored.as_ref().map(|w| w.arc_score).unwrap_or(0.0),
            rank: stored.as_ref().and_then(|w| w.rank),
            percentile: stored.as_ref().and_then(|w| w.percentile),
            total_transactions,
            active_days,
            first_seen_at: stored.as_ref().map(|w| w.first_seen_at),
            last_seen_at: stored.as_ref().map(|w| w.last_seen_at),
            status: stored.map(|w| w.status).unwrap_or_else(|| "active".to_string()),
            recent_transactions,
            activity_data,
            balance,
        })
    }

    /// Native and token balances. Lookups never fail; a failed one reads as
    /// `"0"` and is not cached.
    pub async fn balances(&self, address: &str) -> Balances {
        let native_key = CacheKey::native_balance(address);
        let token_key = CacheKey::token_balance(&self.token_address, address);
        let decimals_key = CacheKey::token_decimals(&self.token_address);

        let (native, token, decimals) = tokio::join!(
            self.cached(native_key, "0", self.client.try_balance(address)),
            self.cached(
                token_key,
                "0",
                self.client.try_token_balance(&self.token_address, address)
            ),
            self.cached(decimals_key, "", async {
                self.client
                    .try_token_decimals(&self.token_address)
                    .await
                    .map(|d| d.to_string())
            }),
        );

        Balances {
            native,
            token,
            token_decimals: decimals.parse().unwrap_or(DEFAULT_TOKEN_DECIMALS),
        }
    }

    pub async fn invalidate_balances(&self, address: &str) {
        self.balance_cache.invalidate_wallet(&normalize_address(address)).await;
    }

    async fn cached(
        &self,
        key: CacheKey,
        fallback: &str,
        lookup: impl std::future::Future<Output = Result<String, ClientError>>,
    ) -> String {
        if let Some(value) = self.balance_cache.get(&key).await {
            return value;
        }

        match lookup.await {
            Ok(value) => {
                self.balance_cache.insert(key, value.clone()).await;
                value
            }
            Err(e) => {
                warn!("Lookup for {} failed, not caching: {}", key, e);
                fallback.to_string()
            }
        }
    }

    pub async fn get_wallet_transactions(
        &self,
        address: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Page<Transaction>, ServiceError> {
        validate_address(address)?;
        let (limit, offset) = clamp_page(limit, offset);

        let (data, total) =
            transaction::get_transactions_from(self.metrics.pool(), &normalize_address(address), offset, limit)
                .await?;

        Ok(Page {
            data,
            meta: Meta::new(total, offset, limit),
        })
    }

    pub async fn count_wallet_transactions(&self, address: &str) -> Result<i64, ServiceError> {
        validate_address(address)?;
        Ok(transaction::count_from(self.metrics.pool(), &normalize_address(address)).await?)
    }

    pub async fn get_leaderboard(&self, limit: i64, offset: i64) -> Result<Page<LeaderboardEntry>, ServiceError> {
        let (limit, offset) = clamp_page(limit, offset);
        let (data, total) = wallet::get_leaderboard(self.metrics.pool(), offset, limit).await?;

        Ok(Page {
            data,
            meta: Meta::new(total, offset, limit),
        })
    }

    pub async fn get_network_stats(&self) -> Result<NetworkStats, ServiceError> {
        Ok(network_stats::get_stats(self.metrics.pool()).await?)
    }
}

fn clamp_page(limit: i64, offset: i64) -> (i64, i64) {
    (limit.clamp(1, MAX_PAGE_SIZE), offset.max(0))
}
