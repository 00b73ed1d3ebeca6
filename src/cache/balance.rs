//! Balance lookup cache implementation using Moka

use std::time::Duration;
use moka::future::Cache;
use super::keys::CacheKey;
use tracing::debug;

/// Short-lived cache in front of balance lookups against the chain node.
#[derive(Clone)]
pub struct BalanceCacheManager {
    cache: Cache<CacheKey, String>,
}

impl BalanceCacheManager {
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(ttl)
            .support_invalidation_closures()
            .build();

        Self { cache }
    }

    pub async fn get(&self, key: &CacheKey) -> Option<String> {
        let result = self.cache.get(key).await;
        if result.is_some() {
            debug!("Cache hit for key: {}", key);
        } else {
            debug!("Cache miss for key: {}", key);
        }
        result
    }

    pub async fn insert(&self, key: CacheKey, value: String) {
        self.cache.insert(key, value).await;
    }

    /// Drop every cached balance of a wallet
    pub async fn invalidate_wallet(&self, wallet: &str) {
        let wallet_owned = wallet.to_lowercase();

        // Moka doesn't have direct pattern invalidation, so we use a predicate
        if let Err(e) = self
            .cache
            .invalidate_entries_if(move |k, _| k.wallet() == Some(wallet_owned.as_str()))
        {
            debug!("Could not invalidate cached balances for {}: {}", wallet, e);
            return;
        }

        debug!("Invalidated cached balances for wallet: {}", wallet);
    }
}
