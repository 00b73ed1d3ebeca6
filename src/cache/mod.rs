pub mod balance;
pub mod keys;

pub use balance::BalanceCacheManager;
pub use keys::CacheKey;

use crate::config::Config;

pub fn init_cache(config: &Config) -> BalanceCacheManager {
    BalanceCacheManager::new(config.balance_cache_max_capacity, config.balance_cache_ttl)
}
