//! Balance cache in front of the chain node

#[cfg(test)]
mod tests {
    use crate::cache::{BalanceCacheManager, CacheKey};
    use crate::tests::mock_chain::TOKEN;
    use crate::tests::setup;
    use std::time::Duration;

    const WALLET: &str = "0x4444444444444444444444444444444444444444";
    const OTHER: &str = "0x5555555555555555555555555555555555555555";

    #[test]
    fn test_cache_key_format() {
        let mixed = "0xABCDEF0000000000000000000000000000000000";

        assert_eq!(
            CacheKey::native_balance(mixed).to_string(),
            "native:0xabcdef0000000000000000000000000000000000"
        );
        assert_eq!(
            CacheKey::token_balance(TOKEN, mixed).to_string(),
            format!("token:{}:0xabcdef0000000000000000000000000000000000", TOKEN)
        );
        assert_eq!(CacheKey::token_decimals(TOKEN).to_string(), format!("decimals:{}", TOKEN));

        assert_eq!(CacheKey::native_balance(mixed), CacheKey::native_balance(&mixed.to_lowercase()));
        assert_eq!(CacheKey::token_decimals(TOKEN).wallet(), None);
    }

    #[tokio::test]
    async fn test_balance_cache_insert_and_get() {
        let cache = BalanceCacheManager::new(100, Duration::from_secs(60));
        let key = CacheKey::native_balance(WALLET);

        assert_eq!(cache.get(&key).await, None);

        cache.insert(key.clone(), "42".to_string()).await;
        assert_eq!(cache.get(&key).await.as_deref(), Some("42"));
    }

    #[tokio::test]
    async fn test_balance_cache_expires() {
        let cache = BalanceCacheManager::new(100, Duration::from_millis(50));
        let key = CacheKey::native_balance(WALLET);

        cache.insert(key.clone(), "42".to_string()).await;
        tokio::time::sleep(Duration::from_millis(120)).await;

        assert_eq!(cache.get(&key).await, None);
    }

    #[tokio::test]
    async fn test_invalidate_wallet_keeps_other_entries() {
        let cache = BalanceCacheManager::new(100, Duration::from_secs(60));
        cache.insert(CacheKey::native_balance(WALLET), "1".to_string()).await;
        cache.insert(CacheKey::token_balance(TOKEN, WALLET), "2".to_string()).await;
        cache.insert(CacheKey::native_balance(OTHER), "3".to_string()).await;
        cache.insert(CacheKey::token_decimals(TOKEN), "6".to_string()).await;

        cache.invalidate_wallet(&WALLET.to_uppercase().replacen("0X", "0x", 1)).await;

        assert_eq!(cache.get(&CacheKey::native_balance(WALLET)).await, None);
        assert_eq!(cache.get(&CacheKey::token_balance(TOKEN, WALLET)).await, None);
        assert_eq!(cache.get(&CacheKey::native_balance(OTHER)).await.as_deref(), Some("3"));
        assert_eq!(cache.get(&CacheKey::token_decimals(TOKEN)).await.as_deref(), Some("6"));
    }

    #[tokio::test]
    async fn test_overview_balances_are_cached() {
        let (chain, state) = setup(0, 100).await;
        chain.set_balance(WALLET, "100", "7");

        let first = state.wallets.balances(WALLET).await;
        chain.set_balance(WALLET, "200", "8");
        let second = state.wallets.balances(WALLET).await;

        assert_eq!(first, second);
        assert_eq!(second.native, "100");
        assert_eq!(chain.balance_calls(), 1);

        state.wallets.invalidate_balances(WALLET).await;
        let refreshed = state.wallets.balances(WALLET).await;

        assert_eq!(refreshed.native, "200");
        assert_eq!(refreshed.token, "8");
        assert_eq!(chain.balance_calls(), 2);
    }

    #[tokio::test]
    async fn test_failed_balance_lookup_is_not_cached() {
        let (chain, state) = setup(0, 100).await;
        chain.set_balance(WALLET, "100", "7");
        chain.set_balances_unavailable(true);

        let failed = state.wallets.balances(WALLET).await;

        assert_eq!(failed.native, "0");
        assert_eq!(failed.token, "0");
        assert_eq!(chain.balance_calls(), 1);

        chain.set_balances_unavailable(false);
        let recovered = state.wallets.balances(WALLET).await;

        assert_eq!(recovered.native, "100");
        assert_eq!(recovered.token, "7");
        assert_eq!(recovered.token_decimals, 6);
        assert_eq!(chain.balance_calls(), 2);
    }
}
