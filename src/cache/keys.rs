//! Cache key generation

use std::fmt;

/// A structured cache key that can be converted to a string
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Native balance of a wallet
    NativeBalance(String),
    /// Token balance of a wallet on a token contract
    TokenBalance { token: String, wallet: String },
    /// Decimals of a token contract
    TokenDecimals(String),
}

impl CacheKey {
    pub fn native_balance(wallet: &str) -> Self {
        Self::NativeBalance(wallet.to_lowercase())
    }

    pub fn token_balance(token: &str, wallet: &str) -> Self {
        Self::TokenBalance {
            token: token.to_lowercase(),
            wallet: wallet.to_lowercase(),
        }
    }

    pub fn token_decimals(token: &str) -> Self {
        Self::TokenDecimals(token.to_lowercase())
    }

    /// The wallet a key belongs to, if any (for per-wallet invalidation)
    pub fn wallet(&self) -> Option<&str> {
        match self {
            Self::NativeBalance(wallet) => Some(wallet),
            Self::TokenBalance { wallet, .. } => Some(wallet),
            Self::TokenDecimals(_) => None,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NativeBalance(wallet) => write!(f, "native:{}", wallet),
            Self::TokenBalance { token, wallet } => write!(f, "token:{}:{}", token, wallet),
            Self::TokenDecimals(token) => write!(f, "decimals:{}", token),
        }
    }
}
