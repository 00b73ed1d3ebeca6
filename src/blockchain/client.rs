use crate::blockchain::models::{Block, Receipt, RpcBlock, RpcReceipt, RpcRequest, RpcResponse};
use crate::config::Config;
use crate::validation::to_checksum_address;
use alloy_primitives::{U256, U64};
use backon::{ExponentialBuilder, Retryable};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::future::Future;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// `balanceOf(address)`
const BALANCE_OF_SELECTOR: &str = "70a08231";
/// `decimals()`
const DECIMALS_SELECTOR: &str = "313ce567";
/// Decimals assumed when a token does not answer `decimals()` (USDC).
pub const DEFAULT_TOKEN_DECIMALS: u8 = 6;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Invalid RPC response: {0}")]
    InvalidResponse(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}

impl ClientError {
    /// Network-level failures worth retrying. RPC error objects and malformed
    /// payloads will come back the same way on a second attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::Transport(e) => {
                e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error() || s.as_u16() == 429)
            }
            _ => false,
        }
    }
}

/// Read-only view of the remote chain node.
///
/// `get_block` and `get_receipt` report "not produced yet" as `Ok(None)`.
/// The `try_*` balance lookups surface errors; `get_balance`,
/// `get_token_balance` and `token_decimals` never fail: any error is logged
/// and reported as `"0"` (or the default decimals).
pub trait ChainClient: Send + Sync {
    fn current_height(&self) -> impl Future<Output = Result<u64, ClientError>> + Send;

    fn get_block(&self, number: u64) -> impl Future<Output = Result<Option<Block>, ClientError>> + Send;

    fn get_receipt(&self, tx_hash: &str) -> impl Future<Output = Result<Option<Receipt>, ClientError>> + Send;

    fn try_balance(&self, address: &str) -> impl Future<Output = Result<String, ClientError>> + Send;

    fn try_token_balance(
        &self,
        token_address: &str,
        wallet_address: &str,
    ) -> impl Future<Output = Result<String, ClientError>> + Send;

    fn try_token_decimals(&self, token_address: &str) -> impl Future<Output = Result<u8, ClientError>> + Send;

    fn get_balance(&self, address: &str) -> impl Future<Output = String> + Send {
        async move {
            self.try_balance(address).await.unwrap_or_else(|e| {
                warn!("Error getting balance for {}: {}", address, e);
                "0".to_string()
            })
        }
    }

    fn get_token_balance(&self, token_address: &str, wallet_address: &str) -> impl Future<Output = String> + Send {
        async move {
            self.try_token_balance(token_address, wallet_address)
                .await
                .unwrap_or_else(|e| {
                    warn!(
                        "Error getting token balance for {} on {}: {}",
                        wallet_address, token_address, e
                    );
                    "0".to_string()
                })
        }
    }

    fn token_decimals(&self, token_address: &str) -> impl Future<Output = u8> + Send {
        async move {
            self.try_token_decimals(token_address).await.unwrap_or_else(|e| {
                warn!(
                    "Error getting decimals for token {}, defaulting to {}: {}",
                    token_address, DEFAULT_TOKEN_DECIMALS, e
                );
                DEFAULT_TOKEN_DECIMALS
            })
        }
    }
}

/// The forms an address is tried in, in order: checksummed first, then exactly
/// as given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressForm {
    Checksummed(String),
    Raw(String),
}

impl AddressForm {
    pub fn as_str(&self) -> &str {
        match self {
            AddressForm::Checksummed(a) | AddressForm::Raw(a) => a,
        }
    }
}

pub fn address_attempts(address: &str) -> Vec<AddressForm> {
    let mut attempts = Vec::with_capacity(2);
    if let Ok(checksummed) = to_checksum_address(address) {
        attempts.push(AddressForm::Checksummed(checksummed));
    }
    if attempts.first().map(AddressForm::as_str) != Some(address) {
        attempts.push(AddressForm::Raw(address.to_string()));
    }
    attempts
}

/// Run `call` with each form of `address` from [`address_attempts`] until one
/// succeeds. Returns the last error if every attempt fails.
pub async fn with_address_fallback<T, F, Fut>(address: &str, mut call: F) -> Result<T, ClientError>
where
    F: FnMut(AddressForm) -> Fut,
    Fut: Future<Output = Result<T, ClientError>>,
{
    let mut last_error = ClientError::InvalidAddress(address.to_string());

    for form in address_attempts(address) {
        match call(form.clone()).await {
            Ok(value) => return Ok(value),
            Err(e) => {
                debug!("Attempt with {:?} failed: {}", form, e);
                last_error = e;
            }
        }
    }

    Err(last_error)
}

/// ABI-encode `balanceOf(owner)`. The owner word is the address hex left-padded
/// to 32 bytes.
pub fn encode_balance_of(owner: &str) -> Result<String, ClientError> {
    let body = owner
        .trim()
        .strip_prefix("0x")
        .or_else(|| owner.trim().strip_prefix("0X"))
        .unwrap_or(owner.trim());

    if body.is_empty() || body.len() > 64 || !body.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ClientError::InvalidAddress(owner.to_string()));
    }

    Ok(format!("0x{BALANCE_OF_SELECTOR}{:0>64}", body.to_lowercase()))
}

/// Decode a single `uint256` return word.
pub fn decode_uint256(data: &str) -> Result<U256, ClientError> {
    let body = data.strip_prefix("0x").unwrap_or(data);
    if body.is_empty() {
        // Calls to an address without code return empty data.
        return Err(ClientError::InvalidResponse("empty call result".to_string()));
    }
    U256::from_str_radix(body, 16).map_err(|e| ClientError::InvalidResponse(e.to_string()))
}

pub struct EvmClient {
    http: reqwest::Client,
    rpc_url: String,
    next_id: AtomicU64,
    max_retries: usize,
    limiter: Option<DefaultDirectRateLimiter>,
}

impl EvmClient {
    pub fn new(config: &Config) -> Result<Self, ClientError> {
        let timeout = Duration::from_secs(config.rpc_timeout_secs);
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        let limiter = config
            .rpc_rate_limit
            .and_then(NonZeroU32::new)
            .map(|rate| RateLimiter::direct(Quota::per_second(rate)));

        info!(
            "Initializing chain client with RPC endpoint: {}, timeout: {:?}, rate limit: {:?}",
            config.rpc_url, timeout, config.rpc_rate_limit
        );

        Ok(Self {
            http,
            rpc_url: config.rpc_url.clone(),
            next_id: AtomicU64::new(1),
            max_retries: config.rpc_max_retries,
            limiter,
        })
    }

    async fn send<T: DeserializeOwned>(&self, method: &str, params: &serde_json::Value) -> Result<Option<T>, ClientError> {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }

        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params: params.clone(),
        };

        let response: RpcResponse<T> = self
            .http
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(error) = response.error {
            return Err(ClientError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        Ok(response.result)
    }

    /// One JSON-RPC call, retried with exponential backoff on transient transport errors.
    async fn call<T: DeserializeOwned>(&self, method: &str, params: serde_json::Value) -> Result<Option<T>, ClientError> {
        (|| self.send::<T>(method, &params))
            .retry(ExponentialBuilder::default().with_max_times(self.max_retries))
            .when(ClientError::is_transient)
            .notify(|e, after| debug!("Retrying {} after {:?}: {}", method, after, e))
            .await
    }

    async fn eth_call(&self, to: &str, data: &str) -> Result<String, ClientError> {
        self.call::<String>("eth_call", json!([{ "to": to, "data": data }, "latest"]))
            .await?
            .ok_or_else(|| ClientError::InvalidResponse("eth_call returned null".to_string()))
    }
}

fn block_tag(number: u64) -> String {
    format!("0x{number:x}")
}

impl ChainClient for EvmClient {
    async fn current_height(&self) -> Result<u64, ClientError> {
        let height: U64 = self
            .call("eth_blockNumber", json!([]))
            .await?
            .ok_or_else(|| ClientError::InvalidResponse("eth_blockNumber returned null".to_string()))?;
        Ok(height.to::<u64>())
    }

    async fn get_block(&self, number: u64) -> Result<Option<Block>, ClientError> {
        let block: Option<RpcBlock> = self
            .call("eth_getBlockByNumber", json!([block_tag(number), true]))
            .await?;
        Ok(block.map(Block::from))
    }

    async fn get_receipt(&self, tx_hash: &str) -> Result<Option<Receipt>, ClientError> {
        let receipt: Option<RpcReceipt> = self
            .call("eth_getTransactionReceipt", json!([tx_hash]))
            .await?;
        Ok(receipt.map(Receipt::from))
    }

    async fn try_balance(&self, address: &str) -> Result<String, ClientError> {
        let balance: Option<U256> = self.call("eth_getBalance", json!([address, "latest"])).await?;
        Ok(balance.unwrap_or_default().to_string())
    }

    async fn try_token_balance(&self, token_address: &str, wallet_address: &str) -> Result<String, ClientError> {
        let token = address_attempts(token_address)
            .into_iter()
            .next()
            .ok_or_else(|| ClientError::InvalidAddress(token_address.to_string()))?;

        with_address_fallback(wallet_address, |owner| {
            let token = token.clone();
            async move {
                let data = encode_balance_of(owner.as_str())?;
                let result = self.eth_call(token.as_str(), &data).await?;
                Ok(decode_uint256(&result)?.to_string())
            }
        })
        .await
    }

    async fn try_token_decimals(&self, token_address: &str) -> Result<u8, ClientError> {
        let result = self.eth_call(token_address, &format!("0x{DECIMALS_SELECTOR}")).await?;
        let decimals = decode_uint256(&result)?;

        if decimals > U256::from(u8::MAX) {
            return Err(ClientError::InvalidResponse(format!(
                "token {} reported {} decimals",
                token_address, decimals
            )));
        }
        Ok(decimals.to::<u8>())
    }
}
