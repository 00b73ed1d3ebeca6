// JSON-RPC wire types for blocks, transactions and receipts, and their
// conversion into the chain-side values the indexer works with.

use alloy_primitives::{U256, U64};
use serde::{Deserialize, Serialize};
use crate::models::{day_bucket, Transaction};
use crate::validation::normalize_address;
use tracing::warn;

#[derive(Debug, Serialize)]
pub struct RpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub params: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct RpcResponse<T> {
    pub result: Option<T>,
    pub error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcBlock {
    pub number: U64,
    pub hash: Option<String>,
    pub timestamp: U64,
    /// Decoded entry by entry when converted into a [`Block`].
    #[serde(default)]
    pub transactions: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcTransaction {
    pub hash: String,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub value: Option<U256>,
    #[serde(default)]
    pub gas_price: Option<U256>,
    #[serde(default)]
    pub transaction_index: Option<U64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcReceipt {
    pub transaction_hash: String,
    #[serde(default)]
    pub transaction_index: Option<U64>,
    #[serde(default)]
    pub gas_used: Option<U256>,
    #[serde(default)]
    pub status: Option<U64>,
    #[serde(default)]
    pub contract_address: Option<String>,
}

/// A block as the indexer sees it, with its transactions in block order.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub number: u64,
    pub hash: Option<String>,
    pub timestamp: i64,
    pub transactions: Vec<ChainTransaction>,
    /// Entries of the block's transaction list that could not be decoded.
    pub malformed_transactions: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChainTransaction {
    pub hash: String,
    pub from: Option<String>,
    pub to: Option<String>,
    pub value: U256,
    pub gas_price: U256,
    pub transaction_index: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Receipt {
    pub transaction_hash: String,
    pub transaction_index: Option<u64>,
    pub gas_used: U256,
    pub status: u64,
    pub contract_address: Option<String>,
}

impl From<RpcBlock> for Block {
    fn from(block: RpcBlock) -> Self {
        let number = block.number.to::<u64>();
        let mut transactions = Vec::with_capacity(block.transactions.len());
        let mut malformed_transactions = 0;

        for (index, raw) in block.transactions.into_iter().enumerate() {
            match serde_json::from_value::<RpcTransaction>(raw) {
                Ok(tx) => transactions.push(ChainTransaction::from(tx)),
                Err(e) => {
                    warn!("Skipping malformed transaction {} of block {}: {}", index, number, e);
                    malformed_transactions += 1;
                }
            }
        }

        Self {
            number,
            hash: block.hash,
            timestamp: block.timestamp.to::<u64>() as i64,
            transactions,
            malformed_transactions,
        }
    }
}

impl From<RpcTransaction> for ChainTransaction {
    fn from(tx: RpcTransaction) -> Self {
        Self {
            hash: tx.hash,
            from: tx.from.filter(|f| !f.trim().is_empty()),
            to: tx.to.filter(|t| !t.trim().is_empty()),
            value: tx.value.unwrap_or_default(),
            gas_price: tx.gas_price.unwrap_or_default(),
            transaction_index: tx.transaction_index.map(|i| i.to::<u64>()),
        }
    }
}

impl From<RpcReceipt> for Receipt {
    fn from(receipt: RpcReceipt) -> Self {
        Self {
            transaction_hash: receipt.transaction_hash,
            transaction_index: receipt.transaction_index.map(|i| i.to::<u64>()),
            gas_used: receipt.gas_used.unwrap_or_default(),
            // Pre-Byzantium receipts carry no status; treat them as successful.
            status: receipt.status.map(|s| s.to::<u64>()).unwrap_or(1),
            contract_address: receipt.contract_address.filter(|a| !a.trim().is_empty()),
        }
    }
}

impl Block {
    /// UTC midnight of the block's day.
    pub fn day(&self) -> i64 {
        day_bucket(self.timestamp)
    }
}

/// Build the stored transaction row from the block, the transaction and its receipt.
/// Returns `None` if the transaction has no sender.
pub fn extract_transaction(
    block: &Block,
    tx: &ChainTransaction,
    receipt: &Receipt,
) -> Option<Transaction> {
    let from = tx.from.as_deref().map(normalize_address)?;
    let transaction_index = receipt
        .transaction_index
        .or(tx.transaction_index)
        .unwrap_or_default();

    Some(Transaction {
        hash: tx.hash.clone(),
        block_number: block.number as i64,
        block_hash: block.hash.clone(),
        from_address: from,
        to_address: tx.to.as_deref().map(normalize_address),
        value: tx.value.to_string(),
        gas_used: receipt.gas_used.to_string(),
        gas_price: tx.gas_price.to_string(),
        timestamp: block.timestamp,
        transaction_index: transaction_index as i64,
        status: receipt.status as i64,
        is_contract_creation: receipt.contract_address.is_some(),
        contract_address: receipt.contract_address.as_deref().map(normalize_address),
    })
}
