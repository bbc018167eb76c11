//! Node capabilities the transfer depends on.
//!
//! [`BlockchainClient`](crate::blockchain::client::BlockchainClient) is the
//! production implementation; tests substitute in-process doubles.

use alloy::primitives::{Address, TxHash, U256};
use async_trait::async_trait;

use crate::blockchain::transaction::UnsignedTransaction;
use crate::blockchain::types::{BlockchainResult, ChainId};

/// Prices gas for a provisional transaction.
#[async_trait]
pub trait FeeEstimator: Send + Sync {
    /// Gas price in wei for `tx`.
    async fn estimate_gas_price(&self, tx: &UnsignedTransaction) -> BlockchainResult<u128>;
}

/// Authoritative chain state and transaction submission.
#[async_trait]
pub trait ChainNode: FeeEstimator {
    /// Chain ID the node is serving.
    async fn chain_id(&self) -> BlockchainResult<ChainId>;

    /// Balance of `address` in wei.
    async fn get_balance(&self, address: Address) -> BlockchainResult<U256>;

    /// Next nonce for `address`.
    async fn get_transaction_count(&self, address: Address) -> BlockchainResult<u64>;

    /// Submit raw signed transaction bytes. Issued exactly once per call.
    async fn send_raw_transaction(&self, raw: &[u8]) -> BlockchainResult<TxHash>;
}
