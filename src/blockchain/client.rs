//! Blockchain RPC client with timeout and error handling.
//!
//! # Responsibilities
//! - Connect to the JSON-RPC endpoint (primary + read failovers)
//! - Query chain state (chain ID, balances, nonces, gas price)
//! - Apply the configured gas price multiplier and ceiling
//! - Submit raw transactions to the primary only, exactly once

use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::{Provider, ProviderBuilder};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::blockchain::node::{ChainNode, FeeEstimator};
use crate::blockchain::transaction::UnsignedTransaction;
use crate::blockchain::types::{BlockchainConfig, BlockchainError, BlockchainResult, ChainId};

const WEI_PER_GWEI: u128 = 1_000_000_000;

/// Blockchain RPC client wrapper with failover support for reads.
#[derive(Clone)]
pub struct BlockchainClient {
    /// List of providers (primary + failovers).
    providers: Vec<Arc<dyn Provider + Send + Sync>>,
    /// Configuration.
    config: BlockchainConfig,
    /// Request timeout duration.
    timeout_duration: Duration,
}

impl BlockchainClient {
    /// Create a new blockchain client.
    ///
    /// No request is made here; an unreachable node surfaces on first use.
    ///
    /// # Arguments
    /// * `config` - Blockchain configuration
    ///
    /// # Returns
    /// A new client or error if the primary URL does not parse
    pub fn new(config: BlockchainConfig) -> BlockchainResult<Self> {
        let timeout_duration = Duration::from_secs(config.rpc_timeout_secs);
        let mut providers = Vec::new();

        // 1. Add primary provider
        let primary_url: url::Url = config.rpc_url.parse().map_err(|e| {
            BlockchainError::Rpc(format!("Invalid RPC URL '{}': {}", config.rpc_url, e))
        })?;
        providers.push(
            Arc::new(ProviderBuilder::new().connect_http(primary_url))
                as Arc<dyn Provider + Send + Sync>,
        );

        // 2. Add failover providers
        for url_str in &config.failover_urls {
            if let Ok(url) = url_str.parse() {
                providers.push(
                    Arc::new(ProviderBuilder::new().connect_http(url))
                        as Arc<dyn Provider + Send + Sync>,
                );
            } else {
                tracing::warn!(url = %url_str, "Ignoring invalid failover RPC URL");
            }
        }

        tracing::info!(
            rpc_url = %config.rpc_url,
            failovers = providers.len() - 1,
            chain_id = config.chain_id,
            "Blockchain client initialized"
        );

        Ok(Self {
            providers,
            config,
            timeout_duration,
        })
    }

    /// Get the chain ID from the RPC.
    pub async fn get_chain_id(&self) -> BlockchainResult<ChainId> {
        for (i, provider) in self.providers.iter().enumerate() {
            let fut = provider.get_chain_id();
            match timeout(self.timeout_duration, fut).await {
                Ok(Ok(result)) => return Ok(ChainId(result)),
                Ok(Err(e)) => {
                    tracing::warn!(provider_idx = i, error = %e, "RPC error, trying next provider");
                }
                Err(_) => {
                    tracing::warn!(provider_idx = i, "RPC timeout, trying next provider");
                }
            }
        }
        Err(BlockchainError::Rpc("All RPC providers failed".to_string()))
    }

    /// Get the balance of an address.
    pub async fn get_balance(&self, address: Address) -> BlockchainResult<U256> {
        for (i, provider) in self.providers.iter().enumerate() {
            let fut = provider.get_balance(address);
            match timeout(self.timeout_duration, fut).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => tracing::warn!(provider_idx = i, error = %e, "RPC error"),
                Err(_) => tracing::warn!(provider_idx = i, "RPC timeout"),
            }
        }
        Err(BlockchainError::Rpc("All providers failed to get balance".to_string()))
    }

    /// Get the transaction count (nonce) for an address.
    pub async fn get_transaction_count(&self, address: Address) -> BlockchainResult<u64> {
        for (i, provider) in self.providers.iter().enumerate() {
            let fut = provider.get_transaction_count(address);
            match timeout(self.timeout_duration, fut).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => tracing::warn!(provider_idx = i, error = %e, "RPC error"),
                Err(_) => tracing::warn!(provider_idx = i, "RPC timeout"),
            }
        }
        Err(BlockchainError::Rpc("All providers failed to get transaction count".to_string()))
    }

    /// Get current gas price in wei, as reported by the node.
    pub async fn get_gas_price(&self) -> BlockchainResult<u128> {
        for (i, provider) in self.providers.iter().enumerate() {
            let fut = provider.get_gas_price();
            match timeout(self.timeout_duration, fut).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => tracing::warn!(provider_idx = i, error = %e, "RPC error"),
                Err(_) => tracing::warn!(provider_idx = i, "RPC timeout"),
            }
        }
        Err(BlockchainError::Rpc("All providers failed to get gas price".to_string()))
    }

    /// Submit raw transaction bytes to the primary provider.
    ///
    /// Never fails over: a second node could accept the same transaction.
    pub async fn send_raw_transaction(&self, raw: &[u8]) -> BlockchainResult<TxHash> {
        let fut = self.providers[0].send_raw_transaction(raw);
        match timeout(self.timeout_duration, fut).await {
            Ok(Ok(pending)) => Ok(*pending.tx_hash()),
            Ok(Err(e)) => match e.as_error_resp() {
                Some(payload) => Err(BlockchainError::Rejected(payload.message.to_string())),
                None => Err(BlockchainError::Rpc(e.to_string())),
            },
            Err(_) => Err(BlockchainError::Timeout(self.config.rpc_timeout_secs)),
        }
    }
}

/// Scale `base` by `multiplier` and enforce the ceiling.
pub(crate) fn adjust_gas_price(
    base: u128,
    multiplier: f64,
    max_gwei: u64,
) -> BlockchainResult<u128> {
    let adjusted = if multiplier == 1.0 {
        base
    } else {
        (base as f64 * multiplier).ceil() as u128
    };

    let max_wei = max_gwei as u128 * WEI_PER_GWEI;
    if adjusted > max_wei {
        return Err(BlockchainError::GasPriceTooHigh {
            current_gwei: (adjusted / WEI_PER_GWEI) as u64,
            max_gwei,
        });
    }
    Ok(adjusted)
}

#[async_trait]
impl FeeEstimator for BlockchainClient {
    async fn estimate_gas_price(&self, tx: &UnsignedTransaction) -> BlockchainResult<u128> {
        let base = self.get_gas_price().await?;
        let price = adjust_gas_price(
            base,
            self.config.gas_price_multiplier,
            self.config.max_gas_price_gwei,
        )?;
        tracing::debug!(
            base_wei = base,
            price_wei = price,
            gas_limit = tx.gas_limit,
            "Gas price estimated"
        );
        Ok(price)
    }
}

#[async_trait]
impl ChainNode for BlockchainClient {
    async fn chain_id(&self) -> BlockchainResult<ChainId> {
        self.get_chain_id().await
    }

    async fn get_balance(&self, address: Address) -> BlockchainResult<U256> {
        BlockchainClient::get_balance(self, address).await
    }

    async fn get_transaction_count(&self, address: Address) -> BlockchainResult<u64> {
        BlockchainClient::get_transaction_count(self, address).await
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> BlockchainResult<TxHash> {
        BlockchainClient::send_raw_transaction(self, raw).await
    }
}

impl std::fmt::Debug for BlockchainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockchainClient")
            .field("rpc_url", &self.config.rpc_url)
            .field("failovers", &(self.providers.len() - 1))
            .field("chain_id", &self.config.chain_id)
            .field("timeout_secs", &self.config.rpc_timeout_secs)
            .finish()
    }
}
