//! Single-shot broadcast of a signed transaction.
//!
//! A broadcast is never retried: once the request has left the process the
//! node may have accepted it, and resending is the operator's call.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{keccak256, Bytes, TxHash};

use crate::blockchain::node::ChainNode;
use crate::blockchain::types::BlockchainError;
use crate::error::{TransferError, TransferResult};
use crate::observability::metrics;
use crate::resilience::timeouts::bounded;

/// Sends raw transactions to the node.
#[derive(Clone)]
pub struct Broadcaster {
    node: Arc<dyn ChainNode>,
    timeout: Duration,
}

impl Broadcaster {
    pub fn new(node: Arc<dyn ChainNode>, timeout: Duration) -> Self {
        Self { node, timeout }
    }

    /// Submit `raw` once and return the node's transaction hash.
    pub async fn submit(&self, raw: &Bytes) -> TransferResult<TxHash> {
        let local_hash = keccak256(raw);
        let limit = self.timeout;

        let result = bounded(limit, self.node.send_raw_transaction(raw), || {
            BlockchainError::Timeout(limit.as_secs())
        })
        .await;

        match result {
            Ok(hash) => {
                if hash != local_hash {
                    tracing::warn!(
                        node_hash = %hash,
                        local_hash = %local_hash,
                        "Node reported a different transaction hash"
                    );
                }
                metrics::record_broadcast("accepted");
                tracing::info!(tx_hash = %hash, "Transaction broadcast");
                Ok(hash)
            }
            Err(BlockchainError::Rejected(reason)) => {
                metrics::record_broadcast("rejected");
                tracing::error!(reason = %reason, tx_hash = %local_hash, "Node rejected transaction");
                Err(TransferError::RejectedByNode { reason })
            }
            Err(e) => {
                metrics::record_broadcast("unknown");
                tracing::error!(
                    error = %e,
                    tx_hash = %local_hash,
                    "Broadcast outcome unknown; check the hash before resending"
                );
                Err(TransferError::BroadcastOutcomeUnknown {
                    tx_hash: local_hash,
                    detail: e.to_string(),
                })
            }
        }
    }
}

impl std::fmt::Debug for Broadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broadcaster")
            .field("timeout", &self.timeout)
            .finish()
    }
}
