//! Unsigned transfer construction and its signing payload.
//!
//! # Responsibilities
//! - Build a legacy transfer that sweeps the whole balance minus the fee
//! - Produce the EIP-155 signing pre-image and its hash
//!
//! The fee is only known after the node prices the provisional transaction,
//! so `value` is fixed last: provisional tx → gas price → value.

use alloy::primitives::{keccak256, Address, Bytes, B256, U256};
use alloy::rlp::{Encodable, Header};

use crate::blockchain::node::FeeEstimator;
use crate::blockchain::types::TRANSFER_GAS_LIMIT;
use crate::error::{TransferError, TransferResult};

/// A legacy value transfer awaiting its signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedTransaction {
    /// Recipient.
    pub to: Address,
    /// Amount in wei.
    pub value: U256,
    /// Gas limit.
    pub gas_limit: u64,
    /// Gas price in wei.
    pub gas_price: u128,
    /// Sender nonce.
    pub nonce: u64,
    /// Replay-protection chain ID.
    pub chain_id: u64,
}

impl UnsignedTransaction {
    /// Maximum fee this transaction can burn.
    pub fn max_fee(&self) -> U256 {
        U256::from(self.gas_limit) * U256::from(self.gas_price)
    }

    /// EIP-155 pre-image: `rlp([nonce, gasPrice, gas, to, value, data, chainId, 0, 0])`.
    pub fn encode_for_signing(&self) -> Vec<u8> {
        self.encode_with_tail(&[&self.chain_id, &0u8, &0u8])
    }

    /// Hash the remote signer signs. Freshly computed on every call.
    pub fn signing_hash(&self) -> B256 {
        keccak256(self.encode_for_signing())
    }

    /// RLP list of the six transfer fields followed by `tail`.
    pub(crate) fn encode_with_tail(&self, tail: &[&dyn Encodable]) -> Vec<u8> {
        let input = Bytes::new();
        let fields: [&dyn Encodable; 6] = [
            &self.nonce,
            &self.gas_price,
            &self.gas_limit,
            &self.to,
            &self.value,
            &input,
        ];

        let payload_length: usize = fields.iter().chain(tail).map(|f| f.length()).sum();
        let header = Header {
            list: true,
            payload_length,
        };

        let mut out = Vec::with_capacity(header.length() + payload_length);
        header.encode(&mut out);
        for field in fields.iter().chain(tail) {
            field.encode(&mut out);
        }
        out
    }
}

/// Builds sweep transfers.
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    gas_limit: u64,
}

impl Default for TransactionBuilder {
    fn default() -> Self {
        Self {
            gas_limit: TRANSFER_GAS_LIMIT,
        }
    }
}

impl TransactionBuilder {
    /// Builder for plain transfers (21000 gas).
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a transfer of `gross_balance` minus the fee.
    ///
    /// # Arguments
    /// * `sender` - Source account (context for logs)
    /// * `recipient` - Destination account
    /// * `gross_balance` - Entire source balance in wei
    /// * `nonce` - Source account nonce
    /// * `chain_id` - Target chain
    /// * `fee_estimator` - Prices the provisional transaction
    pub async fn build<F>(
        &self,
        sender: Address,
        recipient: Address,
        gross_balance: U256,
        nonce: u64,
        chain_id: u64,
        fee_estimator: &F,
    ) -> TransferResult<UnsignedTransaction>
    where
        F: FeeEstimator + ?Sized,
    {
        let mut tx = UnsignedTransaction {
            to: recipient,
            value: gross_balance,
            gas_limit: self.gas_limit,
            gas_price: 0,
            nonce,
            chain_id,
        };

        tx.gas_price = fee_estimator.estimate_gas_price(&tx).await?;

        let fee = tx.max_fee();
        if fee >= gross_balance {
            return Err(TransferError::InsufficientFunds {
                balance: gross_balance,
                fee,
            });
        }
        tx.value = gross_balance - fee;

        tracing::info!(
            sender = %sender,
            recipient = %recipient,
            balance = %gross_balance,
            gas_price = tx.gas_price,
            fee = %fee,
            value = %tx.value,
            nonce = nonce,
            "Sweep transaction built"
        );

        Ok(tx)
    }
}
