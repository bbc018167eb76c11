//! What a run transfers, and what it reports back.

use alloy::primitives::{Address, Bytes, TxHash, U256};
use serde::Serialize;

use crate::blockchain::address::parse_address;
use crate::config::schema::AppConfig;
use crate::config::validation::ValidationError;
use crate::signing::types::{DerivationPath, RequestId, SigningAlgorithm};

/// Where the funds go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Another key held by the signing service.
    Path(DerivationPath),
    /// A fixed account.
    Address(Address),
}

/// Inputs of one transfer run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferPlan {
    pub source: DerivationPath,
    pub destination: Destination,
    pub chain_id: u64,
    pub algorithm: SigningAlgorithm,
}

impl TransferPlan {
    /// Plan from a validated configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self, ValidationError> {
        let transfer = &config.transfer;
        let destination = match (&transfer.destination_path, &transfer.destination_address) {
            (Some(path), None) => Destination::Path(DerivationPath::new(path.clone())),
            (None, Some(text)) => {
                Destination::Address(parse_address(text).map_err(|e| ValidationError {
                    field: "transfer.destination_address",
                    message: e.to_string(),
                })?)
            }
            _ => {
                return Err(ValidationError {
                    field: "transfer.destination",
                    message: "set exactly one of destination_path or destination_address"
                        .to_string(),
                })
            }
        };

        Ok(Self {
            source: DerivationPath::new(transfer.source_path.clone()),
            destination,
            chain_id: config.blockchain.chain_id,
            algorithm: config.signer.algorithm,
        })
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct TransferReceipt {
    pub tx_hash: TxHash,
    pub source: Address,
    pub destination: Address,
    pub value: U256,
    pub fee: U256,
    pub nonce: u64,
    pub request_id: RequestId,
    pub raw: Bytes,
}
