//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! public key from signing service
//!     → address.rs (account address)
//!     → transaction.rs (sweep transfer, signing hash)
//!     → assembler.rs (v/r/s folded in, raw bytes, self-check, ecrecover)
//!     → broadcaster.rs (single eth_sendRawTransaction)
//!
//! node.rs defines what the node must provide; client.rs is the RPC client.
//! ```
//!
//! # Security Constraints
//! - No private key ever exists in this process
//! - All RPC calls have configurable timeouts
//! - Raw transactions go to the primary node only

pub mod address;
pub mod assembler;
pub mod broadcaster;
pub mod client;
pub mod node;
pub mod transaction;
pub mod types;

pub use address::{derive_address, PublicKey};
pub use assembler::{assemble, verify_signer, RecoveryId, Signature, SignedTransaction};
pub use broadcaster::Broadcaster;
pub use client::BlockchainClient;
pub use node::{ChainNode, FeeEstimator};
pub use transaction::{TransactionBuilder, UnsignedTransaction};
pub use types::{BlockchainConfig, BlockchainError, ChainId};
