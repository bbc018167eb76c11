//! MPC-custodied value transfer library.
//!
//! Sweeps the balance of an account whose key lives in a remote MPC signing
//! service to a destination account, without the key ever leaving the
//! service.

pub mod blockchain;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod signing;
pub mod transfer;

pub use config::schema::AppConfig;
pub use error::{TransferError, TransferResult};
pub use lifecycle::Shutdown;
pub use transfer::{Orchestrator, TransferPlan, TransferReceipt, TransferState};
