//! Transfer orchestration.
//!
//! # Data Flow
//! ```text
//! AppConfig → plan.rs (TransferPlan)
//!     → orchestrator.rs (state machine over signing client, node, broadcaster)
//!     → TransferReceipt | TransferError
//! ```

pub mod orchestrator;
pub mod plan;
pub mod state;

pub use crate::error::TransferError;
pub use orchestrator::Orchestrator;
pub use plan::{Destination, TransferPlan, TransferReceipt};
pub use state::TransferState;
