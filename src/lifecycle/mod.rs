//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     Orchestrator observes the signal between status polls → Cancelled
//! ```
//!
//! # Design Decisions
//! - Cancellation is cooperative and only observed while waiting
//! - Once broadcasting starts, a signal no longer aborts the run

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
