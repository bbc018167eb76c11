//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call to signing service or node:
//!     → timeouts.rs (every external call has a deadline)
//!
//! Waiting for a signature:
//!     → poll.rs (bounded attempts and total wait)
//!     → backoff.rs (delay growth for the exponential strategy)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - No automatic retries: a failed call fails the run
//! - The only repeated operation is the status poll, and it is bounded

pub mod backoff;
pub mod poll;
pub mod timeouts;

pub use poll::PollPolicy;
