//! Remote signing subsystem.
//!
//! # Data Flow
//! ```text
//! Environment (API key, secret path)
//!     → auth.rs (per-request RS256 tokens)
//!     → fireblocks.rs (REST calls)
//!     → client.rs (timeouts, status interpretation, signature parsing)
//! ```
//!
//! # Security Constraints
//! - Private keys never exist in this process
//! - The API secret and tokens are never logged

pub mod auth;
pub mod client;
pub mod fireblocks;
pub mod service;
pub mod types;

pub use client::{PollOutcome, RemoteSigningClient};
pub use fireblocks::FireblocksService;
pub use service::{SigningService, SigningServiceError};
pub use types::{DerivationPath, RequestId, SigningAlgorithm, SigningStatus, StatusReport};
