//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → command-line overrides (main.rs)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable for the run)
//! ```
//!
//! # Design Decisions
//! - Config is read once; a run never observes a changed config
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Secrets never live in the file

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::AppConfig;
pub use schema::BlockchainConfig;
pub use schema::ObservabilityConfig;
pub use schema::PollingConfig;
pub use schema::SignerConfig;
pub use schema::TransferConfig;
