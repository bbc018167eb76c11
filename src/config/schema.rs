//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for a transfer
//! run. All types derive Serde traits for deserialization from config files.
//! Credentials are deliberately absent: they come from the environment.

use serde::{Deserialize, Serialize};

use crate::signing::types::SigningAlgorithm;

/// Root configuration for a transfer run.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Remote signing service settings.
    pub signer: SignerConfig,

    /// Source and destination accounts.
    pub transfer: TransferConfig,

    /// Poll loop bounds while the signature is pending.
    pub polling: PollingConfig,

    /// Blockchain node settings.
    pub blockchain: BlockchainConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Remote signing service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SignerConfig {
    /// Base URL of the signing service REST API.
    pub base_url: String,

    /// Path to the API secret (PEM). `MPC_SIGNER_API_SECRET_PATH` wins if set.
    pub api_secret_path: Option<String>,

    /// Signing algorithm requested for keys and signatures.
    pub algorithm: SigningAlgorithm,

    /// Per-call transport timeout in seconds.
    pub request_timeout_secs: u64,

    /// Note attached to the signing request.
    pub note: String,

    /// Honor HTTP(S)_PROXY environment variables.
    pub use_system_proxy: bool,
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.fireblocks.io".to_string(),
            api_secret_path: None,
            algorithm: SigningAlgorithm::default(),
            request_timeout_secs: 30,
            note: "mpc-transfer sweep".to_string(),
            use_system_proxy: true,
        }
    }
}

/// Accounts involved in the transfer.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TransferConfig {
    /// Derivation path of the source key, e.g. `[44, 60, 0, 0, 0]`.
    pub source_path: Vec<u32>,

    /// Derivation path of the destination key.
    pub destination_path: Option<Vec<u32>>,

    /// Literal destination address, used instead of `destination_path`.
    pub destination_address: Option<String>,
}

/// How the delay between status polls evolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PollStrategy {
    /// Same delay every time.
    #[default]
    Fixed,
    /// Doubling delay with jitter, capped at `max_interval_ms`.
    Exponential,
}

/// Poll loop configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Delay between status polls in milliseconds.
    pub interval_ms: u64,

    /// Delay growth strategy.
    pub strategy: PollStrategy,

    /// Ceiling for the exponential strategy in milliseconds.
    pub max_interval_ms: u64,

    /// Maximum number of status polls.
    pub max_attempts: u32,

    /// Maximum total wait in seconds.
    pub max_wait_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: 5_000,
            strategy: PollStrategy::Fixed,
            max_interval_ms: 30_000,
            max_attempts: 720,
            max_wait_secs: 3_600,
        }
    }
}

/// Blockchain integration configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BlockchainConfig {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Failover JSON-RPC endpoint URLs, used for reads only.
    #[serde(default)]
    pub failover_urls: Vec<String>,

    /// Target chain ID.
    pub chain_id: u64,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Gas price multiplier (1.0 = node estimate, 1.2 = 20% buffer).
    pub gas_price_multiplier: f64,

    /// Maximum gas price in gwei (protection against spikes).
    pub max_gas_price_gwei: u64,
}

impl Default for BlockchainConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8545".to_string(),
            failover_urls: Vec::new(),
            chain_id: 1,
            rpc_timeout_secs: 10,
            gas_price_multiplier: 1.0,
            max_gas_price_gwei: 500,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable the Prometheus scrape endpoint.
    ///
    /// The endpoint lives only as long as the process, and a run usually ends
    /// before the next scrape. Set `metrics_linger_secs` to at least the
    /// scrape interval to publish the final counters.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,

    /// Seconds to keep serving metrics after the run ends.
    pub metrics_linger_secs: u64,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
            metrics_linger_secs: 0,
        }
    }
}
