//! mpc-transfer
//!
//! Sweeps an account whose key is held by a remote MPC signing service.
//!
//! # Flow
//!
//! ```text
//!   config (TOML) + CLI overrides
//!          │
//!          ▼
//!   ┌──────────────┐   public keys, signing    ┌─────────────────┐
//!   │ Orchestrator │ ◀───────────────────────▶ │ signing service │
//!   │              │                           └─────────────────┘
//!   │              │   balance, nonce, gas,    ┌─────────────────┐
//!   │              │ ◀───────────────────────▶ │ blockchain node │
//!   └──────┬───────┘   raw transaction         └─────────────────┘
//!          │
//!          ▼
//!   tx hash on stdout  |  JSON diagnostic on stderr
//! ```
//!
//! Credentials come from `MPC_SIGNER_API_KEY` and
//! `MPC_SIGNER_API_SECRET_PATH` (or `signer.api_secret_path`).

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use serde_json::json;

use mpc_transfer::blockchain::{BlockchainClient, Broadcaster, ChainNode};
use mpc_transfer::config::loader::read_config;
use mpc_transfer::config::schema::LogFormat;
use mpc_transfer::config::validation::validate_config;
use mpc_transfer::lifecycle::signals::spawn_signal_listener;
use mpc_transfer::observability::{init_logging, metrics};
use mpc_transfer::resilience::PollPolicy;
use mpc_transfer::signing::auth::ApiCredentials;
use mpc_transfer::signing::{FireblocksService, RemoteSigningClient};
use mpc_transfer::{AppConfig, Orchestrator, Shutdown, TransferError, TransferPlan, TransferReceipt};

/// Sweep an MPC-custodied account to a destination.
#[derive(Debug, Parser)]
#[command(name = "mpc-transfer", version, about)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: PathBuf,

    /// Override `blockchain.chain_id`.
    #[arg(long)]
    chain_id: Option<u64>,

    /// Send to this address instead of a derived destination.
    #[arg(long)]
    destination_address: Option<String>,

    /// Override `observability.log_format`.
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,
}

/// Why the process is exiting non-zero.
enum Failure {
    /// Configuration or setup failed before the transfer started.
    Startup(String),
    /// The transfer itself aborted.
    Transfer(TransferError),
}

impl Failure {
    fn diagnostic(&self) -> serde_json::Value {
        match self {
            Failure::Startup(message) => json!({
                "error": "startup",
                "message": message,
                "detail": null,
            }),
            Failure::Transfer(e) => e.diagnostic(),
        }
    }
}

fn apply_overrides(config: &mut AppConfig, cli: &Cli) {
    if let Some(chain_id) = cli.chain_id {
        config.blockchain.chain_id = chain_id;
    }
    if let Some(address) = &cli.destination_address {
        config.transfer.destination_address = Some(address.clone());
        config.transfer.destination_path = None;
    }
    if let Some(format) = cli.log_format {
        config.observability.log_format = format;
    }
}

async fn run(cli: Cli) -> Result<TransferReceipt, Failure> {
    // 1. Configuration
    let mut config = read_config(&cli.config).map_err(|e| Failure::Startup(e.to_string()))?;
    apply_overrides(&mut config, &cli);
    validate_config(&config).map_err(|errors| {
        let lines: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        Failure::Startup(format!("invalid configuration: {}", lines.join("; ")))
    })?;

    // 2. Observability
    init_logging(&config.observability)
        .map_err(|e| Failure::Startup(format!("logging setup failed: {}", e)))?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        chain_id = config.blockchain.chain_id,
        "mpc-transfer starting"
    );
    if config.observability.metrics_enabled {
        let address: SocketAddr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|e| Failure::Startup(format!("invalid metrics address: {}", e)))?;
        metrics::init_metrics(address)
            .map_err(|e| Failure::Startup(format!("metrics setup failed: {}", e)))?;
    }

    // 3. Collaborators
    let credentials = ApiCredentials::from_env(config.signer.api_secret_path.as_deref())
        .map_err(|e| Failure::Startup(e.to_string()))?;
    let service = FireblocksService::new(&config.signer, credentials)
        .map_err(|e| Failure::Startup(e.to_string()))?;
    let signer = RemoteSigningClient::new(
        Arc::new(service),
        Duration::from_secs(config.signer.request_timeout_secs),
    );

    let client = BlockchainClient::new(config.blockchain.clone())
        .map_err(|e| Failure::Startup(e.to_string()))?;
    let node: Arc<dyn ChainNode> = Arc::new(client);
    let broadcaster = Broadcaster::new(
        node.clone(),
        Duration::from_secs(config.blockchain.rpc_timeout_secs),
    );

    let plan = TransferPlan::from_config(&config).map_err(|e| Failure::Startup(e.to_string()))?;
    let policy = PollPolicy::from_config(&config.polling);

    // 4. Run
    let shutdown = Shutdown::new();
    let mut orchestrator = Orchestrator::new(signer, node, broadcaster, plan, policy, &shutdown);
    let signals = spawn_signal_listener(shutdown);

    let result = orchestrator.run().await.map_err(Failure::Transfer);
    signals.abort();

    if config.observability.metrics_enabled {
        metrics::linger(Duration::from_secs(config.observability.metrics_linger_secs)).await;
    }
    result
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(receipt) => {
            println!("{}", receipt.tx_hash);
            ExitCode::SUCCESS
        }
        Err(failure) => {
            let dump = failure.diagnostic();
            match serde_json::to_string_pretty(&dump) {
                Ok(text) => eprintln!("{}", text),
                Err(_) => eprintln!("{}", dump),
            }
            ExitCode::FAILURE
        }
    }
}
