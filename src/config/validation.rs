//! Configuration validation.
//!
//! Serde handles syntax; this module checks semantics (non-empty paths,
//! positive timeouts, consistent poll bounds, parseable URLs and addresses).
//! Every problem is reported, not just the first.

use std::net::SocketAddr;

use thiserror::Error;

use crate::blockchain::address::parse_address;
use crate::config::schema::{AppConfig, PollStrategy};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    /// What is wrong with it.
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_url(&mut errors, "signer.base_url", &config.signer.base_url);
    if config.signer.request_timeout_secs == 0 {
        errors.push(ValidationError::new("signer.request_timeout_secs", "must be greater than 0"));
    }

    let transfer = &config.transfer;
    if transfer.source_path.is_empty() {
        errors.push(ValidationError::new("transfer.source_path", "must not be empty"));
    }
    match (&transfer.destination_path, &transfer.destination_address) {
        (Some(_), Some(_)) => errors.push(ValidationError::new(
            "transfer.destination",
            "set destination_path or destination_address, not both",
        )),
        (None, None) => errors.push(ValidationError::new(
            "transfer.destination",
            "one of destination_path or destination_address is required",
        )),
        (Some(path), None) => {
            if path.is_empty() {
                errors.push(ValidationError::new("transfer.destination_path", "must not be empty"));
            } else if *path == transfer.source_path {
                errors.push(ValidationError::new(
                    "transfer.destination_path",
                    "must differ from source_path",
                ));
            }
        }
        (None, Some(address)) => {
            if let Err(e) = parse_address(address) {
                errors.push(ValidationError::new(
                    "transfer.destination_address",
                    format!("invalid address '{}': {}", address, e),
                ));
            }
        }
    }

    let polling = &config.polling;
    if polling.interval_ms == 0 {
        errors.push(ValidationError::new("polling.interval_ms", "must be greater than 0"));
    }
    if polling.max_attempts == 0 {
        errors.push(ValidationError::new("polling.max_attempts", "must be greater than 0"));
    }
    if polling.max_wait_secs == 0 {
        errors.push(ValidationError::new("polling.max_wait_secs", "must be greater than 0"));
    }
    if polling.strategy == PollStrategy::Exponential && polling.max_interval_ms < polling.interval_ms {
        errors.push(ValidationError::new(
            "polling.max_interval_ms",
            "must be at least interval_ms",
        ));
    }

    let chain = &config.blockchain;
    check_url(&mut errors, "blockchain.rpc_url", &chain.rpc_url);
    for url in &chain.failover_urls {
        check_url(&mut errors, "blockchain.failover_urls", url);
    }
    if chain.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new("blockchain.rpc_timeout_secs", "must be greater than 0"));
    }
    if !chain.gas_price_multiplier.is_finite() || chain.gas_price_multiplier <= 0.0 {
        errors.push(ValidationError::new(
            "blockchain.gas_price_multiplier",
            "must be a positive number",
        ));
    }

    let observability = &config.observability;
    if observability.metrics_enabled && observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    match url::Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ValidationError::new(
            field,
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new(field, format!("invalid URL '{}': {}", value, e))),
    }
}
