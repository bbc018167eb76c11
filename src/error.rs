//! Failure taxonomy for a transfer run.
//!
//! Every variant aborts the run. Variants carry enough structured detail
//! (status payloads, node reasons, hashes) for an operator to investigate
//! by hand; [`TransferError::diagnostic`] renders that detail as JSON.

use std::time::Duration;

use alloy::primitives::{Address, B256, U256};
use serde_json::json;
use thiserror::Error;

use crate::blockchain::types::BlockchainError;
use crate::signing::types::{RequestId, SigningStatus, StatusReport};

/// Errors that end a transfer run.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Public key is not a 65-byte uncompressed point.
    #[error("Malformed public key: {0}")]
    MalformedKey(String),

    /// Fee alone consumes the whole balance.
    #[error("Insufficient funds: balance {balance} does not cover fee {fee}")]
    InsufficientFunds { balance: U256, fee: U256 },

    /// Transport failure or protocol violation talking to the signing service.
    #[error("Signing service unavailable: {0}")]
    SigningServiceUnavailable(String),

    /// Status poll failed after the request was created. The request is
    /// still live at the service and may yet be signed.
    #[error("Signing service unavailable while polling {request_id}: {detail}")]
    SigningStatusUnavailable { request_id: RequestId, detail: String },

    /// Signing request reached a terminal status other than completed.
    #[error("Signing request {request_id} ended with status {status}")]
    SigningDenied {
        request_id: RequestId,
        status: SigningStatus,
        report: Box<StatusReport>,
    },

    /// Signing request still pending when the poll bound ran out.
    #[error("Signing request {request_id} not terminal after {attempts} polls ({elapsed:?})")]
    SigningTimeout {
        request_id: RequestId,
        attempts: u32,
        elapsed: Duration,
    },

    /// r or s zero or outside the curve order, or an unknown recovery id.
    #[error("Signature out of range: {0}")]
    SignatureOutOfRange(String),

    /// Serialization overflowed a field or failed its round-trip check.
    #[error("Encoding error: {0}")]
    EncodingError(String),

    /// Node refused the raw transaction.
    #[error("Rejected by node: {reason}")]
    RejectedByNode { reason: String },

    /// Broadcast was issued but its result never came back.
    #[error("Broadcast outcome unknown for {tx_hash}: {detail}")]
    BroadcastOutcomeUnknown { tx_hash: B256, detail: String },

    /// Service signed something other than the submitted payload.
    #[error("Signed payload {actual} does not match submitted hash {expected}")]
    PayloadMismatch { expected: B256, actual: B256 },

    /// Signature recovers to an account other than the source.
    #[error("Signature recovers to {recovered}, expected {expected}")]
    SignerMismatch { expected: Address, recovered: Address },

    /// Read-side node failure (balance, nonce, gas price, chain id).
    #[error(transparent)]
    Node(#[from] BlockchainError),

    /// Operator abort observed between polls.
    #[error("Transfer cancelled while waiting for signature")]
    Cancelled,

    /// The orchestrator is single-shot.
    #[error("Orchestrator already ran")]
    AlreadyRan,
}

/// Result type for transfer operations.
pub type TransferResult<T> = Result<T, TransferError>;

impl TransferError {
    /// Short stable label, used for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            TransferError::MalformedKey(_) => "malformed_key",
            TransferError::InsufficientFunds { .. } => "insufficient_funds",
            TransferError::SigningServiceUnavailable(_)
            | TransferError::SigningStatusUnavailable { .. } => "signing_service_unavailable",
            TransferError::SigningDenied { .. } => "signing_denied",
            TransferError::SigningTimeout { .. } => "signing_timeout",
            TransferError::SignatureOutOfRange(_) => "signature_out_of_range",
            TransferError::EncodingError(_) => "encoding_error",
            TransferError::RejectedByNode { .. } => "rejected_by_node",
            TransferError::BroadcastOutcomeUnknown { .. } => "broadcast_outcome_unknown",
            TransferError::PayloadMismatch { .. } => "payload_mismatch",
            TransferError::SignerMismatch { .. } => "signer_mismatch",
            TransferError::Node(_) => "node",
            TransferError::Cancelled => "cancelled",
            TransferError::AlreadyRan => "already_ran",
        }
    }

    /// Structured dump for the failure report.
    pub fn diagnostic(&self) -> serde_json::Value {
        let detail = match self {
            TransferError::SigningDenied {
                request_id,
                status,
                report,
            } => json!({
                "request_id": request_id.as_str(),
                "status": status.as_str(),
                "report": report,
            }),
            TransferError::SigningStatusUnavailable { request_id, detail } => json!({
                "request_id": request_id.as_str(),
                "detail": detail,
            }),
            TransferError::SigningTimeout {
                request_id,
                attempts,
                elapsed,
            } => json!({
                "request_id": request_id.as_str(),
                "attempts": attempts,
                "elapsed_ms": elapsed.as_millis() as u64,
            }),
            TransferError::RejectedByNode { reason } => json!({ "reason": reason }),
            TransferError::BroadcastOutcomeUnknown { tx_hash, detail } => json!({
                "tx_hash": tx_hash.to_string(),
                "detail": detail,
            }),
            TransferError::InsufficientFunds { balance, fee } => json!({
                "balance": balance.to_string(),
                "fee": fee.to_string(),
            }),
            TransferError::SignerMismatch {
                expected,
                recovered,
            } => json!({
                "expected": expected.to_checksum(None),
                "recovered": recovered.to_checksum(None),
            }),
            TransferError::PayloadMismatch { expected, actual } => json!({
                "expected": expected.to_string(),
                "actual": actual.to_string(),
            }),
            _ => serde_json::Value::Null,
        };

        json!({
            "error": self.kind(),
            "message": self.to_string(),
            "detail": detail,
        })
    }
}
