//! Signing service data model.
//!
//! Wire types keep the service's camelCase field names so a status payload
//! can be dumped verbatim in a failure report.

use std::fmt;

use alloy::primitives::B256;
use serde::{Deserialize, Serialize};

/// BIP-44 style derivation path of a key held by the signing service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DerivationPath(Vec<u32>);

impl DerivationPath {
    pub fn new(components: Vec<u32>) -> Self {
        Self(components)
    }

    pub fn components(&self) -> &[u32] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u32>> for DerivationPath {
    fn from(components: Vec<u32>) -> Self {
        Self(components)
    }
}

/// Renders as `[44,60,0,0,0]`, the form the service expects in query strings.
impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, c) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", c)?;
        }
        f.write_str("]")
    }
}

/// Signature scheme requested from the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SigningAlgorithm {
    #[default]
    #[serde(rename = "MPC_ECDSA_SECP256K1")]
    MpcEcdsaSecp256k1,
}

impl SigningAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            SigningAlgorithm::MpcEcdsaSecp256k1 => "MPC_ECDSA_SECP256K1",
        }
    }
}

/// Identifier the service assigns to a signing request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RequestId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for RequestId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One raw-hash signing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningRequest {
    /// Hash to sign.
    pub payload_hash: B256,
    /// Key to sign with.
    pub derivation_path: DerivationPath,
    pub algorithm: SigningAlgorithm,
}

/// Normalized request status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SigningStatus {
    /// Any non-terminal wire status.
    Pending,
    Completed,
    Failed,
    Cancelled,
    Rejected,
    Blocked,
}

impl SigningStatus {
    /// Map a wire status. Unknown strings are treated as still in progress.
    pub fn from_wire(status: &str) -> Self {
        match status {
            "COMPLETED" => SigningStatus::Completed,
            "FAILED" => SigningStatus::Failed,
            "CANCELLED" => SigningStatus::Cancelled,
            "REJECTED" => SigningStatus::Rejected,
            "BLOCKED" => SigningStatus::Blocked,
            _ => SigningStatus::Pending,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, SigningStatus::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SigningStatus::Pending => "PENDING",
            SigningStatus::Completed => "COMPLETED",
            SigningStatus::Failed => "FAILED",
            SigningStatus::Cancelled => "CANCELLED",
            SigningStatus::Rejected => "REJECTED",
            SigningStatus::Blocked => "BLOCKED",
        }
    }
}

impl fmt::Display for SigningStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status payload of a signing request, as returned by the service.
///
/// Fields not modelled here are kept in `extra` so the payload survives a
/// round trip into the failure report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub id: String,
    /// Raw wire status, e.g. `PENDING_SIGNATURE`.
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_status: Option<String>,
    #[serde(default)]
    pub signed_messages: Vec<SignedMessage>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A signature produced for one submitted message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedMessage {
    /// Hex of the hash that was signed.
    pub content: String,
    #[serde(default)]
    pub derivation_path: Vec<u32>,
    pub signature: RemoteSignature,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
}

/// Signature components as hex strings plus the recovery parity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteSignature {
    pub r: String,
    pub s: String,
    pub v: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_sig: Option<String>,
}
