//! Remote signing service capability.
//!
//! [`FireblocksService`](crate::signing::fireblocks::FireblocksService) is
//! the production implementation; tests substitute in-process doubles.

use async_trait::async_trait;
use thiserror::Error;

use crate::signing::types::{
    DerivationPath, RequestId, SigningAlgorithm, SigningRequest, StatusReport,
};

/// Errors talking to the signing service.
#[derive(Debug, Error)]
pub enum SigningServiceError {
    /// Connection, TLS or timeout failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// Non-success HTTP status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Credentials could not be loaded or a token could not be signed.
    #[error("authentication error: {0}")]
    Auth(String),

    /// Response body did not match the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),
}

/// Operations the transfer needs from the signing service.
#[async_trait]
pub trait SigningService: Send + Sync {
    /// Hex-encoded public key for `path`.
    async fn get_public_key(
        &self,
        algorithm: SigningAlgorithm,
        path: &DerivationPath,
        compressed: bool,
    ) -> Result<String, SigningServiceError>;

    /// Submit a raw-hash signing request.
    async fn create_signing_request(
        &self,
        request: &SigningRequest,
    ) -> Result<RequestId, SigningServiceError>;

    /// Current status of a request.
    async fn get_status(&self, id: &RequestId) -> Result<StatusReport, SigningServiceError>;
}
