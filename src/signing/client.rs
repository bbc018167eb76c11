//! Remote signing client.
//!
//! # Responsibilities
//! - Fetch uncompressed public keys
//! - Submit one signing request per transaction
//! - Poll a request once and interpret the outcome
//!
//! Every call is a single attempt under its own transport deadline. A
//! transport failure, timeout or protocol violation fails with
//! `SigningServiceUnavailable`, or `SigningStatusUnavailable` naming the
//! request once one exists. A terminal status other than completed fails
//! with `SigningDenied`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{B256, U256};

use crate::blockchain::address::PublicKey;
use crate::blockchain::assembler::{RecoveryId, Signature};
use crate::error::{TransferError, TransferResult};
use crate::resilience::timeouts::bounded;
use crate::signing::service::{SigningService, SigningServiceError};
use crate::signing::types::{
    DerivationPath, RemoteSignature, RequestId, SigningAlgorithm, SigningRequest, SigningStatus,
    StatusReport,
};

/// Result of one status poll.
#[derive(Debug, Clone)]
pub struct PollOutcome {
    pub status: SigningStatus,
    /// Present iff `status` is `Completed`.
    pub signature: Option<Signature>,
    /// Hash the service reports it signed. Present iff `status` is `Completed`.
    pub signed_payload: Option<B256>,
    /// Key path the service reports it signed with. Empty if not echoed.
    pub signed_path: Option<DerivationPath>,
    /// Full status payload.
    pub report: StatusReport,
}

/// Client over a [`SigningService`].
#[derive(Clone)]
pub struct RemoteSigningClient {
    service: Arc<dyn SigningService>,
    call_timeout: Duration,
}

impl RemoteSigningClient {
    pub fn new(service: Arc<dyn SigningService>, call_timeout: Duration) -> Self {
        Self {
            service,
            call_timeout,
        }
    }

    /// Uncompressed public key for `path`.
    pub async fn public_key(
        &self,
        path: &DerivationPath,
        algorithm: SigningAlgorithm,
    ) -> TransferResult<PublicKey> {
        let text = self
            .call("get_public_key", self.service.get_public_key(algorithm, path, false))
            .await?;
        PublicKey::from_hex(&text)
    }

    /// Submit `hash` for signing with the key at `path`.
    pub async fn submit(
        &self,
        hash: B256,
        path: &DerivationPath,
        algorithm: SigningAlgorithm,
    ) -> TransferResult<RequestId> {
        let request = SigningRequest {
            payload_hash: hash,
            derivation_path: path.clone(),
            algorithm,
        };
        let id = self
            .call("create_signing_request", self.service.create_signing_request(&request))
            .await?;
        tracing::info!(request_id = %id, payload_hash = %hash, path = %path, "Signing request submitted");
        Ok(id)
    }

    /// Query the status of `id` once.
    ///
    /// Unavailability is reported against `id`, since the request outlives
    /// the failed poll.
    pub async fn poll(&self, id: &RequestId) -> TransferResult<PollOutcome> {
        self.poll_once(id).await.map_err(|e| match e {
            TransferError::SigningServiceUnavailable(detail) => {
                TransferError::SigningStatusUnavailable {
                    request_id: id.clone(),
                    detail,
                }
            }
            other => other,
        })
    }

    async fn poll_once(&self, id: &RequestId) -> TransferResult<PollOutcome> {
        let report = self.call("get_status", self.service.get_status(id)).await?;
        let status = SigningStatus::from_wire(&report.status);

        match status {
            SigningStatus::Pending => Ok(PollOutcome {
                status,
                signature: None,
                signed_payload: None,
                signed_path: None,
                report,
            }),
            SigningStatus::Completed => {
                let (signature, signed_payload, signed_path) = {
                    let [message] = report.signed_messages.as_slice() else {
                        return Err(TransferError::SigningServiceUnavailable(format!(
                            "completed request {} carries {} signed messages, expected 1",
                            id,
                            report.signed_messages.len()
                        )));
                    };
                    (
                        parse_signature(&message.signature)?,
                        parse_hash(&message.content)?,
                        DerivationPath::new(message.derivation_path.clone()),
                    )
                };
                Ok(PollOutcome {
                    status,
                    signature: Some(signature),
                    signed_payload: Some(signed_payload),
                    signed_path: Some(signed_path),
                    report,
                })
            }
            denied => Err(TransferError::SigningDenied {
                request_id: id.clone(),
                status: denied,
                report: Box::new(report),
            }),
        }
    }

    async fn call<T, F>(&self, operation: &'static str, fut: F) -> TransferResult<T>
    where
        F: Future<Output = Result<T, SigningServiceError>>,
    {
        let limit = self.call_timeout;
        bounded(
            limit,
            async move {
                fut.await.map_err(|e| {
                    tracing::warn!(operation = operation, error = %e, "Signing service call failed");
                    TransferError::SigningServiceUnavailable(format!("{}: {}", operation, e))
                })
            },
            || {
                tracing::warn!(operation = operation, timeout = ?limit, "Signing service call timed out");
                TransferError::SigningServiceUnavailable(format!(
                    "{}: timed out after {:?}",
                    operation, limit
                ))
            },
        )
        .await
    }
}

impl std::fmt::Debug for RemoteSigningClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteSigningClient")
            .field("call_timeout", &self.call_timeout)
            .finish()
    }
}

fn parse_scalar(name: &str, text: &str) -> TransferResult<U256> {
    let digits = text.strip_prefix("0x").unwrap_or(text);
    U256::from_str_radix(digits, 16).map_err(|e| {
        TransferError::SigningServiceUnavailable(format!("signature {} is not hex: {}", name, e))
    })
}

fn parse_signature(remote: &RemoteSignature) -> TransferResult<Signature> {
    Ok(Signature::new(
        parse_scalar("r", &remote.r)?,
        parse_scalar("s", &remote.s)?,
        RecoveryId::from_wire(remote.v)?,
    ))
}

fn parse_hash(content: &str) -> TransferResult<B256> {
    let digits = content.strip_prefix("0x").unwrap_or(content);
    digits.parse::<B256>().map_err(|e| {
        TransferError::SigningServiceUnavailable(format!("signed content is not a 32-byte hash: {}", e))
    })
}
