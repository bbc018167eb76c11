//! Transfer state machine.
//!
//! # Responsibilities
//! - Derive both accounts from the signing service's public keys
//! - Read chain state and build the sweep transaction
//! - Submit the signing hash and wait, bounded, for a terminal status
//! - Assemble and verify the signed transaction, then broadcast it once
//!
//! One request is in flight at a time and an orchestrator runs once. Only
//! the status poll repeats; cancellation is observed between polls and never
//! after broadcasting starts.

use std::sync::Arc;

use alloy::primitives::Address;
use tokio::sync::broadcast;
use tokio::time::Instant;

use crate::blockchain::address::derive_address;
use crate::blockchain::assembler::{assemble, verify_signer};
use crate::blockchain::broadcaster::Broadcaster;
use crate::blockchain::node::ChainNode;
use crate::blockchain::transaction::TransactionBuilder;
use crate::blockchain::types::BlockchainError;
use crate::error::{TransferError, TransferResult};
use crate::lifecycle::shutdown::{cancelled, Shutdown};
use crate::observability::metrics;
use crate::resilience::poll::PollPolicy;
use crate::signing::client::{PollOutcome, RemoteSigningClient};
use crate::signing::types::{DerivationPath, RequestId};
use crate::transfer::plan::{Destination, TransferPlan, TransferReceipt};
use crate::transfer::state::TransferState;

/// Drives one transfer from key derivation to broadcast.
pub struct Orchestrator {
    signer: RemoteSigningClient,
    node: Arc<dyn ChainNode>,
    broadcaster: Broadcaster,
    builder: TransactionBuilder,
    plan: TransferPlan,
    policy: PollPolicy,
    cancel: broadcast::Receiver<()>,
    state: TransferState,
    ran: bool,
}

impl Orchestrator {
    /// Create an orchestrator for `plan`.
    ///
    /// Subscribes to `shutdown` immediately, so a signal sent before
    /// [`run`](Self::run) still cancels the wait.
    pub fn new(
        signer: RemoteSigningClient,
        node: Arc<dyn ChainNode>,
        broadcaster: Broadcaster,
        plan: TransferPlan,
        policy: PollPolicy,
        shutdown: &Shutdown,
    ) -> Self {
        Self {
            signer,
            node,
            broadcaster,
            builder: TransactionBuilder::new(),
            plan,
            policy,
            cancel: shutdown.subscribe(),
            state: TransferState::Init,
            ran: false,
        }
    }

    /// Current state.
    pub fn state(&self) -> TransferState {
        self.state
    }

    /// Run the transfer. Refused with `AlreadyRan` on a second call.
    pub async fn run(&mut self) -> TransferResult<TransferReceipt> {
        if self.ran {
            return Err(TransferError::AlreadyRan);
        }
        self.ran = true;

        let result = self.execute().await;
        match &result {
            Ok(receipt) => {
                tracing::info!(
                    tx_hash = %receipt.tx_hash,
                    value = %receipt.value,
                    fee = %receipt.fee,
                    "Transfer broadcast"
                );
                metrics::record_run("broadcast");
            }
            Err(e) => {
                let failed_in = self.state;
                self.transition(TransferState::Aborted);
                tracing::error!(
                    error = %e,
                    kind = e.kind(),
                    failed_in = %failed_in,
                    "Transfer aborted"
                );
                metrics::record_run(e.kind());
            }
        }
        result
    }

    async fn execute(&mut self) -> TransferResult<TransferReceipt> {
        let algorithm = self.plan.algorithm;
        let chain_id = self.plan.chain_id;

        // Init → KeysDerived
        let source = self.derive(&self.plan.source).await?;
        let destination = match self.plan.destination.clone() {
            Destination::Path(path) => self.derive(&path).await?,
            Destination::Address(address) => address,
        };
        tracing::info!(source = %source, destination = %destination, "Accounts resolved");
        self.transition(TransferState::KeysDerived);

        // KeysDerived → TxBuilt
        let actual = self.node.chain_id().await?;
        if actual.0 != chain_id {
            return Err(BlockchainError::ChainMismatch {
                expected: chain_id,
                actual: actual.0,
            }
            .into());
        }
        let balance = self.node.get_balance(source).await?;
        let destination_balance = self.node.get_balance(destination).await?;
        tracing::info!(
            source_balance = %balance,
            destination_balance = %destination_balance,
            "Balances read"
        );
        let nonce = self.node.get_transaction_count(source).await?;
        let unsigned = self
            .builder
            .build(source, destination, balance, nonce, chain_id, self.node.as_ref())
            .await?;
        let signing_hash = unsigned.signing_hash();
        self.transition(TransferState::TxBuilt);

        // TxBuilt → SigningSubmitted
        let request_id = self
            .signer
            .submit(signing_hash, &self.plan.source, algorithm)
            .await?;
        self.transition(TransferState::SigningSubmitted);

        // SigningPending ⟲ → Signed | SigningFailed
        let outcome = match self.await_signature(&request_id).await {
            Ok(outcome) => outcome,
            Err(e @ TransferError::SigningDenied { .. }) => {
                self.transition(TransferState::SigningFailed);
                return Err(e);
            }
            Err(e) => return Err(e),
        };
        let (signature, signed_payload) = match (outcome.signature, outcome.signed_payload) {
            (Some(signature), Some(payload)) => (signature, payload),
            _ => {
                return Err(TransferError::SigningStatusUnavailable {
                    request_id,
                    detail: "completed request carries no signature".to_string(),
                })
            }
        };
        if signed_payload != signing_hash {
            return Err(TransferError::PayloadMismatch {
                expected: signing_hash,
                actual: signed_payload,
            });
        }
        // verify_signer decides; a differing echo is only logged
        if let Some(path) = outcome.signed_path.filter(|p| !p.is_empty()) {
            if path != self.plan.source {
                tracing::warn!(
                    request_id = %request_id,
                    submitted = %self.plan.source,
                    echoed = %path,
                    "Signing service echoed a different derivation path"
                );
            }
        }

        let signed = assemble(&unsigned, &signature, chain_id)?;
        verify_signer(&signed, &unsigned, source)?;
        self.transition(TransferState::Signed);

        // Signed → Broadcast
        let tx_hash = self.broadcaster.submit(&signed.raw).await?;
        self.transition(TransferState::Broadcast);

        Ok(TransferReceipt {
            tx_hash,
            source,
            destination,
            value: unsigned.value,
            fee: unsigned.max_fee(),
            nonce,
            request_id,
            raw: signed.raw,
        })
    }

    async fn derive(&self, path: &DerivationPath) -> TransferResult<Address> {
        let key = self.signer.public_key(path, self.plan.algorithm).await?;
        let address = derive_address(&key)?;
        tracing::debug!(path = %path, address = %address, "Address derived");
        Ok(address)
    }

    /// Poll until terminal, a bound is hit, or the run is cancelled.
    async fn await_signature(&mut self, request_id: &RequestId) -> TransferResult<PollOutcome> {
        let started = Instant::now();
        let mut attempts: u32 = 0;

        loop {
            let polled = self.signer.poll(request_id).await;
            attempts += 1;

            let outcome = match polled {
                Ok(outcome) => outcome,
                Err(e) => {
                    if let TransferError::SigningDenied { status, .. } = &e {
                        metrics::record_poll(status.as_str());
                        metrics::record_signing_wait(started.elapsed());
                    }
                    return Err(e);
                }
            };
            metrics::record_poll(outcome.status.as_str());

            if outcome.status.is_terminal() {
                metrics::record_signing_wait(started.elapsed());
                tracing::info!(
                    request_id = %request_id,
                    status = %outcome.status,
                    attempts = attempts,
                    "Signing request terminal"
                );
                return Ok(outcome);
            }

            if self.state != TransferState::SigningPending {
                self.transition(TransferState::SigningPending);
            }

            let elapsed = started.elapsed();
            tracing::debug!(
                request_id = %request_id,
                wire_status = %outcome.report.status,
                attempt = attempts,
                elapsed_ms = elapsed.as_millis() as u64,
                "Signing request pending"
            );

            if self.policy.exhausted(attempts, elapsed) {
                return Err(TransferError::SigningTimeout {
                    request_id: request_id.clone(),
                    attempts,
                    elapsed,
                });
            }

            let delay = self
                .policy
                .delay_after(attempts)
                .min(self.policy.max_wait.saturating_sub(elapsed));

            tokio::select! {
                biased;
                _ = cancelled(&mut self.cancel) => {
                    tracing::warn!(request_id = %request_id, attempts = attempts, "Cancelled while waiting for signature");
                    return Err(TransferError::Cancelled);
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    fn transition(&mut self, next: TransferState) {
        tracing::info!(from = %self.state, to = %next, "State transition");
        metrics::record_transition(next.as_str());
        self.state = next;
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("state", &self.state)
            .field("plan", &self.plan)
            .field("policy", &self.policy)
            .field("ran", &self.ran)
            .finish()
    }
}
