//! Transfer state machine states.

use std::fmt;

/// Where a run is.
///
/// ```text
/// Init → KeysDerived → TxBuilt → SigningSubmitted → SigningPending ⟲
///     → Signed → Broadcast
///     → SigningFailed → Aborted
/// any error → Aborted
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferState {
    Init,
    KeysDerived,
    TxBuilt,
    SigningSubmitted,
    SigningPending,
    Signed,
    SigningFailed,
    Broadcast,
    Aborted,
}

impl TransferState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferState::Init => "init",
            TransferState::KeysDerived => "keys_derived",
            TransferState::TxBuilt => "tx_built",
            TransferState::SigningSubmitted => "signing_submitted",
            TransferState::SigningPending => "signing_pending",
            TransferState::Signed => "signed",
            TransferState::SigningFailed => "signing_failed",
            TransferState::Broadcast => "broadcast",
            TransferState::Aborted => "aborted",
        }
    }
}

impl fmt::Display for TransferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
