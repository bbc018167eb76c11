//! Reassembly of a remote `(r, s, recovery id)` into a broadcastable
//! legacy transaction.
//!
//! # Responsibilities
//! - Range-check the signature against the secp256k1 group order and
//!   fold high `s` into the lower half
//! - Fold the recovery id and chain ID into the EIP-155 `v`
//! - Serialize, then decode the result again and check it reproduces the
//!   signing hash before anything leaves the process
//! - Recover the signer with ecrecover and compare against the source

use alloy::primitives::{keccak256, uint, Address, Bytes, B256, U256};
use alloy::rlp::{Decodable, Header};

use crate::blockchain::transaction::UnsignedTransaction;
use crate::error::{TransferError, TransferResult};

/// secp256k1 group order `n`.
pub const SECP256K1_ORDER: U256 =
    uint!(0xFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEBAAEDCE6AF48A03BBFD25E8CD0364141_U256);

/// `n / 2`. EIP-2 nodes reject `s` above this.
pub const SECP256K1_HALF_ORDER: U256 =
    uint!(0x7FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF5D576E7357A4501DDFE92F46681B20A0_U256);

/// Offset added to the recovery id under EIP-155.
const EIP155_V_OFFSET: u64 = 35;

/// Parity of the signature's `R` point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecoveryId(u8);

impl RecoveryId {
    /// Recovery id from the y-parity bit.
    pub fn new(odd: bool) -> Self {
        Self(odd as u8)
    }

    /// Interpret the `v` reported by the signing service.
    ///
    /// `0`/`1` are taken as-is. The pre-EIP-155 `27`/`28` form is normalized
    /// so the offset is not applied twice.
    pub fn from_wire(v: u64) -> TransferResult<Self> {
        match v {
            0 | 1 => Ok(Self(v as u8)),
            27 | 28 => {
                tracing::warn!(v = v, "Signing service reported legacy v, normalizing to parity");
                Ok(Self((v - 27) as u8))
            }
            other => Err(TransferError::SignatureOutOfRange(format!(
                "recovery id {} is not a valid parity",
                other
            ))),
        }
    }

    /// `true` for parity 1.
    pub fn is_odd(&self) -> bool {
        self.0 == 1
    }

    pub fn as_u8(&self) -> u8 {
        self.0
    }
}

/// ECDSA signature as delivered by the signing service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    pub r: U256,
    pub s: U256,
    pub recovery_id: RecoveryId,
}

impl Signature {
    pub fn new(r: U256, s: U256, recovery_id: RecoveryId) -> Self {
        Self { r, s, recovery_id }
    }

    /// Reject zero and out-of-order components.
    pub fn validate(&self) -> TransferResult<()> {
        for (name, value) in [("r", self.r), ("s", self.s)] {
            if value.is_zero() {
                return Err(TransferError::SignatureOutOfRange(format!("{} is zero", name)));
            }
            if value >= SECP256K1_ORDER {
                return Err(TransferError::SignatureOutOfRange(format!(
                    "{} is not below the group order",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Equivalent signature with `s` in the lower half of the order.
    ///
    /// `(r, n - s)` with the opposite parity recovers to the same key.
    pub fn normalized(&self) -> Self {
        if self.s <= SECP256K1_HALF_ORDER {
            return *self;
        }
        Self {
            r: self.r,
            s: SECP256K1_ORDER - self.s,
            recovery_id: RecoveryId::new(!self.recovery_id.is_odd()),
        }
    }
}

/// A signed legacy transaction ready for `eth_sendRawTransaction`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    /// RLP bytes.
    pub raw: Bytes,
    /// `keccak256(raw)`.
    pub hash: B256,
    pub v: u64,
    pub r: U256,
    pub s: U256,
}

/// `v = recovery_id + 35 + 2 * chain_id`.
pub fn encode_v(recovery_id: RecoveryId, chain_id: u64) -> TransferResult<u64> {
    chain_id
        .checked_mul(2)
        .and_then(|v| v.checked_add(EIP155_V_OFFSET))
        .and_then(|v| v.checked_add(recovery_id.as_u8() as u64))
        .ok_or_else(|| {
            TransferError::EncodingError(format!("v overflows u64 for chain ID {}", chain_id))
        })
}

/// Inverse of [`encode_v`]. `None` for pre-EIP-155 values.
pub fn decode_v(v: u64) -> Option<(RecoveryId, u64)> {
    let rest = v.checked_sub(EIP155_V_OFFSET)?;
    Some((RecoveryId((rest % 2) as u8), rest / 2))
}

/// Build the raw signed transaction and self-check it.
pub fn assemble(
    unsigned: &UnsignedTransaction,
    signature: &Signature,
    chain_id: u64,
) -> TransferResult<SignedTransaction> {
    if chain_id != unsigned.chain_id {
        return Err(TransferError::EncodingError(format!(
            "chain ID {} does not match transaction chain ID {}",
            chain_id, unsigned.chain_id
        )));
    }
    signature.validate()?;
    let low = signature.normalized();
    if low != *signature {
        tracing::warn!("Signing service returned high s, folded into the lower half");
    }
    let signature = &low;

    let v = encode_v(signature.recovery_id, chain_id)?;
    let raw = unsigned.encode_with_tail(&[&v, &signature.r, &signature.s]);

    check_round_trip(&raw, unsigned, signature)?;

    let hash = keccak256(&raw);
    tracing::debug!(tx_hash = %hash, v = v, len = raw.len(), "Signed transaction assembled");

    Ok(SignedTransaction {
        raw: Bytes::from(raw),
        hash,
        v,
        r: signature.r,
        s: signature.s,
    })
}

/// Address that produced the signature over `unsigned`'s signing hash.
pub fn recover_signer(
    signed: &SignedTransaction,
    unsigned: &UnsignedTransaction,
) -> TransferResult<Address> {
    let (recovery_id, _) = decode_v(signed.v).ok_or_else(|| {
        TransferError::SignatureOutOfRange(format!("v {} is not EIP-155 encoded", signed.v))
    })?;
    alloy::primitives::Signature::new(signed.r, signed.s, recovery_id.is_odd())
        .recover_address_from_prehash(&unsigned.signing_hash())
        .map_err(|e| TransferError::SignatureOutOfRange(format!("ecrecover failed: {}", e)))
}

/// Fail with `SignerMismatch` unless the signature recovers to `expected`.
pub fn verify_signer(
    signed: &SignedTransaction,
    unsigned: &UnsignedTransaction,
    expected: Address,
) -> TransferResult<()> {
    let recovered = recover_signer(signed, unsigned)?;
    if recovered != expected {
        return Err(TransferError::SignerMismatch {
            expected,
            recovered,
        });
    }
    Ok(())
}

/// Fields of a decoded legacy transaction.
struct DecodedLegacy {
    unsigned: UnsignedTransaction,
    recovery_id: RecoveryId,
    r: U256,
    s: U256,
}

fn decode_legacy(mut buf: &[u8]) -> Result<DecodedLegacy, String> {
    let header = Header::decode(&mut buf).map_err(|e| e.to_string())?;
    if !header.list {
        return Err("expected an RLP list".to_string());
    }
    if header.payload_length != buf.len() {
        return Err(format!(
            "list payload is {} bytes, {} remain",
            header.payload_length,
            buf.len()
        ));
    }

    let rlp = |e: alloy::rlp::Error| e.to_string();
    let nonce = u64::decode(&mut buf).map_err(rlp)?;
    let gas_price = u128::decode(&mut buf).map_err(rlp)?;
    let gas_limit = u64::decode(&mut buf).map_err(rlp)?;
    let to = Address::decode(&mut buf).map_err(rlp)?;
    let value = U256::decode(&mut buf).map_err(rlp)?;
    let input = Bytes::decode(&mut buf).map_err(rlp)?;
    let v = u64::decode(&mut buf).map_err(rlp)?;
    let r = U256::decode(&mut buf).map_err(rlp)?;
    let s = U256::decode(&mut buf).map_err(rlp)?;

    if !buf.is_empty() {
        return Err(format!("{} trailing bytes", buf.len()));
    }
    if !input.is_empty() {
        return Err("transfer carries call data".to_string());
    }
    let (recovery_id, chain_id) =
        decode_v(v).ok_or_else(|| format!("v {} is not EIP-155 encoded", v))?;

    Ok(DecodedLegacy {
        unsigned: UnsignedTransaction {
            to,
            value,
            gas_limit,
            gas_price,
            nonce,
            chain_id,
        },
        recovery_id,
        r,
        s,
    })
}

fn check_round_trip(
    raw: &[u8],
    unsigned: &UnsignedTransaction,
    signature: &Signature,
) -> TransferResult<()> {
    let decoded = decode_legacy(raw)
        .map_err(|e| TransferError::EncodingError(format!("round-trip decode failed: {}", e)))?;

    let expected = unsigned.signing_hash();
    let actual = decoded.unsigned.signing_hash();
    if actual != expected {
        return Err(TransferError::EncodingError(format!(
            "round-trip signing hash {} differs from {}",
            actual, expected
        )));
    }
    if decoded.recovery_id != signature.recovery_id
        || decoded.r != signature.r
        || decoded.s != signature.s
    {
        return Err(TransferError::EncodingError(
            "round-trip signature fields differ".to_string(),
        ));
    }
    Ok(())
}
