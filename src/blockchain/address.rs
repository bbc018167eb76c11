//! Account address derivation from remotely held public keys.
//!
//! The signing service only ever hands out public keys. The account address
//! is the low 20 bytes of `keccak256` over the 64 coordinate bytes of the
//! uncompressed point; its text form is the EIP-55 checksum.

use alloy::primitives::{keccak256, Address, AddressError};

use crate::error::{TransferError, TransferResult};

/// Length of an uncompressed secp256k1 point including its prefix.
pub const UNCOMPRESSED_KEY_LEN: usize = 65;

/// SEC1 prefix byte of an uncompressed point.
pub const UNCOMPRESSED_PREFIX: u8 = 0x04;

/// Raw public key bytes as returned by the signing service.
///
/// Shape is checked by [`derive_address`], not on construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey(Vec<u8>);

impl PublicKey {
    /// Wrap raw bytes.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Parse the hex form used on the wire (with or without `0x`).
    pub fn from_hex(text: &str) -> TransferResult<Self> {
        let digits = text.strip_prefix("0x").unwrap_or(text);
        hex::decode(digits)
            .map(Self)
            .map_err(|e| TransferError::MalformedKey(format!("invalid hex: {}", e)))
    }

    /// Raw bytes, prefix included.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Derive the account address for an uncompressed public key.
pub fn derive_address(public_key: &PublicKey) -> TransferResult<Address> {
    let bytes = public_key.as_bytes();
    if bytes.len() != UNCOMPRESSED_KEY_LEN {
        return Err(TransferError::MalformedKey(format!(
            "expected {} bytes, got {}",
            UNCOMPRESSED_KEY_LEN,
            bytes.len()
        )));
    }
    if bytes[0] != UNCOMPRESSED_PREFIX {
        return Err(TransferError::MalformedKey(format!(
            "expected prefix 0x{:02x}, got 0x{:02x}",
            UNCOMPRESSED_PREFIX, bytes[0]
        )));
    }

    let digest = keccak256(&bytes[1..]);
    Ok(Address::from_slice(&digest[12..]))
}

/// Parse an operator-supplied address.
///
/// Mixed-case input must carry a valid EIP-55 checksum; all-lowercase or
/// all-uppercase input is accepted as plain hex.
pub fn parse_address(text: &str) -> Result<Address, AddressError> {
    let digits = text.strip_prefix("0x").unwrap_or(text);
    let has_upper = digits.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = digits.chars().any(|c| c.is_ascii_lowercase());

    if has_upper && has_lower {
        Address::parse_checksummed(format!("0x{}", digits), None)
    } else {
        Ok(format!("0x{}", digits).parse::<Address>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // Anvil's first dev account, public half only
    const ANVIL_0_PUBLIC_KEY: &str = "048318535b54105d4a7aae60c08fc45f9687181b4fdfc625bd1a753fa7397fed753547f11ca8696646f2f3acb08e31016afac23e630c5d11f59f61fef57b0d2aa5";

    #[test]
    fn test_derive_known_key() {
        let key = PublicKey::from_hex(ANVIL_0_PUBLIC_KEY).unwrap();
        let address = derive_address(&key).unwrap();
        assert_eq!(
            address.to_checksum(None),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
        );
    }

    #[test]
    fn test_derive_accepts_0x_prefix() {
        let plain = PublicKey::from_hex(ANVIL_0_PUBLIC_KEY).unwrap();
        let prefixed = PublicKey::from_hex(&format!("0x{}", ANVIL_0_PUBLIC_KEY)).unwrap();
        assert_eq!(plain, prefixed);
    }

    #[test]
    fn test_compressed_key_rejected() {
        let key = PublicKey::from_hex(
            "028318535b54105d4a7aae60c08fc45f9687181b4fdfc625bd1a753fa7397fed75",
        )
        .unwrap();
        let err = derive_address(&key).unwrap_err();
        assert!(matches!(err, TransferError::MalformedKey(_)));
        assert!(err.to_string().contains("expected 65 bytes"));
    }

    #[test]
    fn test_wrong_prefix_rejected() {
        let mut bytes = PublicKey::from_hex(ANVIL_0_PUBLIC_KEY).unwrap().as_bytes().to_vec();
        bytes[0] = 0x06;
        let err = derive_address(&PublicKey::from_bytes(bytes)).unwrap_err();
        assert!(err.to_string().contains("prefix"));
    }

    #[test]
    fn test_bad_hex_rejected() {
        assert!(matches!(
            PublicKey::from_hex("04zz"),
            Err(TransferError::MalformedKey(_))
        ));
    }

    #[test]
    fn test_parse_address() {
        let checksummed = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";
        let expected = parse_address(checksummed).unwrap();

        assert_eq!(parse_address(&checksummed.to_lowercase()).unwrap(), expected);
        assert_eq!(
            parse_address("70997970c51812dc3a010c7d01b50e0d17dc79c8").unwrap(),
            expected
        );
        assert!(parse_address("0x70997970c51812dc3A010C7d01b50e0d17dc79C8").is_err());
        assert!(parse_address("0x1234").is_err());
    }

    proptest! {
        #[test]
        fn prop_checksum_lowercases_to_digest_hex(coords in proptest::collection::vec(any::<u8>(), 64)) {
            let mut bytes = vec![UNCOMPRESSED_PREFIX];
            bytes.extend_from_slice(&coords);
            let key = PublicKey::from_bytes(bytes);

            let first = derive_address(&key).unwrap();
            let second = derive_address(&key).unwrap();
            prop_assert_eq!(first, second);

            let expected = format!("0x{}", hex::encode(&keccak256(&coords)[12..]));
            prop_assert_eq!(first.to_checksum(None).to_lowercase(), expected);
        }
    }
}
