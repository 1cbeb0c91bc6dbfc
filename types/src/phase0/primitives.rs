use derive_more::derive::AsRef;
use fixed_hash::construct_fixed_hash;
use impl_serde::impl_fixed_hash_serde;

pub use ethereum_types::{H160, H256, H64};

pub type CommitteeIndex = u64;
pub type DepositIndex = u64;
pub type Epoch = u64;
pub type ExecutionAddress = H160;
pub type ExecutionBlockHash = H256;
pub type ExecutionBlockNumber = u64;
pub type Gwei = u64;
pub type Slot = u64;
pub type UnixSeconds = u64;
pub type ValidatorIndex = u64;

pub const PUBLIC_KEY_SIZE: usize = 48;
pub const SIGNATURE_SIZE: usize = 96;

// Keys and signatures are carried around in compressed form.
// Decompression and verification belong to the signer, not to block production.

construct_fixed_hash! {
    #[derive(AsRef)]
    pub struct PublicKeyBytes(PUBLIC_KEY_SIZE);
}

impl_fixed_hash_serde!(PublicKeyBytes, PUBLIC_KEY_SIZE);

construct_fixed_hash! {
    #[derive(AsRef)]
    pub struct SignatureBytes(SIGNATURE_SIZE);
}

impl_fixed_hash_serde!(SignatureBytes, SIGNATURE_SIZE);

impl SignatureBytes {
    /// The compressed point at infinity.
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        let mut bytes = Self::zero();
        bytes.as_mut()[0] = 0xc0;
        bytes
    }

    #[inline]
    #[must_use]
    pub fn is_empty(self) -> bool {
        self == Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn public_key_bytes_serialize_as_prefixed_hex() -> serde_json::Result<()> {
        let pubkey = PublicKeyBytes::repeat_byte(0xab);
        let expected = format!("0x{}", "ab".repeat(PUBLIC_KEY_SIZE));

        assert_eq!(serde_json::to_value(pubkey)?, json!(expected));
        assert_eq!(serde_json::from_value::<PublicKeyBytes>(json!(expected))?, pubkey);

        Ok(())
    }

    #[test]
    fn public_key_bytes_reject_wrong_length() {
        assert!(serde_json::from_value::<PublicKeyBytes>(json!("0xabcd")).is_err());
    }

    #[test]
    fn empty_signature_is_point_at_infinity() {
        let signature = SignatureBytes::empty();

        assert!(signature.is_empty());
        assert_eq!(signature.as_bytes()[0], 0xc0);
        assert!(!SignatureBytes::zero().is_empty());
    }
}
