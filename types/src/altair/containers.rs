use serde::{Deserialize, Serialize};

use crate::phase0::primitives::SignatureBytes;

const SYNC_COMMITTEE_BITS_BYTES: usize = 64;

#[derive(Clone, PartialEq, Eq, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SyncAggregate {
    #[serde(with = "serde_utils::prefixed_hex_bytes")]
    pub sync_committee_bits: Vec<u8>,
    pub sync_committee_signature: SignatureBytes,
}

impl Default for SyncAggregate {
    // An aggregate with no participants carries the point at infinity, not an all-zero signature.
    fn default() -> Self {
        Self {
            sync_committee_bits: vec![0; SYNC_COMMITTEE_BITS_BYTES],
            sync_committee_signature: SignatureBytes::empty(),
        }
    }
}
