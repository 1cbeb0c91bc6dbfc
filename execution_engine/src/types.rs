use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use types::phase0::primitives::{ExecutionAddress, UnixSeconds, H256, H64};

/// [`PayloadAttributesV1`](https://github.com/ethereum/execution-apis/blob/b7c5d3420e00648f456744d121ffbd929862924d/src/engine/paris.md#payloadattributesv1)
#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadAttributes {
    #[serde(with = "serde_utils::prefixed_hex_quantity")]
    pub timestamp: UnixSeconds,
    pub prev_randao: H256,
    pub suggested_fee_recipient: ExecutionAddress,
}

/// Identifier of a payload build process started by `engine_forkchoiceUpdated`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Display, From, Deserialize, Serialize)]
#[display("{_0:?}")]
#[serde(transparent)]
pub struct PayloadId(H64);

impl PayloadId {
    #[must_use]
    pub const fn new(bytes: [u8; 8]) -> Self {
        Self(H64(bytes))
    }

    #[must_use]
    pub const fn as_h64(self) -> H64 {
        self.0
    }
}
