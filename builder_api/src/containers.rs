//! Containers from the [Builder API specification].
//!
//! [Builder API specification]: https://github.com/ethereum/builder-specs/blob/v0.4.0/specs/bellatrix/builder.md

use serde::{Deserialize, Serialize};
use types::{
    bellatrix::{
        containers::{ExecutionPayload, ExecutionPayloadHeader},
        primitives::{Gas, Wei},
    },
    phase0::primitives::{ExecutionAddress, PublicKeyBytes, SignatureBytes, UnixSeconds},
};

#[derive(Clone, PartialEq, Eq, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BuilderBid {
    pub header: ExecutionPayloadHeader,
    #[serde(with = "serde_utils::decimal_u256")]
    pub value: Wei,
    pub pubkey: PublicKeyBytes,
}

#[derive(Clone, PartialEq, Eq, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SignedBuilderBid {
    pub message: BuilderBid,
    pub signature: SignatureBytes,
}

impl SignedBuilderBid {
    #[must_use]
    pub const fn header(&self) -> &ExecutionPayloadHeader {
        &self.message.header
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ValidatorRegistrationV1 {
    pub fee_recipient: ExecutionAddress,
    #[serde(with = "serde_utils::string_or_native")]
    pub gas_limit: Gas,
    #[serde(with = "serde_utils::string_or_native")]
    pub timestamp: UnixSeconds,
    pub pubkey: PublicKeyBytes,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SignedValidatorRegistrationV1 {
    pub message: ValidatorRegistrationV1,
    pub signature: SignatureBytes,
}

/// The `{ "version": ..., "data": ... }` envelope builders wrap their responses in.
#[derive(Clone, PartialEq, Eq, Debug, Deserialize, Serialize)]
#[serde(rename_all = "lowercase", tag = "version", content = "data")]
pub enum Versioned<T> {
    Bellatrix(T),
}

impl<T> Versioned<T> {
    pub fn into_data(self) -> T {
        match self {
            Self::Bellatrix(data) => data,
        }
    }
}

pub type VersionedBuilderBid = Versioned<SignedBuilderBid>;
pub type VersionedExecutionPayload = Versioned<ExecutionPayload>;
