use builder_api::containers::SignedBuilderBid;
use execution_engine::PayloadId;
use serde::Deserialize;
use strum::{Display, IntoStaticStr};
use types::{
    bellatrix::primitives::Wei,
    combined::BeaconBlock,
    phase0::primitives::{
        ExecutionAddress, ExecutionBlockHash, PublicKeyBytes, UnixSeconds, ValidatorIndex, H256,
    },
};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PayloadIdEntry {
    Cached(PayloadId),
    Live(PayloadId),
}

impl PayloadIdEntry {
    #[must_use]
    pub const fn id(self) -> PayloadId {
        match self {
            Self::Cached(payload_id) | Self::Live(payload_id) => payload_id,
        }
    }
}

#[derive(Deserialize)]
pub struct ProposerData {
    #[serde(with = "serde_utils::string_or_native")]
    pub validator_index: ValidatorIndex,
    pub fee_recipient: ExecutionAddress,
}

/// What the execution layer needs to know to build on top of the current head.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct PayloadContext {
    pub parent_hash: ExecutionBlockHash,
    pub timestamp: UnixSeconds,
    pub prev_randao: H256,
    pub proposer_pubkey: PublicKeyBytes,
}

/// Why a block was built with the local execution engine.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum FallbackReason {
    BuilderNotConfigured,
    BuilderNotReady,
    ProposerNotRegistered,
    NoBuilderBid,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PayloadSource {
    Builder { value: Wei },
    Local { reason: FallbackReason },
}

impl PayloadSource {
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Builder { .. } => "builder",
            Self::Local { .. } => "local",
        }
    }

    #[must_use]
    pub fn reason(self) -> &'static str {
        match self {
            Self::Builder { .. } => "none",
            Self::Local { reason } => reason.into(),
        }
    }

    pub(crate) fn from_bid(bid: &SignedBuilderBid) -> Self {
        Self::Builder {
            value: bid.message.value,
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct BlockProposal {
    pub block: BeaconBlock,
    pub source: PayloadSource,
}

/// Steps of a proposal. Used to report where a deadline expired.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ProposalStep {
    BuildSkeleton,
    PayloadContext,
    CheckReadiness,
    CheckRegistration,
    RequestBuilderHeader,
    LocalPayloadId,
    LocalPayload,
    ComputeStateRoot,
    Reveal,
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use serde_json::json;
    use test_case::test_case;

    use super::*;

    #[test_case(PayloadSource::Builder { value: Wei::from(1) } => ("builder", "none"))]
    #[test_case(
        PayloadSource::Local { reason: FallbackReason::BuilderNotReady } =>
        ("local", "builder_not_ready")
    )]
    #[test_case(
        PayloadSource::Local { reason: FallbackReason::NoBuilderBid } =>
        ("local", "no_builder_bid")
    )]
    fn metric_labels(source: PayloadSource) -> (&'static str, &'static str) {
        (source.path(), source.reason())
    }

    #[test]
    fn proposer_data_accepts_quoted_index() -> Result<()> {
        let proposer = serde_json::from_value::<ProposerData>(json!({
            "validator_index": "40",
            "fee_recipient": "0xabcf8e0d4e9587369b2301d0790347320302cc09",
        }))?;

        assert_eq!(proposer.validator_index, 40);

        Ok(())
    }

    #[test]
    fn payload_id_entry_exposes_id_regardless_of_origin() {
        let payload_id = PayloadId::new([1; 8]);

        assert_eq!(PayloadIdEntry::Cached(payload_id).id(), payload_id);
        assert_eq!(PayloadIdEntry::Live(payload_id).id(), payload_id);
    }
}
