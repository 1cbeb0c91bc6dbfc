//! Blocks as seen by the proposer.
//!
//! A full block and a blinded block differ only in what they carry for the execution layer.
//! Both share the same [`BlockSkeleton`], so switching between them never copies operations.

use std::sync::Arc;

use derive_more::From;
use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::{
    altair::containers::SyncAggregate,
    bellatrix::containers::{ExecutionPayload, ExecutionPayloadHeader},
    phase0::{
        containers::{
            Attestation, AttesterSlashing, Deposit, Eth1Data, ProposerSlashing,
            SignedVoluntaryExit,
        },
        primitives::{
            ExecutionBlockHash, ExecutionBlockNumber, SignatureBytes, Slot, ValidatorIndex, H256,
        },
    },
};

/// Everything in a block except the execution layer content.
#[derive(Clone, PartialEq, Eq, Default, Debug)]
pub struct BlockSkeleton {
    pub slot: Slot,
    pub proposer_index: ValidatorIndex,
    pub parent_root: H256,
    pub state_root: H256,
    pub body: BlockSkeletonBody,
}

#[derive(Clone, PartialEq, Eq, Default, Debug, Deserialize, Serialize)]
pub struct BlockSkeletonBody {
    pub randao_reveal: SignatureBytes,
    pub eth1_data: Eth1Data,
    pub graffiti: H256,
    pub proposer_slashings: Vec<ProposerSlashing>,
    pub attester_slashings: Vec<AttesterSlashing>,
    pub attestations: Vec<Attestation>,
    pub deposits: Vec<Deposit>,
    pub voluntary_exits: Vec<SignedVoluntaryExit>,
    pub sync_aggregate: SyncAggregate,
}

#[derive(Clone, PartialEq, Eq, Debug, From)]
pub enum ExecutionContent {
    Payload(ExecutionPayload),
    Header(ExecutionPayloadHeader),
}

impl ExecutionContent {
    #[must_use]
    pub const fn block_number(&self) -> ExecutionBlockNumber {
        match self {
            Self::Payload(payload) => payload.block_number,
            Self::Header(header) => header.block_number,
        }
    }

    #[must_use]
    pub const fn block_hash(&self) -> ExecutionBlockHash {
        match self {
            Self::Payload(payload) => payload.block_hash,
            Self::Header(header) => header.block_hash,
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct BeaconBlock {
    skeleton: Arc<BlockSkeleton>,
    execution: ExecutionContent,
}

impl BeaconBlock {
    #[must_use]
    pub fn new(skeleton: Arc<BlockSkeleton>, execution: impl Into<ExecutionContent>) -> Self {
        Self {
            skeleton,
            execution: execution.into(),
        }
    }

    #[must_use]
    pub const fn skeleton(&self) -> &Arc<BlockSkeleton> {
        &self.skeleton
    }

    #[must_use]
    pub const fn execution(&self) -> &ExecutionContent {
        &self.execution
    }

    #[must_use]
    pub fn slot(&self) -> Slot {
        self.skeleton.slot
    }

    #[must_use]
    pub fn proposer_index(&self) -> ValidatorIndex {
        self.skeleton.proposer_index
    }

    #[must_use]
    pub fn state_root(&self) -> H256 {
        self.skeleton.state_root
    }

    #[must_use]
    pub const fn is_blinded(&self) -> bool {
        matches!(self.execution, ExecutionContent::Header(_))
    }

    #[must_use]
    pub const fn execution_payload(&self) -> Option<&ExecutionPayload> {
        match &self.execution {
            ExecutionContent::Payload(payload) => Some(payload),
            ExecutionContent::Header(_) => None,
        }
    }

    #[must_use]
    pub const fn execution_payload_header(&self) -> Option<&ExecutionPayloadHeader> {
        match &self.execution {
            ExecutionContent::Payload(_) => None,
            ExecutionContent::Header(header) => Some(header),
        }
    }

    /// Replaces the execution content while keeping the same skeleton.
    #[must_use]
    pub fn with_execution_payload(&self, payload: ExecutionPayload) -> Self {
        Self::new(Arc::clone(&self.skeleton), payload)
    }

    #[must_use]
    pub fn with_state_root(self, state_root: H256) -> Self {
        if self.skeleton.state_root == state_root {
            return self;
        }

        let skeleton = BlockSkeleton {
            state_root,
            ..BlockSkeleton::clone(&self.skeleton)
        };

        Self {
            skeleton: Arc::new(skeleton),
            execution: self.execution,
        }
    }

    #[must_use]
    pub fn with_signature(self, signature: SignatureBytes) -> SignedBeaconBlock {
        SignedBeaconBlock {
            message: self,
            signature,
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SignedBeaconBlock {
    pub message: BeaconBlock,
    pub signature: SignatureBytes,
}

impl SignedBeaconBlock {
    #[must_use]
    pub fn slot(&self) -> Slot {
        self.message.slot()
    }

    #[must_use]
    pub fn proposer_index(&self) -> ValidatorIndex {
        self.message.proposer_index()
    }

    #[must_use]
    pub const fn is_blinded(&self) -> bool {
        self.message.is_blinded()
    }

    /// Reveals a blinded block. The signature stays valid because the payload matches the header.
    #[must_use]
    pub fn with_execution_payload(&self, payload: ExecutionPayload) -> Self {
        Self {
            message: self.message.with_execution_payload(payload),
            signature: self.signature,
        }
    }
}

#[derive(Debug, Error)]
pub enum BlockFormatError {
    #[error("block body contains both execution_payload and execution_payload_header")]
    BothExecutionFields,
    #[error("block body contains neither execution_payload nor execution_payload_header")]
    NoExecutionField,
}

#[derive(Serialize)]
struct BeaconBlockRef<'block> {
    #[serde(with = "serde_utils::string_or_native")]
    slot: Slot,
    #[serde(with = "serde_utils::string_or_native")]
    proposer_index: ValidatorIndex,
    parent_root: H256,
    state_root: H256,
    body: BeaconBlockBodyRef<'block>,
}

#[derive(Serialize)]
struct BeaconBlockBodyRef<'block> {
    #[serde(flatten)]
    common: &'block BlockSkeletonBody,
    #[serde(skip_serializing_if = "Option::is_none")]
    execution_payload: Option<&'block ExecutionPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    execution_payload_header: Option<&'block ExecutionPayloadHeader>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct BeaconBlockRepr {
    #[serde(with = "serde_utils::string_or_native")]
    slot: Slot,
    #[serde(with = "serde_utils::string_or_native")]
    proposer_index: ValidatorIndex,
    parent_root: H256,
    state_root: H256,
    body: BeaconBlockBodyRepr,
}

#[derive(Deserialize)]
struct BeaconBlockBodyRepr {
    #[serde(flatten)]
    common: BlockSkeletonBody,
    execution_payload: Option<ExecutionPayload>,
    execution_payload_header: Option<ExecutionPayloadHeader>,
}

impl Serialize for BeaconBlock {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let BlockSkeleton {
            slot,
            proposer_index,
            parent_root,
            state_root,
            ref body,
        } = *self.skeleton;

        BeaconBlockRef {
            slot,
            proposer_index,
            parent_root,
            state_root,
            body: BeaconBlockBodyRef {
                common: body,
                execution_payload: self.execution_payload(),
                execution_payload_header: self.execution_payload_header(),
            },
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for BeaconBlock {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        BeaconBlockRepr::deserialize(deserializer)?
            .try_into()
            .map_err(D::Error::custom)
    }
}

impl TryFrom<BeaconBlockRepr> for BeaconBlock {
    type Error = BlockFormatError;

    fn try_from(repr: BeaconBlockRepr) -> Result<Self, Self::Error> {
        let BeaconBlockRepr {
            slot,
            proposer_index,
            parent_root,
            state_root,
            body:
                BeaconBlockBodyRepr {
                    common,
                    execution_payload,
                    execution_payload_header,
                },
        } = repr;

        let execution = match (execution_payload, execution_payload_header) {
            (Some(payload), None) => ExecutionContent::Payload(payload),
            (None, Some(header)) => ExecutionContent::Header(header),
            (Some(_), Some(_)) => return Err(BlockFormatError::BothExecutionFields),
            (None, None) => return Err(BlockFormatError::NoExecutionField),
        };

        let skeleton = BlockSkeleton {
            slot,
            proposer_index,
            parent_root,
            state_root,
            body: common,
        };

        Ok(Self::new(Arc::new(skeleton), execution))
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use serde_json::json;

    use super::*;

    fn skeleton() -> Arc<BlockSkeleton> {
        Arc::new(BlockSkeleton {
            slot: 3,
            proposer_index: 40,
            parent_root: H256::repeat_byte(1),
            body: BlockSkeletonBody {
                graffiti: H256::repeat_byte(2),
                ..BlockSkeletonBody::default()
            },
            ..BlockSkeleton::default()
        })
    }

    fn header() -> ExecutionPayloadHeader {
        ExecutionPayloadHeader {
            block_number: 123,
            block_hash: H256::repeat_byte(3),
            ..ExecutionPayloadHeader::default()
        }
    }

    #[test]
    fn blinded_and_full_blocks_share_the_skeleton() {
        let blinded = BeaconBlock::new(skeleton(), header());

        let full = blinded.with_execution_payload(ExecutionPayload {
            block_number: 123,
            ..ExecutionPayload::default()
        });

        assert!(blinded.is_blinded());
        assert!(!full.is_blinded());
        assert!(Arc::ptr_eq(blinded.skeleton(), full.skeleton()));
        assert_eq!(full.execution().block_number(), 123);
    }

    #[test]
    fn setting_state_root_leaves_original_skeleton_untouched() {
        let skeleton = skeleton();
        let block = BeaconBlock::new(Arc::clone(&skeleton), header());

        let with_root = block.clone().with_state_root(H256::repeat_byte(9));

        assert_eq!(with_root.state_root(), H256::repeat_byte(9));
        assert_eq!(skeleton.state_root, H256::zero());
        assert_eq!(block.state_root(), H256::zero());
        assert_eq!(with_root.slot(), block.slot());
    }

    #[test]
    fn blinded_block_json_carries_header_under_body() -> Result<()> {
        let block = BeaconBlock::new(skeleton(), header());
        let json = serde_json::to_value(&block)?;

        assert_eq!(json["slot"], json!("3"));
        assert_eq!(json["proposer_index"], json!("40"));
        assert_eq!(json["body"]["execution_payload_header"]["block_number"], json!("123"));
        assert!(json["body"].get("execution_payload").is_none());
        assert_eq!(serde_json::from_value::<BeaconBlock>(json)?, block);

        Ok(())
    }

    #[test]
    fn signed_full_block_round_trips() -> Result<()> {
        let block = BeaconBlock::new(skeleton(), ExecutionPayload::default())
            .with_signature(SignatureBytes::repeat_byte(7));

        let json = serde_json::to_value(&block)?;

        assert!(json["message"]["body"].get("execution_payload").is_some());
        assert_eq!(serde_json::from_value::<SignedBeaconBlock>(json)?, block);

        Ok(())
    }

    #[test]
    fn body_without_execution_content_is_rejected() -> Result<()> {
        let mut json = serde_json::to_value(BeaconBlock::new(skeleton(), header()))?;

        if let Some(body) = json["body"].as_object_mut() {
            body.remove("execution_payload_header");
        }

        assert!(serde_json::from_value::<BeaconBlock>(json).is_err());

        Ok(())
    }
}
