use core::time::Duration;
use std::{collections::HashMap, sync::Arc};

use anyhow::{bail, Result};
use async_trait::async_trait;
use types::{
    bellatrix::containers::{ExecutionPayload, ExecutionPayloadHeader},
    combined::{BeaconBlock, BlockSkeleton, BlockSkeletonBody, ExecutionContent, SignedBeaconBlock},
    phase0::{
        containers::Checkpoint,
        primitives::{ExecutionBlockNumber, PublicKeyBytes, SignatureBytes, Slot, ValidatorIndex, H256},
    },
};

use crate::{block_producer::StateTransition, misc::PayloadContext, readiness::BlockStore};

const FINALIZED_ROOT: H256 = H256::repeat_byte(0xf1);

pub struct FakeBlockStore {
    finalized_checkpoint: Checkpoint,
    blocks: HashMap<H256, Arc<SignedBeaconBlock>>,
}

impl FakeBlockStore {
    pub fn genesis() -> Self {
        Self {
            finalized_checkpoint: Checkpoint::default(),
            blocks: HashMap::new(),
        }
    }

    pub fn finalized_at(block_number: ExecutionBlockNumber) -> Self {
        Self::with_finalized_block(ExecutionPayload {
            block_number,
            ..ExecutionPayload::default()
        })
    }

    pub fn finalized_blinded_at(block_number: ExecutionBlockNumber) -> Self {
        Self::with_finalized_block(ExecutionPayloadHeader {
            block_number,
            ..ExecutionPayloadHeader::default()
        })
    }

    pub fn missing_finalized_block() -> Self {
        Self {
            finalized_checkpoint: Checkpoint {
                epoch: 1,
                root: FINALIZED_ROOT,
            },
            blocks: HashMap::new(),
        }
    }

    fn with_finalized_block(execution: impl Into<ExecutionContent>) -> Self {
        let block = BeaconBlock::new(Arc::new(BlockSkeleton::default()), execution)
            .with_signature(SignatureBytes::zero());

        Self {
            finalized_checkpoint: Checkpoint {
                epoch: 1,
                root: FINALIZED_ROOT,
            },
            blocks: HashMap::from([(FINALIZED_ROOT, Arc::new(block))]),
        }
    }
}

#[async_trait]
impl BlockStore for FakeBlockStore {
    async fn finalized_checkpoint(&self) -> Result<Checkpoint> {
        Ok(self.finalized_checkpoint)
    }

    async fn block_by_root(&self, root: H256) -> Result<Option<Arc<SignedBeaconBlock>>> {
        Ok(self.blocks.get(&root).cloned())
    }
}

pub struct FakeStateTransition {
    proposer_index: ValidatorIndex,
    context: PayloadContext,
    delay: Option<Duration>,
    fail_skeleton: bool,
}

impl FakeStateTransition {
    pub fn new(proposer_index: ValidatorIndex) -> Self {
        Self {
            proposer_index,
            context: payload_context(),
            delay: None,
            fail_skeleton: false,
        }
    }

    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub const fn failing(mut self) -> Self {
        self.fail_skeleton = true;
        self
    }
}

#[async_trait]
impl StateTransition for FakeStateTransition {
    async fn build_skeleton(
        &self,
        slot: Slot,
        randao_reveal: SignatureBytes,
        graffiti: H256,
    ) -> Result<BlockSkeleton> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_skeleton {
            bail!("parent state for slot {slot} is not available");
        }

        Ok(BlockSkeleton {
            slot,
            proposer_index: self.proposer_index,
            parent_root: H256::repeat_byte(0x0a),
            state_root: H256::zero(),
            body: BlockSkeletonBody {
                randao_reveal,
                graffiti,
                ..BlockSkeletonBody::default()
            },
        })
    }

    async fn payload_context(&self, _skeleton: &BlockSkeleton) -> Result<PayloadContext> {
        Ok(self.context)
    }

    async fn compute_state_root(&self, block: &BeaconBlock) -> Result<H256> {
        Ok(state_root_of(block.slot(), block.execution().block_number()))
    }
}

pub fn payload_context() -> PayloadContext {
    PayloadContext {
        parent_hash: H256::repeat_byte(0xee),
        timestamp: 1_606_824_059,
        prev_randao: H256::repeat_byte(0xdd),
        proposer_pubkey: PublicKeyBytes::repeat_byte(0xcc),
    }
}

/// The state root [`FakeStateTransition`] computes for a block.
pub fn state_root_of(slot: Slot, block_number: ExecutionBlockNumber) -> H256 {
    H256::from_low_u64_be(slot * 1_000 + block_number)
}
