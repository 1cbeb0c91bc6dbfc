use std::sync::Arc;

use builder_api::BuilderService;
use log::{info, warn};
use types::combined::SignedBeaconBlock;

use crate::error::UnblindError;

enum RevealState<'builder> {
    NotBlinded,
    BuilderNotConfigured,
    Submitting(&'builder dyn BuilderService),
}

/// Turns signed blinded blocks back into full blocks by submitting them to the builder.
pub struct Unblinder {
    builder: Option<Arc<dyn BuilderService>>,
}

impl Unblinder {
    #[must_use]
    pub fn new(builder: Option<Arc<dyn BuilderService>>) -> Self {
        Self { builder }
    }

    /// Full blocks are returned unchanged. So are blinded blocks if no builder is configured.
    ///
    /// A failed submission is not retried. The builder may have published the block already.
    pub async fn reveal(&self, block: SignedBeaconBlock) -> Result<SignedBeaconBlock, UnblindError> {
        let builder = match self.state(&block) {
            RevealState::NotBlinded => return Ok(block),
            RevealState::BuilderNotConfigured => {
                warn!(
                    "received blinded block for slot {} but no builder is configured",
                    block.slot(),
                );

                return Ok(block);
            }
            RevealState::Submitting(builder) => builder,
        };

        let slot = block.slot();
        let proposer_index = block.proposer_index();

        let payload = builder
            .submit_blinded_block(&block)
            .await
            .map_err(|error| UnblindError::Submission { slot, error })?;

        let revealed = block.with_execution_payload(payload);

        debug_assert_eq!(revealed.slot(), slot);
        debug_assert_eq!(revealed.proposer_index(), proposer_index);

        info!(
            "revealed blinded block for slot {slot} with execution block {:?}",
            revealed.message.execution().block_hash(),
        );

        Ok(revealed)
    }

    fn state(&self, block: &SignedBeaconBlock) -> RevealState<'_> {
        if !block.is_blinded() {
            return RevealState::NotBlinded;
        }

        match self.builder.as_deref() {
            Some(builder) if builder.is_configured() => RevealState::Submitting(builder),
            _ => RevealState::BuilderNotConfigured,
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use builder_api::MockBuilder;
    use types::{
        bellatrix::containers::ExecutionPayload,
        combined::{BeaconBlock, BlockSkeleton},
        phase0::primitives::{SignatureBytes, H256},
    };

    use super::*;

    fn payload() -> ExecutionPayload {
        ExecutionPayload {
            block_number: 123,
            block_hash: H256::repeat_byte(0xbb),
            ..ExecutionPayload::default()
        }
    }

    fn builder_service(builder: &Arc<MockBuilder>) -> Arc<dyn BuilderService> {
        builder.clone()
    }

    fn blinded_block() -> SignedBeaconBlock {
        let skeleton = BlockSkeleton {
            slot: 3,
            proposer_index: 40,
            ..BlockSkeleton::default()
        };

        BeaconBlock::new(Arc::new(skeleton), payload().to_header(H256::zero()))
            .with_signature(SignatureBytes::repeat_byte(9))
    }

    #[tokio::test]
    async fn full_block_passes_through() -> Result<()> {
        let builder = Arc::new(MockBuilder::configured().with_payload(payload()));
        let unblinder = Unblinder::new(Some(builder_service(&builder)));
        let full_block = blinded_block().with_execution_payload(payload());

        assert_eq!(unblinder.reveal(full_block.clone()).await?, full_block);
        assert!(builder.submitted_blocks().is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn blinded_block_passes_through_without_builder() -> Result<()> {
        let block = blinded_block();

        for unblinder in [
            Unblinder::new(None),
            Unblinder::new(Some(Arc::new(MockBuilder::not_configured()))),
        ] {
            assert_eq!(unblinder.reveal(block.clone()).await?, block);
        }

        Ok(())
    }

    #[tokio::test]
    async fn revealed_block_keeps_skeleton_and_signature() -> Result<()> {
        let builder = Arc::new(MockBuilder::configured().with_payload(payload()));
        let unblinder = Unblinder::new(Some(builder_service(&builder)));
        let block = blinded_block();

        let revealed = unblinder.reveal(block.clone()).await?;

        assert!(!revealed.is_blinded());
        assert_eq!(revealed.slot(), 3);
        assert_eq!(revealed.proposer_index(), 40);
        assert_eq!(revealed.message.execution_payload(), Some(&payload()));
        assert_eq!(revealed.signature, block.signature);
        assert!(Arc::ptr_eq(
            revealed.message.skeleton(),
            block.message.skeleton(),
        ));
        assert_eq!(builder.submitted_blocks(), [block]);

        Ok(())
    }

    #[tokio::test]
    async fn submission_failure_is_not_retried() {
        let builder = Arc::new(MockBuilder::configured());
        let unblinder = Unblinder::new(Some(builder_service(&builder)));

        let result = unblinder.reveal(blinded_block()).await;

        assert!(matches!(
            result,
            Err(UnblindError::Submission { slot: 3, .. }),
        ));
        assert_eq!(builder.submitted_blocks().len(), 1);
    }
}
