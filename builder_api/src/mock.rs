use anyhow::{bail, ensure, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use types::{
    bellatrix::containers::ExecutionPayload,
    combined::SignedBeaconBlock,
    phase0::primitives::{ExecutionBlockHash, PublicKeyBytes, Slot},
};

use crate::{
    containers::SignedBuilderBid,
    service::BuilderService,
    BuilderApiError,
};

/// In-process builder with scripted answers.
///
/// An unconfigured `MockBuilder` stands for a node started without a builder URL.
#[derive(Default)]
pub struct MockBuilder {
    configured: bool,
    bid: Option<SignedBuilderBid>,
    payload: Option<ExecutionPayload>,
    header_error: Option<String>,
    header_requests: Mutex<Vec<(Slot, ExecutionBlockHash, PublicKeyBytes)>>,
    submitted_blocks: Mutex<Vec<SignedBeaconBlock>>,
}

impl MockBuilder {
    #[must_use]
    pub fn configured() -> Self {
        Self {
            configured: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn not_configured() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_bid(mut self, bid: SignedBuilderBid) -> Self {
        self.bid = Some(bid);
        self
    }

    #[must_use]
    pub fn with_payload(mut self, payload: ExecutionPayload) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Makes header requests fail the way a relay rejecting the request would.
    #[must_use]
    pub fn with_header_error(mut self, message: impl Into<String>) -> Self {
        self.header_error = Some(message.into());
        self
    }

    #[must_use]
    pub fn header_request_count(&self) -> usize {
        self.header_requests.lock().len()
    }

    #[must_use]
    pub fn header_requests(&self) -> Vec<(Slot, ExecutionBlockHash, PublicKeyBytes)> {
        self.header_requests.lock().clone()
    }

    #[must_use]
    pub fn submitted_blocks(&self) -> Vec<SignedBeaconBlock> {
        self.submitted_blocks.lock().clone()
    }
}

#[async_trait]
impl BuilderService for MockBuilder {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn get_header(
        &self,
        slot: Slot,
        parent_hash: ExecutionBlockHash,
        pubkey: PublicKeyBytes,
    ) -> Result<Option<SignedBuilderBid>> {
        ensure!(self.configured, "builder is not configured");

        self.header_requests.lock().push((slot, parent_hash, pubkey));

        if let Some(message) = self.header_error.clone() {
            bail!(BuilderApiError::BadRequest { message });
        }

        Ok(self.bid.clone())
    }

    async fn submit_blinded_block(&self, block: &SignedBeaconBlock) -> Result<ExecutionPayload> {
        ensure!(self.configured, "builder is not configured");

        let slot = block.slot();

        let Some(header) = block.message.execution_payload_header() else {
            bail!(BuilderApiError::BlockNotBlinded { slot });
        };

        self.submitted_blocks.lock().push(block.clone());

        let Some(payload) = self.payload.clone() else {
            bail!(BuilderApiError::BuilderNodeInternalError {
                message: format!("no payload for block at slot {slot}"),
            });
        };

        ensure!(
            header.commits_to(&payload),
            BuilderApiError::PayloadMismatch {
                header_hash: header.block_hash,
                payload_hash: payload.block_hash,
            },
        );

        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use types::{
        bellatrix::containers::ExecutionPayloadHeader,
        combined::{BeaconBlock, BlockSkeleton},
        phase0::primitives::{SignatureBytes, H256},
    };

    use crate::containers::BuilderBid;

    use super::*;

    fn payload() -> ExecutionPayload {
        ExecutionPayload {
            block_number: 123,
            block_hash: H256::repeat_byte(1),
            ..ExecutionPayload::default()
        }
    }

    fn bid(header: ExecutionPayloadHeader) -> SignedBuilderBid {
        SignedBuilderBid {
            message: BuilderBid {
                header,
                value: 5.into(),
                pubkey: PublicKeyBytes::zero(),
            },
            signature: SignatureBytes::zero(),
        }
    }

    #[tokio::test]
    async fn records_header_requests() -> Result<()> {
        let header = payload().to_header(H256::zero());
        let builder = MockBuilder::configured().with_bid(bid(header.clone()));

        let received = builder
            .get_header(3, H256::zero(), PublicKeyBytes::zero())
            .await?;

        assert_eq!(received.map(|bid| bid.message.header), Some(header));
        assert_eq!(
            builder.header_requests(),
            [(3, H256::zero(), PublicKeyBytes::zero())],
        );

        Ok(())
    }

    #[tokio::test]
    async fn scripted_header_error_is_builder_error() {
        let builder = MockBuilder::configured().with_header_error("unknown validator");

        let error = builder
            .get_header(3, H256::zero(), PublicKeyBytes::zero())
            .await
            .expect_err("header error should be returned");

        assert_eq!(
            error.downcast::<BuilderApiError>().ok(),
            Some(BuilderApiError::BadRequest {
                message: "unknown validator".to_owned(),
            }),
        );
    }

    #[tokio::test]
    async fn reveals_payload_matching_header() -> Result<()> {
        let header = payload().to_header(H256::zero());
        let builder = MockBuilder::configured().with_payload(payload());

        let block = BeaconBlock::new(Arc::new(BlockSkeleton::default()), header)
            .with_signature(SignatureBytes::zero());

        assert_eq!(builder.submit_blinded_block(&block).await?, payload());
        assert_eq!(builder.submitted_blocks(), [block]);

        Ok(())
    }
}
