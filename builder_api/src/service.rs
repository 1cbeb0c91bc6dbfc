use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use types::{
    bellatrix::containers::ExecutionPayload,
    combined::SignedBeaconBlock,
    phase0::primitives::{ExecutionBlockHash, PublicKeyBytes, Slot},
};

use crate::containers::SignedBuilderBid;

/// What block production needs from a builder relay.
#[async_trait]
pub trait BuilderService: Send + Sync {
    /// Whether a builder endpoint is configured. Checked before any request is made.
    fn is_configured(&self) -> bool;

    /// `Ok(None)` means the builder has no bid for the slot.
    async fn get_header(
        &self,
        slot: Slot,
        parent_hash: ExecutionBlockHash,
        pubkey: PublicKeyBytes,
    ) -> Result<Option<SignedBuilderBid>>;

    /// Hands over a signed blinded block and receives the payload its header commits to.
    async fn submit_blinded_block(&self, block: &SignedBeaconBlock) -> Result<ExecutionPayload>;
}

#[async_trait]
impl<B: BuilderService + ?Sized> BuilderService for Arc<B> {
    fn is_configured(&self) -> bool {
        self.as_ref().is_configured()
    }

    async fn get_header(
        &self,
        slot: Slot,
        parent_hash: ExecutionBlockHash,
        pubkey: PublicKeyBytes,
    ) -> Result<Option<SignedBuilderBid>> {
        self.as_ref().get_header(slot, parent_hash, pubkey).await
    }

    async fn submit_blinded_block(&self, block: &SignedBeaconBlock) -> Result<ExecutionPayload> {
        self.as_ref().submit_blinded_block(block).await
    }
}
