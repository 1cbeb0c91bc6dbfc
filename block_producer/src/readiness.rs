use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use types::{
    combined::SignedBeaconBlock,
    phase0::{containers::Checkpoint, primitives::H256},
};

use crate::error::ChainAccessError;

#[async_trait]
pub trait BlockStore: Send + Sync {
    async fn finalized_checkpoint(&self) -> Result<Checkpoint>;

    async fn block_by_root(&self, root: H256) -> Result<Option<Arc<SignedBeaconBlock>>>;
}

/// Allows builder use only once execution is enabled in a finalized block.
pub struct ReadinessGate {
    block_store: Arc<dyn BlockStore>,
}

impl ReadinessGate {
    #[must_use]
    pub fn new(block_store: Arc<dyn BlockStore>) -> Self {
        Self { block_store }
    }

    pub async fn is_builder_ready(&self) -> Result<bool, ChainAccessError> {
        let Checkpoint { root, .. } = self
            .block_store
            .finalized_checkpoint()
            .await
            .map_err(ChainAccessError::FinalizedCheckpoint)?;

        // Nothing has been finalized since genesis.
        if root.is_zero() {
            return Ok(false);
        }

        let block = self
            .block_store
            .block_by_root(root)
            .await
            .map_err(|error| ChainAccessError::BlockLookup { root, error })?
            .ok_or(ChainAccessError::MissingFinalizedBlock { root })?;

        Ok(block.message.execution().block_number() != 0)
    }
}
