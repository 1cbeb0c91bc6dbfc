#![expect(clippy::module_name_repetitions)]

use std::{collections::HashMap, sync::Arc};

use anyhow::{ensure, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use thiserror::Error;
use types::{
    bellatrix::containers::ExecutionPayload,
    phase0::primitives::{ExecutionBlockHash, ExecutionBlockNumber, H256},
};

use crate::types::{PayloadAttributes, PayloadId};

#[async_trait]
pub trait ExecutionEngine: Send + Sync {
    /// Starts building a payload on top of `parent_hash`.
    ///
    /// Corresponds to [`engine_forkchoiceUpdatedV1`] with payload attributes.
    /// `None` means the execution engine accepted the fork choice update but is not building.
    ///
    /// [`engine_forkchoiceUpdatedV1`]: https://github.com/ethereum/execution-apis/blob/b7c5d3420e00648f456744d121ffbd929862924d/src/engine/paris.md#engine_forkchoiceupdatedv1
    async fn start_payload_build(
        &self,
        parent_hash: ExecutionBlockHash,
        payload_attributes: PayloadAttributes,
    ) -> Result<Option<PayloadId>>;

    /// [`engine_getPayloadV1`](https://github.com/ethereum/execution-apis/blob/b7c5d3420e00648f456744d121ffbd929862924d/src/engine/paris.md#engine_getpayloadv1)
    async fn get_payload(&self, payload_id: PayloadId) -> Result<ExecutionPayload>;
}

#[async_trait]
impl<E: ExecutionEngine + ?Sized> ExecutionEngine for Arc<E> {
    async fn start_payload_build(
        &self,
        parent_hash: ExecutionBlockHash,
        payload_attributes: PayloadAttributes,
    ) -> Result<Option<PayloadId>> {
        self.as_ref()
            .start_payload_build(parent_hash, payload_attributes)
            .await
    }

    async fn get_payload(&self, payload_id: PayloadId) -> Result<ExecutionPayload> {
        self.as_ref().get_payload(payload_id).await
    }
}

#[derive(Clone, Copy)]
pub struct NullExecutionEngine;

#[async_trait]
impl ExecutionEngine for NullExecutionEngine {
    async fn start_payload_build(
        &self,
        _parent_hash: ExecutionBlockHash,
        _payload_attributes: PayloadAttributes,
    ) -> Result<Option<PayloadId>> {
        Ok(None)
    }

    async fn get_payload(&self, payload_id: PayloadId) -> Result<ExecutionPayload> {
        Err(Error::UnknownPayloadId { payload_id }.into())
    }
}

/// Produces payloads from the attributes it was asked to build with.
///
/// Block hashes are derived from payload IDs so that payloads from different builds differ.
pub struct MockExecutionEngine {
    block_number: ExecutionBlockNumber,
    issue_payload_ids: bool,
    serve_payloads: bool,
    builds: Mutex<HashMap<PayloadId, (ExecutionBlockHash, PayloadAttributes)>>,
    build_count: Mutex<u64>,
}

#[async_trait]
impl ExecutionEngine for MockExecutionEngine {
    async fn start_payload_build(
        &self,
        parent_hash: ExecutionBlockHash,
        payload_attributes: PayloadAttributes,
    ) -> Result<Option<PayloadId>> {
        let mut build_count = self.build_count.lock();

        *build_count += 1;

        if !self.issue_payload_ids {
            return Ok(None);
        }

        let payload_id = PayloadId::new(build_count.to_be_bytes());

        self.builds
            .lock()
            .insert(payload_id, (parent_hash, payload_attributes));

        Ok(Some(payload_id))
    }

    async fn get_payload(&self, payload_id: PayloadId) -> Result<ExecutionPayload> {
        ensure!(self.serve_payloads, Error::PayloadUnavailable { payload_id });

        let (parent_hash, payload_attributes) = self
            .builds
            .lock()
            .get(&payload_id)
            .copied()
            .ok_or(Error::UnknownPayloadId { payload_id })?;

        let PayloadAttributes {
            timestamp,
            prev_randao,
            suggested_fee_recipient,
        } = payload_attributes;

        Ok(ExecutionPayload {
            parent_hash,
            fee_recipient: suggested_fee_recipient,
            prev_randao,
            block_number: self.block_number,
            timestamp,
            block_hash: H256::from_low_u64_be(u64::from_be_bytes(payload_id.as_h64().0)),
            ..ExecutionPayload::default()
        })
    }
}

impl MockExecutionEngine {
    #[must_use]
    pub fn new(block_number: ExecutionBlockNumber) -> Self {
        Self {
            block_number,
            issue_payload_ids: true,
            serve_payloads: true,
            builds: Mutex::new(HashMap::new()),
            build_count: Mutex::new(0),
        }
    }

    /// Accepts builds without returning payload IDs, like an engine that is still syncing.
    #[must_use]
    pub const fn without_payload_ids(mut self) -> Self {
        self.issue_payload_ids = false;
        self
    }

    #[must_use]
    pub const fn without_payloads(mut self) -> Self {
        self.serve_payloads = false;
        self
    }

    #[must_use]
    pub fn build_count(&self) -> u64 {
        *self.build_count.lock()
    }

    #[must_use]
    pub fn build_parameters(
        &self,
        payload_id: PayloadId,
    ) -> Option<(ExecutionBlockHash, PayloadAttributes)> {
        self.builds.lock().get(&payload_id).copied()
    }
}

#[derive(Debug, Error)]
enum Error {
    #[error("execution engine is not building payload {payload_id}")]
    UnknownPayloadId { payload_id: PayloadId },
    #[error("execution engine failed to return payload {payload_id}")]
    PayloadUnavailable { payload_id: PayloadId },
}
