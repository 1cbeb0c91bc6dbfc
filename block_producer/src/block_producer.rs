use core::{future::Future, time::Duration};
use std::{collections::HashMap, sync::Arc};

use anyhow::Result;
use async_trait::async_trait;
use builder_api::{containers::SignedBuilderBid, BuilderService};
use execution_engine::{ExecutionEngine, PayloadAttributes};
use futures::lock::Mutex;
use log::{info, warn};
use prometheus_metrics::Metrics;
use tokio::time::Instant;
use types::{
    bellatrix::containers::ExecutionPayload,
    combined::{BeaconBlock, BlockSkeleton, SignedBeaconBlock},
    misc,
    phase0::primitives::{
        Epoch, ExecutionAddress, ExecutionBlockHash, SignatureBytes, Slot, ValidatorIndex, H256,
    },
};

use crate::{
    blinded_block,
    error::{Error, HeaderFetchError},
    header_fetcher,
    misc::{
        BlockProposal, FallbackReason, PayloadContext, PayloadIdEntry, PayloadSource,
        ProposalStep, ProposerData,
    },
    payload_id_cache::PayloadIdCache,
    readiness::{BlockStore, ReadinessGate},
    registrations::{RegistrationStore, ValidatorRegistrationStore},
    unblinder::Unblinder,
    log_with_feature,
};

pub const DEFAULT_PROPOSAL_TIMEOUT: Duration = Duration::from_secs(4);
pub const DEFAULT_REVEAL_TIMEOUT: Duration = Duration::from_secs(4);

/// Consensus-side operations needed to produce a block.
#[async_trait]
pub trait StateTransition: Send + Sync {
    /// Builds everything except the execution content, with operations taken from the pools.
    async fn build_skeleton(
        &self,
        slot: Slot,
        randao_reveal: SignatureBytes,
        graffiti: H256,
    ) -> Result<BlockSkeleton>;

    async fn payload_context(&self, skeleton: &BlockSkeleton) -> Result<PayloadContext>;

    /// Root of the post-state of applying `block` to its parent state.
    async fn compute_state_root(&self, block: &BeaconBlock) -> Result<H256>;
}

#[derive(Clone, Copy, Debug)]
pub struct Options {
    pub proposal_timeout: Duration,
    pub reveal_timeout: Duration,
    pub default_fee_recipient: ExecutionAddress,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            proposal_timeout: DEFAULT_PROPOSAL_TIMEOUT,
            reveal_timeout: DEFAULT_REVEAL_TIMEOUT,
            default_fee_recipient: ExecutionAddress::zero(),
        }
    }
}

#[derive(Clone)]
pub struct BlockProducer {
    producer_context: Arc<ProducerContext>,
}

impl BlockProducer {
    #[must_use]
    pub fn new(
        state_transition: Arc<dyn StateTransition>,
        block_store: Arc<dyn BlockStore>,
        registration_store: Option<Arc<dyn RegistrationStore>>,
        builder: Option<Arc<dyn BuilderService>>,
        execution_engine: Arc<dyn ExecutionEngine>,
        metrics: Option<Arc<Metrics>>,
        options: Option<Options>,
    ) -> Self {
        let producer_context = Arc::new(ProducerContext {
            state_transition,
            readiness_gate: ReadinessGate::new(block_store),
            registrations: ValidatorRegistrationStore::new(registration_store),
            unblinder: Unblinder::new(builder.clone()),
            builder,
            execution_engine,
            payload_id_cache: PayloadIdCache::default(),
            prepared_proposers: Mutex::new(HashMap::new()),
            metrics,
            options: options.unwrap_or_default(),
        });

        Self { producer_context }
    }

    pub async fn add_new_prepared_proposers(
        &self,
        proposers: impl IntoIterator<Item = ProposerData> + Send,
    ) {
        let mut prepared_proposers = self.producer_context.prepared_proposers.lock().await;

        for proposer in proposers {
            prepared_proposers.insert(proposer.validator_index, proposer.fee_recipient);
        }
    }

    pub async fn get_prepared_proposer_indices(&self) -> Vec<ValidatorIndex> {
        self.producer_context
            .prepared_proposers
            .lock()
            .await
            .keys()
            .copied()
            .collect()
    }

    pub async fn no_prepared_proposers(&self) -> bool {
        self.producer_context
            .prepared_proposers
            .lock()
            .await
            .is_empty()
    }

    pub fn discard_old_data(&self, current_epoch: Epoch) {
        let start_slot = misc::compute_start_slot_at_epoch(current_epoch);
        let removed = self.producer_context.payload_id_cache.prune(start_slot);

        log_with_feature(format_args!(
            "discarded {removed} payload IDs for slots before {start_slot} (epoch {current_epoch})",
        ));
    }

    pub async fn track_collection_metrics(&self) {
        if let Some(metrics) = self.producer_context.metrics.as_ref() {
            let type_name = tynm::type_name::<Self>();

            metrics.set_collection_length(
                &type_name,
                "payload_id_cache",
                self.producer_context.payload_id_cache.len(),
            );

            metrics.set_collection_length(
                &type_name,
                "prepared_proposers",
                self.producer_context.prepared_proposers.lock().await.len(),
            );
        }
    }

    /// Starts a local build ahead of the proposal so that [`Self::propose_block`] can reuse it.
    pub async fn prepare_execution_payload_for_slot(
        &self,
        slot: Slot,
        proposer_index: ValidatorIndex,
        parent_hash: ExecutionBlockHash,
        payload_attributes: PayloadAttributes,
    ) {
        let payload_id = self
            .producer_context
            .execution_engine
            .start_payload_build(parent_hash, payload_attributes)
            .await;

        match payload_id {
            Ok(Some(payload_id)) => {
                info!(
                    "started work on execution payload with id {payload_id} \
                     for parent {parent_hash:?} at slot {slot}",
                );

                self.producer_context
                    .payload_id_cache
                    .set(slot, proposer_index, payload_id);
            }
            Ok(None) => warn!(
                "could not prepare execution payload: payload_id is None; \
                 ensure that multiple consensus clients are not driving the same execution client",
            ),
            Err(error) => warn!("error while preparing execution payload: {error:?}"),
        }
    }

    /// Produces an unsigned block for `slot`, using the builder when allowed and available.
    ///
    /// Builder unavailability leads to a locally built block.
    /// Errors from a configured builder abort the attempt.
    pub async fn propose_block(
        &self,
        slot: Slot,
        randao_reveal: SignatureBytes,
        graffiti: H256,
    ) -> Result<BlockProposal, Error> {
        let timer = self
            .producer_context
            .metrics
            .as_ref()
            .map(|metrics| metrics.build_beacon_block_times.start_timer());

        let deadline = Instant::now() + self.producer_context.options.proposal_timeout;

        let attempt = ProposalAttempt {
            producer_context: &self.producer_context,
            slot,
            deadline,
        };

        let proposal = match attempt.run(randao_reveal, graffiti).await {
            Ok(proposal) => {
                prometheus_metrics::stop_and_record(timer);
                proposal
            }
            Err(error) => {
                prometheus_metrics::stop_and_discard(timer);
                return Err(error);
            }
        };

        if let Some(metrics) = self.producer_context.metrics.as_ref() {
            metrics.register_block_production_outcome(
                proposal.source.path(),
                proposal.source.reason(),
            );
        }

        Ok(proposal)
    }

    /// Reveals a signed blinded block through the builder. Other blocks are returned unchanged.
    pub async fn reveal_blinded_block(
        &self,
        block: SignedBeaconBlock,
    ) -> Result<SignedBeaconBlock, Error> {
        let slot = block.slot();
        let deadline = Instant::now() + self.producer_context.options.reveal_timeout;

        within_deadline(
            deadline,
            ProposalStep::Reveal,
            slot,
            self.producer_context.unblinder.reveal(block),
        )
        .await?
        .map_err(Into::into)
    }

    #[cfg(test)]
    pub(crate) fn payload_id_cache(&self) -> &PayloadIdCache {
        &self.producer_context.payload_id_cache
    }
}

struct ProducerContext {
    state_transition: Arc<dyn StateTransition>,
    readiness_gate: ReadinessGate,
    registrations: ValidatorRegistrationStore,
    unblinder: Unblinder,
    builder: Option<Arc<dyn BuilderService>>,
    execution_engine: Arc<dyn ExecutionEngine>,
    payload_id_cache: PayloadIdCache,
    prepared_proposers: Mutex<HashMap<ValidatorIndex, ExecutionAddress>>,
    metrics: Option<Arc<Metrics>>,
    options: Options,
}

enum State {
    Init,
    CheckEligibility(Arc<BlockSkeleton>, PayloadContext),
    CheckRegistration(Arc<BlockSkeleton>, PayloadContext, Arc<dyn BuilderService>),
    RequestBuilderHeader(Arc<BlockSkeleton>, PayloadContext, Arc<dyn BuilderService>),
    AssembleBlinded(Arc<BlockSkeleton>, SignedBuilderBid),
    LocalBuild(Arc<BlockSkeleton>, PayloadContext, FallbackReason),
    Done(BlockProposal),
}

struct ProposalAttempt<'context> {
    producer_context: &'context ProducerContext,
    slot: Slot,
    deadline: Instant,
}

impl ProposalAttempt<'_> {
    async fn run(&self, randao_reveal: SignatureBytes, graffiti: H256) -> Result<BlockProposal, Error> {
        let mut state = State::Init;

        loop {
            state = match state {
                State::Init => self.init(randao_reveal, graffiti).await?,
                State::CheckEligibility(skeleton, context) => {
                    self.check_eligibility(skeleton, context).await?
                }
                State::CheckRegistration(skeleton, context, builder) => {
                    self.check_registration(skeleton, context, builder).await?
                }
                State::RequestBuilderHeader(skeleton, context, builder) => {
                    self.request_builder_header(skeleton, context, builder.as_ref())
                        .await?
                }
                State::AssembleBlinded(skeleton, bid) => self.assemble_blinded(skeleton, bid).await?,
                State::LocalBuild(skeleton, context, reason) => {
                    self.local_build(skeleton, context, reason).await?
                }
                State::Done(proposal) => {
                    let BlockProposal { block, source } = &proposal;

                    info!(
                        "produced {} block for slot {} (path: {}, reason: {}, state root: {:?})",
                        if block.is_blinded() { "blinded" } else { "full" },
                        self.slot,
                        source.path(),
                        source.reason(),
                        block.state_root(),
                    );

                    return Ok(proposal);
                }
            };
        }
    }

    async fn init(&self, randao_reveal: SignatureBytes, graffiti: H256) -> Result<State, Error> {
        let slot = self.slot;
        let state_transition = &self.producer_context.state_transition;

        let skeleton = self
            .step(
                ProposalStep::BuildSkeleton,
                state_transition.build_skeleton(slot, randao_reveal, graffiti),
            )
            .await?
            .map_err(|error| Error::BuildSkeleton { slot, error })?;

        let context = self
            .step(
                ProposalStep::PayloadContext,
                state_transition.payload_context(&skeleton),
            )
            .await?
            .map_err(|error| Error::PayloadContext { slot, error })?;

        log_with_feature(format_args!(
            "built skeleton for slot {slot} (proposer: {}, context: {context:?})",
            skeleton.proposer_index,
        ));

        Ok(State::CheckEligibility(Arc::new(skeleton), context))
    }

    async fn check_eligibility(
        &self,
        skeleton: Arc<BlockSkeleton>,
        context: PayloadContext,
    ) -> Result<State, Error> {
        let Some(builder) = self
            .producer_context
            .builder
            .as_ref()
            .filter(|builder| builder.is_configured())
        else {
            return Ok(State::LocalBuild(
                skeleton,
                context,
                FallbackReason::BuilderNotConfigured,
            ));
        };

        let slot = self.slot;

        let ready = self
            .step(
                ProposalStep::CheckReadiness,
                self.producer_context.readiness_gate.is_builder_ready(),
            )
            .await?
            .map_err(|error| Error::Readiness { slot, error })?;

        if !ready {
            return Ok(State::LocalBuild(
                skeleton,
                context,
                FallbackReason::BuilderNotReady,
            ));
        }

        Ok(State::CheckRegistration(
            skeleton,
            context,
            Arc::clone(builder),
        ))
    }

    async fn check_registration(
        &self,
        skeleton: Arc<BlockSkeleton>,
        context: PayloadContext,
        builder: Arc<dyn BuilderService>,
    ) -> Result<State, Error> {
        let slot = self.slot;
        let proposer_index = skeleton.proposer_index;

        let registered = self
            .step(
                ProposalStep::CheckRegistration,
                self.producer_context
                    .registrations
                    .is_registered(proposer_index),
            )
            .await?
            .map_err(|error| Error::Registration { slot, error })?;

        if !registered {
            log_with_feature(format_args!(
                "proposer {proposer_index} is not registered with the builder",
            ));

            return Ok(State::LocalBuild(
                skeleton,
                context,
                FallbackReason::ProposerNotRegistered,
            ));
        }

        Ok(State::RequestBuilderHeader(skeleton, context, builder))
    }

    async fn request_builder_header(
        &self,
        skeleton: Arc<BlockSkeleton>,
        context: PayloadContext,
        builder: &dyn BuilderService,
    ) -> Result<State, Error> {
        let slot = self.slot;

        let result = self
            .step(
                ProposalStep::RequestBuilderHeader,
                header_fetcher::fetch_header(
                    Some(builder),
                    slot,
                    context.parent_hash,
                    context.proposer_pubkey,
                ),
            )
            .await?;

        match result {
            Ok(bid) => Ok(State::AssembleBlinded(skeleton, bid)),
            Err(HeaderFetchError::BuilderUnavailable) => Ok(State::LocalBuild(
                skeleton,
                context,
                FallbackReason::BuilderNotConfigured,
            )),
            Err(HeaderFetchError::NoBid { .. }) => Ok(State::LocalBuild(
                skeleton,
                context,
                FallbackReason::NoBuilderBid,
            )),
            Err(error @ HeaderFetchError::Request(_)) => {
                Err(Error::BuilderHeader { slot, error })
            }
        }
    }

    async fn assemble_blinded(
        &self,
        skeleton: Arc<BlockSkeleton>,
        bid: SignedBuilderBid,
    ) -> Result<State, Error> {
        let slot = self.slot;
        let source = PayloadSource::from_bid(&bid);

        let block = blinded_block::assemble_blinded_block(Some(skeleton), Some(bid.message.header))
            .map_err(|error| Error::Assemble { slot, error })?;

        let block = self.with_state_root(block).await?;

        Ok(State::Done(BlockProposal { block, source }))
    }

    async fn local_build(
        &self,
        skeleton: Arc<BlockSkeleton>,
        context: PayloadContext,
        reason: FallbackReason,
    ) -> Result<State, Error> {
        let timer = self
            .producer_context
            .metrics
            .as_ref()
            .map(|metrics| metrics.local_execution_payload_times.start_timer());

        let payload = match self
            .local_payload(skeleton.proposer_index, context, reason)
            .await
        {
            Ok(payload) => {
                prometheus_metrics::stop_and_record(timer);
                payload
            }
            Err(error) => {
                prometheus_metrics::stop_and_discard(timer);
                return Err(error);
            }
        };

        let block = self.with_state_root(BeaconBlock::new(skeleton, payload)).await?;

        Ok(State::Done(BlockProposal {
            block,
            source: PayloadSource::Local { reason },
        }))
    }

    async fn local_payload(
        &self,
        proposer_index: ValidatorIndex,
        context: PayloadContext,
        reason: FallbackReason,
    ) -> Result<ExecutionPayload, Error> {
        let slot = self.slot;
        let payload_id = self.payload_id(proposer_index, context).await?;

        log_with_feature(format_args!(
            "building block for slot {slot} locally ({reason}) with payload ID {payload_id:?}",
        ));

        self.step(
            ProposalStep::LocalPayload,
            self.producer_context
                .execution_engine
                .get_payload(payload_id.id()),
        )
        .await?
        .map_err(|error| Error::LocalPayload { slot, error })
    }

    async fn payload_id(
        &self,
        proposer_index: ValidatorIndex,
        context: PayloadContext,
    ) -> Result<PayloadIdEntry, Error> {
        let slot = self.slot;
        let producer_context = self.producer_context;
        let cached = producer_context.payload_id_cache.get(slot, proposer_index);

        if let Some(metrics) = producer_context.metrics.as_ref() {
            metrics.register_payload_id_cache_lookup(if cached.is_some() { "hit" } else { "miss" });
        }

        if let Some(payload_id) = cached {
            return Ok(PayloadIdEntry::Cached(payload_id));
        }

        warn!("payload_id not found in payload_id_cache for slot {slot} and proposer {proposer_index}");

        let payload_attributes = PayloadAttributes {
            timestamp: context.timestamp,
            prev_randao: context.prev_randao,
            suggested_fee_recipient: self.fee_recipient(proposer_index).await,
        };

        let payload_id = self
            .step(
                ProposalStep::LocalPayloadId,
                producer_context
                    .execution_engine
                    .start_payload_build(context.parent_hash, payload_attributes),
            )
            .await?
            .map_err(|error| Error::StartPayloadBuild { slot, error })?;

        let payload_id = payload_id.ok_or(Error::MissingPayloadId {
            slot,
            proposer_index,
        })?;

        producer_context
            .payload_id_cache
            .set(slot, proposer_index, payload_id);

        Ok(PayloadIdEntry::Live(payload_id))
    }

    async fn with_state_root(&self, block: BeaconBlock) -> Result<BeaconBlock, Error> {
        let slot = self.slot;

        let state_root = self
            .step(
                ProposalStep::ComputeStateRoot,
                self.producer_context
                    .state_transition
                    .compute_state_root(&block),
            )
            .await?
            .map_err(|error| Error::StateRoot { slot, error })?;

        Ok(block.with_state_root(state_root))
    }

    async fn fee_recipient(&self, proposer_index: ValidatorIndex) -> ExecutionAddress {
        self.producer_context
            .prepared_proposers
            .lock()
            .await
            .get(&proposer_index)
            .copied()
            .unwrap_or(self.producer_context.options.default_fee_recipient)
    }

    async fn step<T>(&self, step: ProposalStep, future: impl Future<Output = T>) -> Result<T, Error> {
        within_deadline(self.deadline, step, self.slot, future).await
    }
}

async fn within_deadline<T>(
    deadline: Instant,
    step: ProposalStep,
    slot: Slot,
    future: impl Future<Output = T>,
) -> Result<T, Error> {
    tokio::time::timeout_at(deadline, future)
        .await
        .map_err(|_| Error::Timeout { step, slot })
}
