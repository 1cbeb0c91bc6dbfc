use anyhow::Error as AnyhowError;
use thiserror::Error;
use types::phase0::primitives::{Slot, ValidatorIndex, H256};

use crate::misc::ProposalStep;

#[derive(Debug, Error)]
pub enum ChainAccessError {
    #[error("failed to read finalized checkpoint: {0:#}")]
    FinalizedCheckpoint(AnyhowError),
    #[error("finalized block {root:?} is not in the store")]
    MissingFinalizedBlock { root: H256 },
    #[error("failed to load finalized block {root:?}: {error:#}")]
    BlockLookup { root: H256, error: AnyhowError },
}

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("validator registration store is not available")]
    StoreUnavailable,
    #[error("failed to look up registration of validator {validator_index}: {error:#}")]
    Lookup {
        validator_index: ValidatorIndex,
        error: AnyhowError,
    },
}

#[derive(Debug, Error)]
pub enum HeaderFetchError {
    #[error("builder is not configured")]
    BuilderUnavailable,
    #[error("builder declined to bid for slot {slot}")]
    NoBid { slot: Slot },
    #[error("builder request failed: {0:#}")]
    Request(AnyhowError),
}

#[derive(Debug, Error)]
#[cfg_attr(test, derive(PartialEq, Eq))]
pub enum AssembleError {
    #[error("nil block")]
    NilBlock,
    #[error("nil header")]
    NilHeader,
}

#[derive(Debug, Error)]
pub enum UnblindError {
    #[error("failed to submit blinded block at slot {slot} to builder: {error:#}")]
    Submission { slot: Slot, error: AnyhowError },
}

/// Reasons a proposal attempt is abandoned.
///
/// Conditions that only make the builder unusable are not errors.
/// They are reported through [`FallbackReason`](crate::FallbackReason) instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to build block skeleton for slot {slot}: {error:#}")]
    BuildSkeleton { slot: Slot, error: AnyhowError },
    #[error("failed to compute payload context for slot {slot}: {error:#}")]
    PayloadContext { slot: Slot, error: AnyhowError },
    #[error("builder readiness check failed at slot {slot}: {error}")]
    Readiness { slot: Slot, error: ChainAccessError },
    #[error("registration check failed at slot {slot}: {error}")]
    Registration { slot: Slot, error: RegistrationError },
    #[error("failed to get execution payload header for slot {slot}: {error}")]
    BuilderHeader { slot: Slot, error: HeaderFetchError },
    #[error("failed to assemble blinded block for slot {slot}: {error}")]
    Assemble { slot: Slot, error: AssembleError },
    #[error("failed to start payload build for slot {slot}: {error:#}")]
    StartPayloadBuild { slot: Slot, error: AnyhowError },
    #[error(
        "execution engine returned no payload ID for slot {slot} \
         and proposer {proposer_index}"
    )]
    MissingPayloadId {
        slot: Slot,
        proposer_index: ValidatorIndex,
    },
    #[error("failed to retrieve local execution payload for slot {slot}: {error:#}")]
    LocalPayload { slot: Slot, error: AnyhowError },
    #[error("failed to compute state root for slot {slot}: {error:#}")]
    StateRoot { slot: Slot, error: AnyhowError },
    #[error(transparent)]
    Unblind(#[from] UnblindError),
    #[error("deadline expired during {step} at slot {slot}")]
    Timeout { step: ProposalStep, slot: Slot },
}
