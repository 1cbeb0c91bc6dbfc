use core::fmt::Display;

pub use crate::{
    blinded_block::assemble_blinded_block,
    block_producer::{
        BlockProducer, Options, StateTransition, DEFAULT_PROPOSAL_TIMEOUT, DEFAULT_REVEAL_TIMEOUT,
    },
    error::{
        AssembleError, ChainAccessError, Error, HeaderFetchError, RegistrationError, UnblindError,
    },
    header_fetcher::fetch_header,
    misc::{
        BlockProposal, FallbackReason, PayloadContext, PayloadIdEntry, PayloadSource,
        ProposalStep, ProposerData,
    },
    payload_id_cache::PayloadIdCache,
    readiness::{BlockStore, ReadinessGate},
    registrations::{InMemoryRegistrationStore, RegistrationStore, ValidatorRegistrationStore},
    unblinder::Unblinder,
};

mod blinded_block;
mod block_producer;
mod error;
mod header_fetcher;
mod misc;
mod payload_id_cache;
mod readiness;
mod registrations;
mod unblinder;

#[cfg(test)]
mod fakes;

fn log_with_feature(message: impl Display) {
    features::log!(DebugBlockProducer, "{message}");
}
