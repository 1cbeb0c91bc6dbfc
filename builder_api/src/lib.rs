pub use crate::{
    api::{Api as BuilderApi, BuilderApiError},
    config::{
        Config as BuilderConfig, DEFAULT_BLINDED_BLOCK_REQUEST_TIMEOUT,
        DEFAULT_HEADER_REQUEST_TIMEOUT,
    },
    consts::BUILDER_PROPOSAL_DELAY_TOLERANCE,
    mock::MockBuilder,
    service::BuilderService,
};

pub mod containers;
pub mod consts;

mod api;
mod config;
mod mock;
mod service;
