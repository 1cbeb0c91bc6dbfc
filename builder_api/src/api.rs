use std::sync::Arc;

use anyhow::{bail, ensure, Result};
use async_trait::async_trait;
use log::{debug, info};
use mime::APPLICATION_JSON;
use prometheus_metrics::Metrics;
use reqwest::{
    header::{HeaderValue, ACCEPT, CONTENT_TYPE},
    Client, Response, StatusCode, Url,
};
use serde::de::DeserializeOwned;
use thiserror::Error;
use types::{
    bellatrix::containers::ExecutionPayload,
    combined::SignedBeaconBlock,
    phase0::primitives::{ExecutionBlockHash, PublicKeyBytes, Slot},
};

use crate::{
    containers::{
        SignedBuilderBid, SignedValidatorRegistrationV1, VersionedBuilderBid,
        VersionedExecutionPayload,
    },
    service::BuilderService,
    BuilderConfig,
};

#[derive(Debug, Error)]
#[cfg_attr(test, derive(PartialEq, Eq))]
pub enum BuilderApiError {
    #[error("bad request to Builder API (builder node response: {message})")]
    BadRequest { message: String },
    #[error("builder node internal error (builder node response: {message})")]
    BuilderNodeInternalError { message: String },
    #[error("block submitted to builder is not blinded (slot: {slot})")]
    BlockNotBlinded { slot: Slot },
    #[error(
        "builder bid is for parent {in_bid:?} but block is being built on top of {requested:?}"
    )]
    ParentHashMismatch {
        requested: ExecutionBlockHash,
        in_bid: ExecutionBlockHash,
    },
    #[error(
        "execution payload ({payload_hash:?}) does not match header ({header_hash:?}) \
         committed to in blinded block"
    )]
    PayloadMismatch {
        header_hash: ExecutionBlockHash,
        payload_hash: ExecutionBlockHash,
    },
    #[error("received unexpected status code: {received}, expected: {expected}")]
    UnexpectedStatusCode {
        expected: StatusCode,
        received: StatusCode,
    },
    #[error("received response with unsupported content-type: {content_type:?}")]
    UnsupportedContentType { content_type: Option<HeaderValue> },
}

pub struct Api {
    config: BuilderConfig,
    client: Client,
    metrics: Option<Arc<Metrics>>,
}

impl Api {
    #[must_use]
    pub const fn new(config: BuilderConfig, client: Client, metrics: Option<Arc<Metrics>>) -> Self {
        Self {
            config,
            client,
            metrics,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &BuilderConfig {
        &self.config
    }

    pub async fn register_validators(
        &self,
        validator_registrations: &[SignedValidatorRegistrationV1],
    ) -> Result<()> {
        let _timer = self
            .metrics
            .as_ref()
            .map(|metrics| metrics.builder_register_validator_times.start_timer());

        debug!(
            "registering {} validators with builder",
            validator_registrations.len(),
        );

        features::log!(
            DebugBuilderApi,
            "validator registrations: {validator_registrations:?}",
        );

        let url = self.url("/eth/v1/builder/validators")?;

        let response = self
            .client
            .post(url)
            .json(validator_registrations)
            .send()
            .await?;

        let response = handle_error(response).await?;

        ensure!(
            response.status() == StatusCode::OK,
            BuilderApiError::UnexpectedStatusCode {
                expected: StatusCode::OK,
                received: response.status(),
            },
        );

        Ok(())
    }

    pub async fn get_execution_payload_header(
        &self,
        slot: Slot,
        parent_hash: ExecutionBlockHash,
        pubkey: PublicKeyBytes,
    ) -> Result<Option<SignedBuilderBid>> {
        let _timer = self.metrics.as_ref().map(|metrics| {
            metrics
                .builder_get_execution_payload_header_times
                .start_timer()
        });

        let url = self.url(&format!(
            "/eth/v1/builder/header/{slot}/{parent_hash:?}/{pubkey:?}"
        ))?;

        debug!("getting execution payload header from {url}");

        let response = self
            .client
            .get(url)
            .timeout(self.config.header_request_timeout)
            .header(ACCEPT, APPLICATION_JSON.as_ref())
            .send()
            .await?;

        let response = handle_error(response).await?;

        if response.status() == StatusCode::NO_CONTENT {
            info!("builder has no execution payload header available for slot {slot}");
            return Ok(None);
        }

        let builder_bid = parse_response::<VersionedBuilderBid>(response)
            .await?
            .into_data();

        features::log!(
            DebugBuilderApi,
            "get_execution_payload_header response: {builder_bid:?}",
        );

        let in_bid = builder_bid.header().parent_hash;

        ensure!(
            in_bid == parent_hash,
            BuilderApiError::ParentHashMismatch {
                requested: parent_hash,
                in_bid,
            },
        );

        info!(
            "received execution payload header from builder for slot {slot} (value: {} Wei)",
            builder_bid.message.value,
        );

        Ok(Some(builder_bid))
    }

    pub async fn post_blinded_block(&self, block: &SignedBeaconBlock) -> Result<ExecutionPayload> {
        let _timer = self
            .metrics
            .as_ref()
            .map(|metrics| metrics.builder_post_blinded_block_times.start_timer());

        let slot = block.slot();

        let Some(header) = block.message.execution_payload_header() else {
            bail!(BuilderApiError::BlockNotBlinded { slot });
        };

        let url = self.url("/eth/v1/builder/blinded_blocks")?;
        let timeout = self.config.blinded_block_request_timeout;

        debug!("posting blinded block for slot {slot} to {url} with timeout of {timeout:?}");

        let response = self
            .client
            .post(url)
            .timeout(timeout)
            .header(ACCEPT, APPLICATION_JSON.as_ref())
            .json(block)
            .send()
            .await?;

        let response = handle_error(response).await?;

        let execution_payload = parse_response::<VersionedExecutionPayload>(response)
            .await?
            .into_data();

        features::log!(
            DebugBuilderApi,
            "post_blinded_block response: {execution_payload:?}",
        );

        ensure!(
            header.commits_to(&execution_payload),
            BuilderApiError::PayloadMismatch {
                header_hash: header.block_hash,
                payload_hash: execution_payload.block_hash,
            },
        );

        info!(
            "received execution payload {:?} from builder for block at slot {slot}",
            execution_payload.block_hash,
        );

        Ok(execution_payload)
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.config.builder_api_url.join(path).map_err(Into::into)
    }
}

#[async_trait]
impl BuilderService for Api {
    fn is_configured(&self) -> bool {
        true
    }

    async fn get_header(
        &self,
        slot: Slot,
        parent_hash: ExecutionBlockHash,
        pubkey: PublicKeyBytes,
    ) -> Result<Option<SignedBuilderBid>> {
        self.get_execution_payload_header(slot, parent_hash, pubkey)
            .await
    }

    async fn submit_blinded_block(&self, block: &SignedBeaconBlock) -> Result<ExecutionPayload> {
        self.post_blinded_block(block).await
    }
}

async fn handle_error(response: Response) -> Result<Response> {
    if response.status().is_client_error() {
        let message = response.text().await?;
        bail!(BuilderApiError::BadRequest { message });
    }

    if response.status().is_server_error() {
        let message = response.text().await?;
        bail!(BuilderApiError::BuilderNodeInternalError { message });
    }

    Ok(response)
}

async fn parse_response<T: DeserializeOwned>(response: Response) -> Result<T> {
    let content_type = response.headers().get(CONTENT_TYPE);

    debug!("received response with content_type: {content_type:?}");

    let is_json = content_type.is_none_or(|value| {
        value
            .to_str()
            .is_ok_and(|value| value.starts_with(APPLICATION_JSON.as_ref()))
    });

    if is_json {
        return response.json().await.map_err(Into::into);
    }

    bail!(BuilderApiError::UnsupportedContentType {
        content_type: content_type.cloned(),
    })
}
