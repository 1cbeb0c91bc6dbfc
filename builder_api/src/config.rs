use core::time::Duration;

use reqwest::Url;

use crate::consts::BUILDER_PROPOSAL_DELAY_TOLERANCE;

pub const DEFAULT_HEADER_REQUEST_TIMEOUT: Duration =
    Duration::from_secs(BUILDER_PROPOSAL_DELAY_TOLERANCE);

// A third of a 12 second slot. The block has to be revealed before attestations are due.
pub const DEFAULT_BLINDED_BLOCK_REQUEST_TIMEOUT: Duration = Duration::from_secs(4);

#[derive(Clone, Debug)]
pub struct Config {
    pub builder_api_url: Url,
    pub header_request_timeout: Duration,
    pub blinded_block_request_timeout: Duration,
}

impl Config {
    #[must_use]
    pub const fn new(builder_api_url: Url) -> Self {
        Self {
            builder_api_url,
            header_request_timeout: DEFAULT_HEADER_REQUEST_TIMEOUT,
            blinded_block_request_timeout: DEFAULT_BLINDED_BLOCK_REQUEST_TIMEOUT,
        }
    }
}
