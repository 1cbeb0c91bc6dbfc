use builder_api::{containers::SignedBuilderBid, BuilderService};
use log::info;
use types::phase0::primitives::{ExecutionBlockHash, PublicKeyBytes, Slot};

use crate::error::HeaderFetchError;

/// Asks the builder for a bid on top of `parent_hash`.
///
/// No request is made if the builder is absent or unconfigured.
pub async fn fetch_header(
    builder: Option<&dyn BuilderService>,
    slot: Slot,
    parent_hash: ExecutionBlockHash,
    pubkey: PublicKeyBytes,
) -> Result<SignedBuilderBid, HeaderFetchError> {
    let builder = builder
        .filter(|builder| builder.is_configured())
        .ok_or(HeaderFetchError::BuilderUnavailable)?;

    let bid = builder
        .get_header(slot, parent_hash, pubkey)
        .await
        .map_err(HeaderFetchError::Request)?;

    let Some(bid) = bid else {
        info!("builder declined to bid for slot {slot}");
        return Err(HeaderFetchError::NoBid { slot });
    };

    crate::log_with_feature(format_args!(
        "received bid for slot {slot} with block hash {:?} (value: {} Wei)",
        bid.message.header.block_hash, bid.message.value,
    ));

    Ok(bid)
}

#[cfg(test)]
mod tests {
    use builder_api::{containers::BuilderBid, BuilderApiError, MockBuilder};
    use types::{
        bellatrix::containers::ExecutionPayloadHeader,
        phase0::primitives::{SignatureBytes, H256},
    };

    use super::*;

    fn bid() -> SignedBuilderBid {
        SignedBuilderBid {
            message: BuilderBid {
                header: ExecutionPayloadHeader {
                    block_number: 123,
                    ..ExecutionPayloadHeader::default()
                },
                value: 1.into(),
                pubkey: PublicKeyBytes::zero(),
            },
            signature: SignatureBytes::zero(),
        }
    }

    async fn fetch(builder: Option<&MockBuilder>) -> Result<SignedBuilderBid, HeaderFetchError> {
        let builder = builder.map(|builder| {
            let builder: &dyn BuilderService = builder;
            builder
        });
        fetch_header(builder, 3, H256::zero(), PublicKeyBytes::zero()).await
    }

    #[tokio::test]
    async fn absent_builder_is_unavailable() {
        assert!(matches!(
            fetch(None).await,
            Err(HeaderFetchError::BuilderUnavailable),
        ));
    }

    #[tokio::test]
    async fn unconfigured_builder_is_not_asked() {
        let builder = MockBuilder::not_configured().with_bid(bid());

        assert!(matches!(
            fetch(Some(&builder)).await,
            Err(HeaderFetchError::BuilderUnavailable),
        ));
        assert_eq!(builder.header_request_count(), 0);
    }

    #[tokio::test]
    async fn missing_bid_is_reported_as_declined() {
        let builder = MockBuilder::configured();

        assert!(matches!(
            fetch(Some(&builder)).await,
            Err(HeaderFetchError::NoBid { slot: 3 }),
        ));
    }

    #[tokio::test]
    async fn builder_error_is_preserved() {
        let builder = MockBuilder::configured().with_header_error("validator not registered");

        let Err(HeaderFetchError::Request(error)) = fetch(Some(&builder)).await else {
            panic!("builder error should be returned as a request failure");
        };

        assert!(error.to_string().contains("validator not registered"));
        assert!(error.downcast_ref::<BuilderApiError>().is_some());
    }

    #[tokio::test]
    async fn bid_is_returned() {
        let builder = MockBuilder::configured().with_bid(bid());

        assert_eq!(fetch(Some(&builder)).await.ok(), Some(bid()));
    }
}
