use anyhow::Result;
use log::warn;
use prometheus::{histogram_opts, opts, Histogram, IntCounterVec, IntGaugeVec, Registry};

#[derive(Debug)]
pub struct Metrics {
    // Collection Lengths
    collection_lengths: IntGaugeVec,

    // Build beacon block times
    pub build_beacon_block_times: Histogram,
    pub local_execution_payload_times: Histogram,

    // Block production outcomes
    block_production_outcomes: IntCounterVec,
    payload_id_cache_lookups: IntCounterVec,

    // Builder API
    pub builder_register_validator_times: Histogram,
    pub builder_post_blinded_block_times: Histogram,
    pub builder_get_execution_payload_header_times: Histogram,
}

impl Metrics {
    pub fn new() -> Result<Self> {
        Ok(Self {
            // Collection Lengths
            collection_lengths: IntGaugeVec::new(
                opts!("COLLECTION_LENGTHS", "Number of items in each collection"),
                &["type", "name"],
            )?,

            // Build beacon block times
            build_beacon_block_times: Histogram::with_opts(histogram_opts!(
                "BUILD_BEACON_BLOCK_TIMES",
                "Build beacon block times",
            ))?,

            local_execution_payload_times: Histogram::with_opts(histogram_opts!(
                "LOCAL_EXECUTION_PAYLOAD_TIMES",
                "Local execution payload times",
            ))?,

            // Block production outcomes
            block_production_outcomes: IntCounterVec::new(
                opts!(
                    "BLOCK_PRODUCTION_OUTCOMES",
                    "Number of produced blocks by payload source and fallback reason",
                ),
                &["path", "reason"],
            )?,

            payload_id_cache_lookups: IntCounterVec::new(
                opts!(
                    "PAYLOAD_ID_CACHE_LOOKUPS",
                    "Number of payload ID cache lookups by result",
                ),
                &["result"],
            )?,

            // Builder API
            builder_register_validator_times: Histogram::with_opts(histogram_opts!(
                "BUILDER_REGISTER_VALIDATORS_TIMES",
                "Builder register validators times",
            ))?,

            builder_post_blinded_block_times: Histogram::with_opts(histogram_opts!(
                "BUILDER_POST_BLINDED_BLOCK_TIMES",
                "Builder post blinded block times",
            ))?,

            builder_get_execution_payload_header_times: Histogram::with_opts(histogram_opts!(
                "BUILDER_GET_EXECUTION_PAYLOAD_HEADER_TIMES",
                "Builder get execution payload header times",
            ))?,
        })
    }

    pub fn register(&self, registry: &Registry) -> Result<()> {
        registry.register(Box::new(self.collection_lengths.clone()))?;
        registry.register(Box::new(self.build_beacon_block_times.clone()))?;
        registry.register(Box::new(self.local_execution_payload_times.clone()))?;
        registry.register(Box::new(self.block_production_outcomes.clone()))?;
        registry.register(Box::new(self.payload_id_cache_lookups.clone()))?;
        registry.register(Box::new(self.builder_register_validator_times.clone()))?;
        registry.register(Box::new(self.builder_post_blinded_block_times.clone()))?;
        registry.register(Box::new(
            self.builder_get_execution_payload_header_times.clone(),
        ))?;

        Ok(())
    }

    // Collection Lengths
    pub fn set_collection_length(&self, typename: &str, collection_name: &str, value: usize) {
        match self
            .collection_lengths
            .get_metric_with_label_values(&[typename, collection_name])
        {
            Ok(gauge) => gauge.set(i64::try_from(value).unwrap_or(i64::MAX)),
            Err(error) => {
                warn!("unable to set collection length for {typename}.{collection_name}: {error:?}")
            }
        }
    }

    // Block production outcomes
    pub fn register_block_production_outcome(&self, path: &str, reason: &str) {
        match self
            .block_production_outcomes
            .get_metric_with_label_values(&[path, reason])
        {
            Ok(counter) => counter.inc(),
            Err(error) => {
                warn!("unable to register block production outcome ({path}, {reason}): {error:?}")
            }
        }
    }

    pub fn register_payload_id_cache_lookup(&self, result: &str) {
        match self
            .payload_id_cache_lookups
            .get_metric_with_label_values(&[result])
        {
            Ok(counter) => counter.inc(),
            Err(error) => warn!("unable to register payload ID cache lookup ({result}): {error:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_metrics_can_be_registered() -> Result<()> {
        let registry = Registry::new();
        let metrics = Metrics::new()?;

        metrics.register(&registry)?;
        metrics.register_block_production_outcome("local", "builder_not_ready");
        metrics.register_payload_id_cache_lookup("hit");
        metrics.set_collection_length("BlockProducer", "payload_id_cache", 3);

        let outcome = metrics
            .block_production_outcomes
            .get_metric_with_label_values(&["local", "builder_not_ready"])?;

        assert_eq!(outcome.get(), 1);
        assert_eq!(registry.gather().len(), 8);

        Ok(())
    }

    #[test]
    fn registering_twice_fails() -> Result<()> {
        let registry = Registry::new();
        let metrics = Metrics::new()?;

        metrics.register(&registry)?;

        assert!(metrics.register(&registry).is_err());

        Ok(())
    }
}
