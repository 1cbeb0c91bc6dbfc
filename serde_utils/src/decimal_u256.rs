// `ethereum-types` serializes `U256` as a hexadecimal quantity.
// Bid values and base fees are decimal strings in `builder-specs` and the Beacon API.

use core::fmt::{Formatter, Result as FmtResult};

use ethereum_types::U256;
use serde::{
    de::{Error, Visitor},
    Deserializer, Serializer,
};

pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
    struct DecimalVisitor;

    impl Visitor<'_> for DecimalVisitor {
        type Value = U256;

        fn expecting(&self, formatter: &mut Formatter) -> FmtResult {
            formatter.write_str("a decimal string or an integer")
        }

        fn visit_str<E: Error>(self, string: &str) -> Result<Self::Value, E> {
            U256::from_dec_str(string).map_err(|error| E::custom(format_args!("{error:?}")))
        }

        fn visit_u64<E: Error>(self, value: u64) -> Result<Self::Value, E> {
            Ok(value.into())
        }
    }

    deserializer.deserialize_any(DecimalVisitor)
}
