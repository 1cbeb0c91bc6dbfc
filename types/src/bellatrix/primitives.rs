use derive_more::derive::{AsRef, From};
use serde::{Deserialize, Serialize};

pub use ethereum_types::{Bloom, U256};

pub type Gas = u64;
pub type Wei = U256;

/// An opaque RLP-encoded execution layer transaction.
#[derive(Clone, PartialEq, Eq, Default, Debug, From, AsRef, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Transaction(#[serde(with = "serde_utils::prefixed_hex_bytes")] Vec<u8>);
