//! MessagePack encoding of stored records.

use crate::core::Result;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Encode with field names so decoding does not depend on field order.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(rmp_serde::to_vec_named(value)?)
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(rmp_serde::from_slice(bytes)?)
}
