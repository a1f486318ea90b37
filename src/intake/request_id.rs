use alloy_primitives::{B256, hex};
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display};

/// Canonical identifier of an accepted L1->L2 request: the keccak-256 hash of its encoded fields.
#[derive(Clone, Copy, Default, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub [u8; 32]);

impl RequestId {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode_prefixed(self.0))
    }
}

impl Debug for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RequestId({})", hex::encode_prefixed(self.0))
    }
}

impl From<[u8; 32]> for RequestId {
    fn from(hash: [u8; 32]) -> Self {
        RequestId(hash)
    }
}

impl From<B256> for RequestId {
    fn from(hash: B256) -> Self {
        RequestId(hash.0)
    }
}

impl From<RequestId> for B256 {
    fn from(id: RequestId) -> Self {
        B256::from(id.0)
    }
}

impl Serialize for RequestId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&hex::encode_prefixed(self.0))
    }
}

impl<'de> Deserialize<'de> for RequestId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        let hash: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| serde::de::Error::invalid_length(bytes.len(), &"32 bytes"))?;
        Ok(RequestId(hash))
    }
}
