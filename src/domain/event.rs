//! Event frames and their two on-wire embeddings.
//!
//! A frame travels either hex-embedded in a broadcast log line behind
//! [`EVENT_LOG_TAG`], or re-encoded inside a self-invocation record behind a
//! fixed-size leading discriminant. The two encodings are merged by
//! `application::events::EventDecoder`.

use crate::foundation::constants::{EVENT_LOG_TAG, EVENT_REENCODE_TAG_LEN};
use crate::foundation::{EngineError, Result};
use crate::domain::instruction::op_tag;
use borsh::{BorshDeserialize, BorshSerialize};

#[derive(Clone, Debug, Eq, PartialEq, BorshDeserialize, BorshSerialize)]
pub struct EventFrame {
    pub name: String,
    pub data: Vec<u8>,
}

impl EventFrame {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self { name: name.into(), data }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        borsh::to_vec(self).map_err(|err| EngineError::Serialization { format: "borsh".to_string(), details: err.to_string() })
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        borsh::from_slice(bytes)
            .map_err(|err| EngineError::Serialization { format: "borsh".to_string(), details: err.to_string() })
    }

    /// Decode the frame payload into its typed shape.
    pub fn payload_as<T: BorshDeserialize>(&self) -> Result<T> {
        borsh::from_slice(&self.data)
            .map_err(|err| EngineError::Serialization { format: "borsh".to_string(), details: err.to_string() })
    }

    pub fn to_log_line(&self) -> Result<String> {
        Ok(format!("{EVENT_LOG_TAG}{}", hex::encode(self.encode()?)))
    }

    /// Parse a broadcast log line; `None` when the line carries no frame.
    pub fn from_log_line(line: &str) -> Option<Self> {
        let encoded = line.strip_prefix(EVENT_LOG_TAG)?;
        let bytes = hex::decode(encoded).ok()?;
        Self::decode(&bytes).ok()
    }

    /// Discriminant prefixing frames re-encoded into self-invocation records.
    pub fn reencode_tag() -> [u8; EVENT_REENCODE_TAG_LEN] {
        op_tag("reencode_event")
    }

    pub fn to_invocation_data(&self) -> Result<Vec<u8>> {
        let mut data = Self::reencode_tag().to_vec();
        data.extend_from_slice(&self.encode()?);
        Ok(data)
    }

    /// Parse a self-invocation payload. The leading discriminant is stripped
    /// without inspection; `None` when the remainder is not a frame.
    pub fn from_invocation_data(data: &[u8]) -> Option<Self> {
        if data.len() <= EVENT_REENCODE_TAG_LEN {
            return None;
        }
        Self::decode(&data[EVENT_REENCODE_TAG_LEN..]).ok()
    }
}
