//! Wire envelope for hub delivery.

use crate::telemetry::Reading;

/// A reading serialized for transport.
///
/// The payload is the reading's JSON object, UTF-8 encoded. The hub's
/// archival sink later base64-wraps these exact bytes, so the encoding here
/// and the decoding in [`crate::archive`] are two ends of one format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    bytes: Vec<u8>,
}

impl Envelope {
    /// Serialize a reading into its wire envelope.
    pub fn encode(reading: &Reading) -> serde_json::Result<Self> {
        Ok(Self {
            bytes: serde_json::to_vec(reading)?,
        })
    }

    /// The payload bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Payload size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the payload is empty. Never true for an encoded reading.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
