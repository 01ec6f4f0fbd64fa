//! Encoding of bus messages and persisted records
//!
//! Messages cross persistence and network boundaries as opaque bytes.
//! Every type goes through the serde data model, so no type needs its own
//! field-by-field codec. Non-finite floats have no JSON form, so messages
//! carrying them are refused instead of being written as `null`.

use crate::utils::error::{IntoPlayerError, Result, StereoPlayError};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Types that travel as opaque byte strings
pub trait WireFormat: Serialize + DeserializeOwned {
    /// Whether the value survives an encode and decode unchanged
    fn is_encodable(&self) -> bool {
        true
    }

    fn encode(&self) -> Result<Vec<u8>> {
        if !self.is_encodable() {
            return Err(StereoPlayError::Codec(
                "Failed to encode message: non-finite number".to_string(),
            ));
        }
        serde_json::to_vec(self).codec_err("Failed to encode message")
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).codec_err("Failed to decode message")
    }
}

impl WireFormat for super::Command {
    fn is_encodable(&self) -> bool {
        self.is_finite()
    }
}

impl WireFormat for super::Notification {
    fn is_encodable(&self) -> bool {
        self.is_finite()
    }
}

impl WireFormat for crate::media::Parameters {}
