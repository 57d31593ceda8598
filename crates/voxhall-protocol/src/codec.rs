//! Codec trait and implementations for serializing/deserializing envelopes.
//!
//! The relay doesn't care HOW a datagram payload is serialized — it just
//! needs something that implements the [`Codec`] trait. The deployed
//! voice-chat clients speak JSON, so [`JsonCodec`] is the only
//! implementation today; a binary codec could slot in without touching the
//! router or transport.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// A codec that can encode values to datagram payloads and decode them back.
///
/// `Send + Sync + 'static` because the codec is shared with the receive
/// loop task. The methods are generic over any serde-capable type;
/// `DeserializeOwned` (rather than `Deserialize<'de>`) means decoded values
/// own their data and the receive buffer can be reused immediately.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] if the bytes are malformed,
    /// truncated, or don't match the expected shape.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// One self-describing JSON object per datagram — human-readable in packet
/// captures, which matters more than byte count for a low-rate signaling
/// channel.
///
/// ## Example
///
/// ```rust
/// use voxhall_protocol::{Codec, Envelope, JsonCodec, MessageType};
///
/// let codec = JsonCodec;
///
/// let mut envelope = Envelope::request(MessageType::JoinRoom);
/// envelope.room_id = Some("alpha".into());
///
/// let bytes = codec.encode(&envelope).unwrap();
/// let decoded: Envelope = codec.decode(&bytes).unwrap();
/// assert_eq!(envelope, decoded);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Envelope, MessageType};

    #[test]
    fn test_json_codec_round_trip() {
        let codec = JsonCodec;
        let mut env = Envelope::request(MessageType::Offer);
        env.target = Some("client_2".into());

        let bytes = codec.encode(&env).unwrap();
        let decoded: Envelope = codec.decode(&bytes).unwrap();
        assert_eq!(env, decoded);
    }

    #[test]
    fn test_json_codec_decode_rejects_truncated_input() {
        let codec = JsonCodec;
        let bytes = codec
            .encode(&Envelope::request(MessageType::Hello))
            .unwrap();
        let result: Result<Envelope, _> = codec.decode(&bytes[..bytes.len() - 2]);
        assert!(result.is_err());
    }
}
