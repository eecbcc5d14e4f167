//! Codec trait and the JSON implementation.
//!
//! The handler only needs "something that turns an [`Envelope`](crate::Envelope)
//! into bytes and back". JSON is what the browser client speaks; a binary
//! codec can be slotted in behind the same trait.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes values to bytes and decodes them back.
///
/// `Send + Sync + 'static` because one codec is shared by every connection
/// task for the life of the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// [`ProtocolError::Encode`] if the value cannot be represented.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes into a value.
    ///
    /// # Errors
    /// [`ProtocolError::Decode`] if the bytes are malformed or do not match
    /// the expected shape.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] backed by `serde_json`. Enabled by the default `json` feature.
///
/// ```rust
/// use liars_dice_protocol::{Codec, Envelope, GameAction, JsonCodec, Payload};
///
/// let codec = JsonCodec;
/// let envelope = Envelope {
///     seq: 3,
///     timestamp: 1200,
///     payload: Payload::Action(GameAction::MakeBid { count: 3, face: 4 }),
/// };
///
/// let bytes = codec.encode(&envelope).unwrap();
/// let decoded: Envelope = codec.decode(&bytes).unwrap();
/// assert_eq!(envelope, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::{Envelope, Payload, SystemMessage};

    #[test]
    fn test_json_codec_decodes_browser_text_frame() {
        let text = br#"{
            "seq": 1,
            "timestamp": 0,
            "payload": {
                "type": "System",
                "data": { "type": "JoinRoom", "room_code": "abc123", "player_name": "ana" }
            }
        }"#;

        let envelope: Envelope = JsonCodec.decode(text).unwrap();

        match envelope.payload {
            Payload::System(SystemMessage::JoinRoom { room_code, player_name }) => {
                // Room codes are case-insensitive on input.
                assert_eq!(room_code.as_str(), "ABC123");
                assert_eq!(player_name, "ana");
            }
            other => panic!("expected JoinRoom, got {other:?}"),
        }
    }

    #[test]
    fn test_json_codec_decode_garbage_is_decode_error() {
        let result: Result<Envelope, _> = JsonCodec.decode(b"not json");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }
}
