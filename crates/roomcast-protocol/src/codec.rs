//! Codec trait and the JSON implementation used on the viewer socket.
//!
//! A "codec" (coder/decoder) converts between Rust types and frames.
//! Both edges of the relay speak JSON text frames, so the trait works
//! on `String`/`&str` rather than raw bytes.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that can encode Rust types to text frames and decode them back.
///
/// `Send + Sync + 'static` because a codec is held by every session
/// task for the lifetime of the connection.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into a text frame.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError>;

    /// Deserializes a text frame back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the frame is malformed,
    /// incomplete, or doesn't match the expected type.
    fn decode<T: DeserializeOwned>(&self, frame: &str) -> Result<T, ProtocolError>;
}

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// ## Example
///
/// ```rust
/// use roomcast_protocol::{ClientMessage, Codec, JsonCodec, RoomId};
///
/// let codec = JsonCodec;
/// let msg: ClientMessage = codec
///     .decode(r#"{"ty":"room_id","room_id":{"q":3,"r":-1}}"#)
///     .unwrap();
/// assert_eq!(msg, ClientMessage::Subscribe { room_id: RoomId::new(3, -1) });
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError> {
        serde_json::to_string(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, frame: &str) -> Result<T, ProtocolError> {
        serde_json::from_str(frame).map_err(ProtocolError::Decode)
    }
}
