//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding protocol frames.
///
/// Any of these raised while reading a viewer's frame is a protocol
/// violation: the session that produced it is terminated.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into a JSON frame).
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// Deserialization failed: malformed JSON, a missing `room_id`,
    /// or an unknown `ty` tag.
    #[error("decode failed: {0}")]
    Decode(#[source] serde_json::Error),

    /// The frame exceeds the inbound size limit.
    #[error("frame of {len} bytes exceeds the {max} byte limit")]
    FrameTooLarge {
        /// Size of the offending frame.
        len: usize,
        /// Configured limit.
        max: usize,
    },

    /// A frame kind the protocol does not accept (e.g. binary).
    #[error("unexpected frame: {0}")]
    UnexpectedFrame(&'static str),
}
