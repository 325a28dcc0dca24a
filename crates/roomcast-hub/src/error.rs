//! Error types for the hub layer.

use roomcast_protocol::RoomId;

/// Errors that can occur in hub operations.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// The hub's event loop is gone; its channels are closed.
    #[error("hub is unavailable")]
    Unavailable,

    /// An upstream snapshot is not newer than the stored one.
    #[error("stale update for room {room_id}: stored time {stored}, received {received}")]
    StaleUpdate {
        room_id: RoomId,
        stored: i64,
        received: i64,
    },
}
