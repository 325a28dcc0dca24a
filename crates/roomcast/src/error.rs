//! Unified error type for Roomcast.

use roomcast_hub::HubError;
use roomcast_protocol::ProtocolError;
use roomcast_session::SessionError;
use roomcast_transport::TransportError;
use roomcast_upstream::UpstreamError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum RoomcastError {
    /// A transport-level error (connection, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, oversized frame).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The hub is gone or refused an update.
    #[error(transparent)]
    Hub(#[from] HubError),

    /// The producer could not be reached or enumerated.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// The listener could not bind.
    #[error("bind failed on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The HTTP server stopped with an I/O error.
    #[error("serve error: {0}")]
    Serve(#[source] std::io::Error),
}
