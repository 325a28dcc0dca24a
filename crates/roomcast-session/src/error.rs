//! Error types for the session layer.

use roomcast_hub::HubError;
use roomcast_protocol::ProtocolError;

/// Errors that can occur while a viewer session is running.
///
/// Everything except [`TooManySubscriptions`](Self::TooManySubscriptions)
/// ends the session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The subscription set is at its cap. The frame is ignored and the
    /// connection stays open.
    #[error("subscription limit of {max} rooms reached")]
    TooManySubscriptions { max: usize },

    /// The viewer sent a malformed, oversized or unknown frame.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Reading from or writing to the socket failed.
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// No liveness acknowledgment arrived within the idle deadline.
    #[error("idle read deadline elapsed")]
    IdleTimeout,

    /// A write did not complete within the write deadline.
    #[error("write deadline elapsed")]
    WriteTimeout,

    /// The hub went away.
    #[error(transparent)]
    Hub(#[from] HubError),
}
