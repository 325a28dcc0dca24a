/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Sending data failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Receiving data failed (includes frames over the size limit).
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),
}
