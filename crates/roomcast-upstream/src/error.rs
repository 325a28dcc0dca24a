//! Error types for the upstream layer.

/// Errors raised while talking to the simulation producer.
///
/// During startup any of these is fatal. Once the first stream is open,
/// a failing stream is only logged and reopened after a backoff delay.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// An HTTP request to the producer failed or returned a bad body.
    #[error("producer request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The producer answered with a non-success status.
    #[error("producer returned {status} for {url}")]
    Status { url: String, status: u16 },

    /// The snapshot stream could not be opened or broke mid-read.
    #[error("snapshot stream error: {0}")]
    Stream(#[from] tokio_tungstenite::tungstenite::Error),

    /// The producer address is not an `http`/`https` URL.
    #[error("invalid producer address: {0}")]
    InvalidAddress(String),
}
