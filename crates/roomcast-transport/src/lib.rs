//! Transport abstraction layer for Roomcast.
//!
//! A viewer connection is consumed as two independent halves, one per
//! session loop: a [`FrameSource`] read by the inbound loop and a
//! [`FrameSink`] written by the outbound loop. Splitting keeps a slow
//! write from ever stalling a read and vice versa.
//!
//! # Feature Flags
//!
//! - `websocket` (default): halves of an `axum` WebSocket

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WsSink, WsSource, split};

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for generating unique session IDs.
static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque handle identifying one viewer session.
///
/// The hub's registry is keyed by this rather than by the connection
/// itself, so ownership of the socket stays with the session task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    /// Creates a `SessionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Allocates the next process-unique ID.
    pub fn next() -> Self {
        Self(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// A single frame as seen by the session layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
    /// Liveness probe.
    Ping(Vec<u8>),
    /// Liveness acknowledgment.
    Pong(Vec<u8>),
}

/// The read half of a connection.
pub trait FrameSource: Send + 'static {
    /// The error type for receive operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Receives the next frame from the remote peer.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    fn recv(&mut self) -> impl Future<Output = Result<Option<Frame>, Self::Error>> + Send;
}

/// The write half of a connection.
pub trait FrameSink: Send + 'static {
    /// The error type for send operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Sends one frame to the remote peer.
    fn send(&mut self, frame: Frame) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Closes the connection.
    fn close(&mut self) -> impl Future<Output = Result<(), Self::Error>> + Send;
}
