//! Viewer sessions for Roomcast.
//!
//! One [`ClientSession`] per accepted connection. It owns the socket,
//! the session's [`Subscriptions`] and the receiving end of its bounded
//! outbound queue; the hub only ever sees a [`SessionId`] and a queue
//! sender.
//!
//! # How it fits in the stack
//!
//! ```text
//! Server (above)        ← accepts the upgrade, spawns one session per socket
//!     ↕
//! Session Layer (this crate)  ← control frames in, room updates out
//!     ↕
//! Hub / Transport (below)     ← registry and fan-out / frame halves
//! ```
//!
//! [`SessionId`]: roomcast_transport::SessionId

mod config;
mod error;
mod session;
mod subscriptions;

pub use config::SessionConfig;
pub use error::SessionError;
pub use session::{ClientSession, SessionEnd};
pub use subscriptions::Subscriptions;
