//! Session configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Limits and deadlines applied to every viewer session.
///
/// Start from `SessionConfig::default()` and override what you need.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Maximum rooms one session may subscribe to. Set to 1 for a
    /// single-room viewer.
    pub max_subscriptions: usize,

    /// Largest inbound control frame accepted, in bytes.
    pub max_frame_bytes: usize,

    /// How long a read may wait without a liveness acknowledgment
    /// (pong) from the peer.
    pub idle_timeout: Duration,

    /// Deadline for each socket write.
    pub write_timeout: Duration,

    /// Interval between liveness probes (pings). Must be shorter than
    /// `idle_timeout` so the peer's pong arrives before the deadline.
    pub ping_interval: Duration,

    /// Capacity of the outbound queue. When it is full at fan-out time
    /// the hub evicts the session.
    pub outbound_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_subscriptions: 100,
            max_frame_bytes: 256,
            idle_timeout: Duration::from_secs(60),
            write_timeout: Duration::from_secs(10),
            ping_interval: Duration::from_secs(50),
            outbound_capacity: 16,
        }
    }
}
