//! Hub configuration.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// StalePolicy
// ---------------------------------------------------------------------------

/// What to do with an upstream snapshot whose `time` is not strictly
/// greater than the one already stored for its room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StalePolicy {
    /// Drop the snapshot and log it. Stored state never moves backwards.
    #[default]
    Reject,
    /// Log it, then apply it anyway (plain last-write-wins).
    Accept,
}

// ---------------------------------------------------------------------------
// HubConfig
// ---------------------------------------------------------------------------

/// Configuration for the subscription hub.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubConfig {
    /// Capacity of the upstream update channel. The ingestor blocks
    /// when it is full; it never drops a snapshot.
    pub update_capacity: usize,

    /// Capacity of each session-facing channel (registration,
    /// de-registration, subscription changes).
    pub control_capacity: usize,

    /// Out-of-order snapshot handling.
    pub stale_policy: StalePolicy,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            update_capacity: 64,
            control_capacity: 256,
            stale_policy: StalePolicy::Reject,
        }
    }
}
