//! The room state store: latest snapshot per room.
//!
//! Owned by the hub's event loop and touched by nothing else, so it is a
//! plain `HashMap` with no locking. Entries are created on a room's first
//! update and replaced whole on every accepted update after that; they are
//! never removed while the process runs.

use std::collections::HashMap;
use std::sync::Arc;

use roomcast_protocol::{RoomId, RoomState};

use crate::{HubError, StalePolicy};

struct Entry {
    state: Arc<RoomState>,
    /// Resync epoch in which `state` was stored.
    epoch: u64,
}

/// In-memory mapping from room to its latest [`RoomState`].
///
/// ## Staleness
///
/// With [`StalePolicy::Reject`] an update whose `time` is not strictly
/// greater than the stored one is refused. After [`resync`](Self::resync)
/// (the producer stream was reopened, possibly by a restarted producer
/// whose clock starts over) the first update for each room is accepted
/// unconditionally.
pub struct RoomStateStore {
    rooms: HashMap<RoomId, Entry>,
    epoch: u64,
    policy: StalePolicy,
}

impl RoomStateStore {
    /// Creates an empty store.
    pub fn new(policy: StalePolicy) -> Self {
        Self {
            rooms: HashMap::new(),
            epoch: 0,
            policy,
        }
    }

    /// Replaces the stored state for `state.room_id` and returns the new
    /// value, ready to be fanned out.
    ///
    /// The returned `Arc` is the exact value now held by the store, so
    /// readers never observe a partially applied update.
    ///
    /// # Errors
    /// Returns [`HubError::StaleUpdate`] when the policy is `Reject` and
    /// the update is not newer than the stored state.
    pub fn upsert(&mut self, state: RoomState) -> Result<Arc<RoomState>, HubError> {
        let room_id = state.room_id;
        if let Some(entry) = self.rooms.get(&room_id) {
            let stored = entry.state.time;
            if entry.epoch == self.epoch && state.time <= stored {
                match self.policy {
                    StalePolicy::Reject => {
                        return Err(HubError::StaleUpdate {
                            room_id,
                            stored,
                            received: state.time,
                        });
                    }
                    StalePolicy::Accept => {
                        tracing::warn!(
                            %room_id,
                            stored,
                            received = state.time,
                            "applying out-of-order update"
                        );
                    }
                }
            }
        }

        let state = Arc::new(state);
        self.rooms.insert(
            room_id,
            Entry {
                state: Arc::clone(&state),
                epoch: self.epoch,
            },
        );
        Ok(state)
    }

    /// Starts a new epoch: the next update for every room is accepted
    /// regardless of its time. Stored states are kept.
    pub fn resync(&mut self) {
        self.epoch += 1;
    }

    /// Returns the latest state of a room, if it ever received an update.
    pub fn get(&self, room_id: &RoomId) -> Option<&Arc<RoomState>> {
        self.rooms.get(room_id).map(|entry| &entry.state)
    }

    /// Number of rooms that have received at least one update.
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

impl Default for RoomStateStore {
    fn default() -> Self {
        Self::new(StalePolicy::default())
    }
}
