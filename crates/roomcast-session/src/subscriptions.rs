//! A session's own, size-capped set of subscribed rooms.

use std::collections::HashSet;

use roomcast_protocol::RoomId;

use crate::SessionError;

/// The rooms a session is subscribed to.
///
/// Written only by the session's inbound loop. The hub holds a routing
/// copy that the session keeps in sync by forwarding every accepted
/// change.
#[derive(Debug, Clone)]
pub struct Subscriptions {
    rooms: HashSet<RoomId>,
    max: usize,
}

impl Subscriptions {
    /// Creates an empty set holding at most `max` rooms.
    pub fn new(max: usize) -> Self {
        Self {
            rooms: HashSet::new(),
            max,
        }
    }

    /// Adds a room.
    ///
    /// Returns `Ok(true)` if the room was added, `Ok(false)` if it was
    /// already present (re-subscribing never counts against the cap).
    ///
    /// # Errors
    /// [`SessionError::TooManySubscriptions`] when the set is full.
    pub fn insert(&mut self, room_id: RoomId) -> Result<bool, SessionError> {
        if self.rooms.contains(&room_id) {
            return Ok(false);
        }
        if self.rooms.len() >= self.max {
            return Err(SessionError::TooManySubscriptions { max: self.max });
        }
        Ok(self.rooms.insert(room_id))
    }

    /// Removes a room. Removing an absent room leaves the set unchanged
    /// and returns `false`.
    pub fn remove(&mut self, room_id: &RoomId) -> bool {
        self.rooms.remove(room_id)
    }

    pub fn contains(&self, room_id: &RoomId) -> bool {
        self.rooms.contains(room_id)
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RoomId> {
        self.rooms.iter()
    }
}
