//! The session registry and the fan-out policy.
//!
//! Each registered session contributes its outbound queue sender and a
//! routing copy of its subscription set. Enqueues are always
//! non-blocking: a session whose queue is full at that moment is evicted
//! on the spot. Dropping the registry's sender (the only one) closes the
//! session's queue, which is how the session learns it was evicted.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use roomcast_protocol::{RoomId, RoomState, ServerMessage};
use roomcast_transport::SessionId;
use tokio::sync::mpsc::{self, error::TrySendError};

/// Sending side of a session's bounded outbound queue.
pub type OutboundSender = mpsc::Sender<ServerMessage>;

/// Receiving side of a session's bounded outbound queue.
pub type OutboundReceiver = mpsc::Receiver<ServerMessage>;

/// Creates a bounded outbound queue for one session.
pub fn outbound_queue(capacity: usize) -> (OutboundSender, OutboundReceiver) {
    mpsc::channel(capacity.max(1))
}

struct Entry {
    outbound: OutboundSender,
    rooms: HashSet<RoomId>,
}

/// Outcome of one fan-out pass.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct FanOut {
    pub delivered: usize,
    pub evicted: Vec<SessionId>,
}

/// Outcome of a direct enqueue to one session.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Delivery {
    Queued,
    /// The queue was full; the session has been removed.
    Evicted,
    /// The session already went away (or was never registered).
    Gone,
}

#[derive(Default)]
pub(crate) struct Registry {
    sessions: HashMap<SessionId, Entry>,
}

impl Registry {
    /// Adds a session with an empty subscription set. Returns `false`
    /// if the ID was already present (the old entry is replaced).
    pub fn register(&mut self, id: SessionId, outbound: OutboundSender) -> bool {
        self.sessions
            .insert(
                id,
                Entry {
                    outbound,
                    rooms: HashSet::new(),
                },
            )
            .is_none()
    }

    /// Removes a session. Absent IDs are a no-op returning `false`.
    pub fn unregister(&mut self, id: SessionId) -> bool {
        self.sessions.remove(&id).is_some()
    }

    /// Adds a room to a session's routing set. `false` if the session is
    /// not registered.
    pub fn subscribe(&mut self, id: SessionId, room_id: RoomId) -> bool {
        match self.sessions.get_mut(&id) {
            Some(entry) => {
                entry.rooms.insert(room_id);
                true
            }
            None => false,
        }
    }

    /// Removes a room from a session's routing set. `false` if the session
    /// is not registered.
    pub fn unsubscribe(&mut self, id: SessionId, room_id: RoomId) -> bool {
        match self.sessions.get_mut(&id) {
            Some(entry) => {
                entry.rooms.remove(&room_id);
                true
            }
            None => false,
        }
    }

    /// Enqueues `msg` onto one session's queue without waiting.
    pub fn send_to(&mut self, id: SessionId, msg: ServerMessage) -> Delivery {
        let Some(entry) = self.sessions.get(&id) else {
            return Delivery::Gone;
        };
        match entry.outbound.try_send(msg) {
            Ok(()) => Delivery::Queued,
            Err(TrySendError::Full(_)) => {
                self.sessions.remove(&id);
                tracing::info!(session_id = %id, "outbound queue full, session evicted");
                Delivery::Evicted
            }
            Err(TrySendError::Closed(_)) => {
                self.sessions.remove(&id);
                Delivery::Gone
            }
        }
    }

    /// Offers `state` to every session subscribed to its room, in a single
    /// pass over the registry.
    pub fn fan_out(&mut self, state: &Arc<RoomState>) -> FanOut {
        let room_id = state.room_id;
        let mut out = FanOut::default();

        self.sessions.retain(|id, entry| {
            if !entry.rooms.contains(&room_id) {
                return true;
            }
            match entry
                .outbound
                .try_send(ServerMessage::Entities(Arc::clone(state)))
            {
                Ok(()) => {
                    out.delivered += 1;
                    true
                }
                Err(TrySendError::Full(_)) => {
                    tracing::info!(
                        session_id = %id,
                        %room_id,
                        "outbound queue full, session evicted"
                    );
                    out.evicted.push(*id);
                    false
                }
                // The session ended and its de-registration is in flight.
                Err(TrySendError::Closed(_)) => false,
            }
        });

        out
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }
}

#[cfg(test)]
impl Registry {
    fn contains(&self, id: SessionId) -> bool {
        self.sessions.contains_key(&id)
    }

    /// The routing copy of a session's subscriptions.
    fn rooms_of(&self, id: SessionId) -> Option<&HashSet<RoomId>> {
        self.sessions.get(&id).map(|entry| &entry.rooms)
    }
}
