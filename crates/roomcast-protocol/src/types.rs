//! Core protocol types.
//!
//! Every type here travels on a wire: upstream from the simulation
//! producer, or downstream to a viewer.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// An opaque entity record (bot, structure or resource).
///
/// Defined by the producer and passed through unmodified, so it is kept
/// as a raw JSON value instead of a typed struct.
pub type Entity = serde_json::Value;

/// Opaque per-room terrain payload, fetched once at startup.
pub type Terrain = serde_json::Value;

// ---------------------------------------------------------------------------
// RoomId
// ---------------------------------------------------------------------------

/// Axial hex coordinates of a room.
///
/// The partition key for both the state cache and subscription routing.
/// Serialized as `{"q": 1, "r": 2}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomId {
    pub q: i32,
    pub r: i32,
}

impl RoomId {
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.q, self.r)
    }
}

// ---------------------------------------------------------------------------
// Upstream snapshot
// ---------------------------------------------------------------------------

/// One snapshot of a room, exactly as the producer streams it.
///
/// Missing entity arrays decode as empty; the producer omits them for
/// rooms that have nothing of that kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomEntities {
    /// Producer tick at which the snapshot was taken.
    pub world_time: i64,
    pub room_id: RoomId,
    #[serde(default)]
    pub bots: Vec<Entity>,
    #[serde(default)]
    pub structures: Vec<Entity>,
    #[serde(default)]
    pub resources: Vec<Entity>,
}

// ---------------------------------------------------------------------------
// RoomState
// ---------------------------------------------------------------------------

/// The latest known state of one room, as held by the hub and pushed to
/// viewers inside an `entities` frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomState {
    pub time: i64,
    pub room_id: RoomId,
    pub bots: Vec<Entity>,
    pub structures: Vec<Entity>,
    pub resources: Vec<Entity>,
}

impl From<RoomEntities> for RoomState {
    fn from(snapshot: RoomEntities) -> Self {
        Self {
            time: snapshot.world_time,
            room_id: snapshot.room_id,
            bots: snapshot.bots,
            structures: snapshot.structures,
            resources: snapshot.resources,
        }
    }
}

// ---------------------------------------------------------------------------
// Viewer messages
// ---------------------------------------------------------------------------

/// Control frames sent by a viewer.
///
/// `#[serde(tag = "ty")]` makes this an internally tagged enum, so the
/// wire form is `{"ty": "room_id", "room_id": {"q": 0, "r": 0}}`.
/// Any other `ty` fails to decode and is treated as a protocol violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "ty")]
pub enum ClientMessage {
    /// Start receiving terrain and entity updates for a room.
    #[serde(rename = "room_id")]
    Subscribe { room_id: RoomId },

    /// Stop receiving entity updates for a room.
    #[serde(rename = "unsubscribe_room_id")]
    Unsubscribe { room_id: RoomId },
}

/// Frames pushed to a viewer.
///
/// Adjacently tagged: `{"ty": "entities", "payload": {...}}`. Payloads are
/// behind `Arc` because the hub enqueues the same snapshot onto every
/// subscribed session's queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "ty", content = "payload", rename_all = "snake_case")]
pub enum ServerMessage {
    /// One-shot terrain push after a subscribe. `None` (JSON `null`) when
    /// the room was not part of the startup enumeration.
    Terrain(Option<Arc<Terrain>>),
    /// The latest state of a subscribed room.
    Entities(Arc<RoomState>),
}

impl ServerMessage {
    /// Which room this frame is about, when that is known from the payload.
    pub fn room_id(&self) -> Option<RoomId> {
        match self {
            Self::Terrain(_) => None,
            Self::Entities(state) => Some(state.room_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_room_id_display() {
        assert_eq!(RoomId::new(-2, 7).to_string(), "(-2, 7)");
    }

    #[test]
    fn test_subscribe_frame_decodes() {
        let msg: ClientMessage =
            serde_json::from_value(json!({"ty": "room_id", "room_id": {"q": 1, "r": 1}}))
                .unwrap();
        assert_eq!(
            msg,
            ClientMessage::Subscribe {
                room_id: RoomId::new(1, 1)
            }
        );
    }

    #[test]
    fn test_unknown_tag_is_rejected() {
        let res = serde_json::from_value::<ClientMessage>(
            json!({"ty": "join_room", "room_id": {"q": 1, "r": 1}}),
        );
        assert!(res.is_err());
    }

    #[test]
    fn test_missing_room_id_is_rejected() {
        let res = serde_json::from_value::<ClientMessage>(json!({"ty": "room_id"}));
        assert!(res.is_err());
    }

    #[test]
    fn test_entities_frame_shape() {
        let state = RoomState {
            time: 6,
            room_id: RoomId::new(1, 1),
            bots: vec![json!({"id": 1})],
            structures: vec![],
            resources: vec![],
        };
        let value = serde_json::to_value(ServerMessage::Entities(Arc::new(state))).unwrap();
        assert_eq!(
            value,
            json!({
                "ty": "entities",
                "payload": {
                    "time": 6,
                    "roomId": {"q": 1, "r": 1},
                    "bots": [{"id": 1}],
                    "structures": [],
                    "resources": []
                }
            })
        );
    }

    #[test]
    fn test_absent_terrain_is_null_payload() {
        let value = serde_json::to_value(ServerMessage::Terrain(None)).unwrap();
        assert_eq!(value, json!({"ty": "terrain", "payload": null}));
    }

    #[test]
    fn test_upstream_snapshot_defaults_missing_arrays() {
        let snapshot: RoomEntities = serde_json::from_value(json!({
            "world_time": 42,
            "room_id": {"q": 0, "r": 3},
            "bots": [{"id": 9}]
        }))
        .unwrap();
        assert!(snapshot.structures.is_empty());

        let state = RoomState::from(snapshot);
        assert_eq!(state.time, 42);
        assert_eq!(state.room_id, RoomId::new(0, 3));
        assert_eq!(state.bots, vec![json!({"id": 9})]);
    }
}
