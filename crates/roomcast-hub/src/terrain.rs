//! Static terrain cache, filled once before the first viewer connects.

use std::collections::HashMap;
use std::sync::Arc;

use roomcast_protocol::{RoomId, Terrain};

/// Mapping from room to its terrain payload.
///
/// Built during startup (see `roomcast_upstream::load_terrain`) and then
/// moved into the hub, which only ever reads it.
#[derive(Debug, Clone, Default)]
pub struct TerrainCache {
    rooms: HashMap<RoomId, Arc<Terrain>>,
}

impl TerrainCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the terrain of one room. Only used while populating.
    pub fn insert(&mut self, room_id: RoomId, terrain: Terrain) {
        self.rooms.insert(room_id, Arc::new(terrain));
    }

    /// Returns the cached payload, or `None` if the room was not part of
    /// the startup enumeration.
    pub fn lookup(&self, room_id: &RoomId) -> Option<Arc<Terrain>> {
        self.rooms.get(room_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

impl FromIterator<(RoomId, Terrain)> for TerrainCache {
    fn from_iter<I: IntoIterator<Item = (RoomId, Terrain)>>(iter: I) -> Self {
        let mut cache = Self::new();
        for (room_id, terrain) in iter {
            cache.insert(room_id, terrain);
        }
        cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_present_and_absent() {
        let cache: TerrainCache = [(RoomId::new(0, 0), json!({"tiles": [1, 2]}))]
            .into_iter()
            .collect();

        assert_eq!(
            cache.lookup(&RoomId::new(0, 0)).as_deref(),
            Some(&json!({"tiles": [1, 2]}))
        );
        assert!(cache.lookup(&RoomId::new(9, 9)).is_none());
        assert_eq!(cache.len(), 1);
    }
}
