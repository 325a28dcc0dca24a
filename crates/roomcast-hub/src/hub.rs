//! Hub actor: the single task that owns room state and fans out.
//!
//! The hub runs as one Tokio task fed exclusively through channels, so
//! the room state store, the terrain cache and the registry need no
//! locks. Its only suspension point is waiting for the next event.

use roomcast_protocol::{RoomEntities, RoomId, RoomState, ServerMessage};
use roomcast_transport::SessionId;
use tokio::sync::{mpsc, oneshot};

use crate::registry::{Delivery, OutboundSender, Registry};
use crate::{HubConfig, HubError, RoomStateStore, TerrainCache};

/// Items on the upstream update channel.
#[derive(Debug, Clone)]
pub enum Upstream {
    /// The producer stream was (re)opened; snapshots that follow may carry
    /// a clock that started over.
    Resync,
    /// One room snapshot.
    Snapshot(RoomEntities),
}

/// Sender half of the update channel, held by the upstream ingestor.
pub type UpdateSender = mpsc::Sender<Upstream>;

/// A session asking to be added to the registry.
#[derive(Debug)]
pub struct Registration {
    pub session_id: SessionId,
    pub outbound: OutboundSender,
}

/// Subscription changes and queries.
pub(crate) enum HubCommand {
    Subscribe {
        session_id: SessionId,
        room_id: RoomId,
    },
    Unsubscribe {
        session_id: SessionId,
        room_id: RoomId,
    },
    Stats {
        reply: oneshot::Sender<HubStats>,
    },
}

/// Counters describing the hub at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HubStats {
    /// Registered sessions.
    pub sessions: usize,
    /// Rooms with a stored state.
    pub rooms: usize,
    /// Rooms in the terrain cache.
    pub terrain_rooms: usize,
    /// Snapshots applied to the store.
    pub updates: u64,
    /// Snapshots refused as stale.
    pub rejected_updates: u64,
    /// Sessions evicted for a full outbound queue.
    pub evictions: u64,
}

/// Handle to the running hub. Cheap to clone; one per session plus the
/// ingestor's update sender.
#[derive(Clone)]
pub struct HubHandle {
    updates: UpdateSender,
    register: mpsc::Sender<Registration>,
    unregister: mpsc::Sender<SessionId>,
    control: mpsc::Sender<HubCommand>,
}

impl HubHandle {
    /// Returns a sender for the upstream update channel.
    pub fn updates(&self) -> UpdateSender {
        self.updates.clone()
    }

    /// Registers a session with an empty subscription set.
    pub async fn register(
        &self,
        session_id: SessionId,
        outbound: OutboundSender,
    ) -> Result<(), HubError> {
        self.register
            .send(Registration {
                session_id,
                outbound,
            })
            .await
            .map_err(|_| HubError::Unavailable)
    }

    /// Removes a session. Unknown sessions are ignored by the hub.
    pub async fn unregister(&self, session_id: SessionId) -> Result<(), HubError> {
        self.unregister
            .send(session_id)
            .await
            .map_err(|_| HubError::Unavailable)
    }

    /// Routes a room to a session and requests its one-shot terrain push.
    pub async fn subscribe(&self, session_id: SessionId, room_id: RoomId) -> Result<(), HubError> {
        self.control
            .send(HubCommand::Subscribe {
                session_id,
                room_id,
            })
            .await
            .map_err(|_| HubError::Unavailable)
    }

    /// Stops routing a room to a session.
    pub async fn unsubscribe(
        &self,
        session_id: SessionId,
        room_id: RoomId,
    ) -> Result<(), HubError> {
        self.control
            .send(HubCommand::Unsubscribe {
                session_id,
                room_id,
            })
            .await
            .map_err(|_| HubError::Unavailable)
    }

    /// Requests the hub's current counters.
    pub async fn stats(&self) -> Result<HubStats, HubError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.control
            .send(HubCommand::Stats { reply: reply_tx })
            .await
            .map_err(|_| HubError::Unavailable)?;
        reply_rx.await.map_err(|_| HubError::Unavailable)
    }
}

/// Receiving ends of the hub's channels.
pub struct HubInbox {
    updates: mpsc::Receiver<Upstream>,
    register: mpsc::Receiver<Registration>,
    unregister: mpsc::Receiver<SessionId>,
    control: mpsc::Receiver<HubCommand>,
}

/// The hub's owned state.
pub struct Hub {
    store: RoomStateStore,
    terrain: TerrainCache,
    registry: Registry,
    stats: HubStats,
}

impl Hub {
    /// Creates a hub around an already populated terrain cache, along
    /// with its inbox and a handle to reach it.
    pub fn new(config: HubConfig, terrain: TerrainCache) -> (Self, HubInbox, HubHandle) {
        let (updates_tx, updates_rx) = mpsc::channel(config.update_capacity.max(1));
        let (register_tx, register_rx) = mpsc::channel(config.control_capacity.max(1));
        let (unregister_tx, unregister_rx) = mpsc::channel(config.control_capacity.max(1));
        let (control_tx, control_rx) = mpsc::channel(config.control_capacity.max(1));

        let hub = Self {
            store: RoomStateStore::new(config.stale_policy),
            terrain,
            registry: Registry::default(),
            stats: HubStats::default(),
        };
        let inbox = HubInbox {
            updates: updates_rx,
            register: register_rx,
            unregister: unregister_rx,
            control: control_rx,
        };
        let handle = HubHandle {
            updates: updates_tx,
            register: register_tx,
            unregister: unregister_tx,
            control: control_tx,
        };
        (hub, inbox, handle)
    }

    /// Runs the event loop until every handle has been dropped.
    ///
    /// Polling is biased: registration, de-registration, upstream updates,
    /// then subscription changes. A session sends its registration before
    /// any subscribe, so a subscribe is never seen ahead of the
    /// registration it depends on. Viewer control traffic sits below
    /// updates so no amount of it can hold back the snapshot stream.
    pub async fn run(mut self, mut inbox: HubInbox) {
        tracing::info!(terrain_rooms = self.terrain.len(), "hub started");

        loop {
            tokio::select! {
                biased;
                Some(registration) = inbox.register.recv() => {
                    self.handle_register(registration);
                }
                Some(session_id) = inbox.unregister.recv() => {
                    self.handle_unregister(session_id);
                }
                Some(update) = inbox.updates.recv() => {
                    self.handle_update(update);
                }
                Some(cmd) = inbox.control.recv() => {
                    self.handle_command(cmd);
                }
                else => break,
            }
        }

        tracing::info!("hub stopped");
    }

    pub(crate) fn handle_register(&mut self, registration: Registration) {
        let Registration {
            session_id,
            outbound,
        } = registration;
        if !self.registry.register(session_id, outbound) {
            tracing::warn!(%session_id, "session registered twice, replacing");
        }
        tracing::debug!(%session_id, sessions = self.registry.len(), "session registered");
    }

    pub(crate) fn handle_unregister(&mut self, session_id: SessionId) {
        if self.registry.unregister(session_id) {
            tracing::debug!(%session_id, sessions = self.registry.len(), "session removed");
        }
    }

    pub(crate) fn handle_command(&mut self, cmd: HubCommand) {
        match cmd {
            HubCommand::Subscribe {
                session_id,
                room_id,
            } => self.handle_subscribe(session_id, room_id),
            HubCommand::Unsubscribe {
                session_id,
                room_id,
            } => {
                self.registry.unsubscribe(session_id, room_id);
            }
            HubCommand::Stats { reply } => {
                let _ = reply.send(self.stats());
            }
        }
    }

    fn handle_subscribe(&mut self, session_id: SessionId, room_id: RoomId) {
        if !self.registry.subscribe(session_id, room_id) {
            tracing::debug!(%session_id, %room_id, "subscribe from unknown session, ignoring");
            return;
        }

        let terrain = self.terrain.lookup(&room_id);
        if terrain.is_none() {
            tracing::debug!(%session_id, %room_id, "no terrain cached for room");
        }
        if self
            .registry
            .send_to(session_id, ServerMessage::Terrain(terrain))
            == Delivery::Evicted
        {
            self.stats.evictions += 1;
        }
    }

    pub(crate) fn handle_update(&mut self, update: Upstream) {
        let snapshot = match update {
            Upstream::Resync => {
                self.store.resync();
                tracing::debug!("upstream resync");
                return;
            }
            Upstream::Snapshot(snapshot) => snapshot,
        };

        let state = match self.store.upsert(RoomState::from(snapshot)) {
            Ok(state) => state,
            Err(e) => {
                self.stats.rejected_updates += 1;
                tracing::warn!(error = %e, "dropping upstream update");
                return;
            }
        };
        self.stats.updates += 1;

        let out = self.registry.fan_out(&state);
        self.stats.evictions += out.evicted.len() as u64;
        tracing::trace!(
            room_id = %state.room_id,
            time = state.time,
            delivered = out.delivered,
            evicted = out.evicted.len(),
            "room state fanned out"
        );
    }

    pub fn stats(&self) -> HubStats {
        HubStats {
            sessions: self.registry.len(),
            rooms: self.store.len(),
            terrain_rooms: self.terrain.len(),
            ..self.stats
        }
    }

    pub fn store(&self) -> &RoomStateStore {
        &self.store
    }
}

/// Spawns the hub task and returns a handle to communicate with it.
pub fn spawn_hub(config: HubConfig, terrain: TerrainCache) -> HubHandle {
    let (hub, inbox, handle) = Hub::new(config, terrain);
    tokio::spawn(hub.run(inbox));
    handle
}
