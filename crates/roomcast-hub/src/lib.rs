//! Subscription hub for Roomcast.
//!
//! The hub is the single coordinator of the relay. It runs as one Tokio
//! task (actor model) that owns the latest state of every room, the
//! static terrain cache and the registry of viewer sessions, and decides
//! every fan-out. Everything else reaches it through channels.
//!
//! # Key types
//!
//! - [`Hub`] / [`spawn_hub`]: the event loop
//! - [`HubHandle`]: register, unregister, subscribe, query stats
//! - [`RoomStateStore`]: latest snapshot per room
//! - [`TerrainCache`]: per-room terrain, populated once at startup
//! - [`HubConfig`]: channel capacities and stale-update policy

mod config;
mod error;
mod hub;
mod registry;
mod store;
mod terrain;

pub use config::{HubConfig, StalePolicy};
pub use error::HubError;
pub use hub::{Hub, HubHandle, HubInbox, HubStats, Registration, UpdateSender, Upstream, spawn_hub};
pub use registry::{OutboundReceiver, OutboundSender, outbound_queue};
pub use store::RoomStateStore;
pub use terrain::TerrainCache;
