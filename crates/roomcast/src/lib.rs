//! # Roomcast
//!
//! Realtime relay of room snapshots from one simulation producer to many
//! viewers.
//!
//! The producer streams whole-room snapshots; Roomcast keeps the latest
//! one per room and pushes it to every viewer subscribed to that room over
//! a WebSocket. Viewers choose rooms with small JSON control frames and get
//! the room's terrain once, on subscribe.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use roomcast::prelude::*;
//!
//! # async fn start() -> Result<(), RoomcastError> {
//! let server = RoomcastServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .sim_addr("http://localhost:50051")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod router;
mod server;

pub use error::RoomcastError;
pub use server::{DEFAULT_ADDR, DEFAULT_SIM_ADDR, RoomcastServer, RoomcastServerBuilder};

/// Re-exports of the types most deployments and tests need.
pub mod prelude {
    pub use crate::{RoomcastError, RoomcastServer, RoomcastServerBuilder};
    pub use roomcast_hub::{HubConfig, HubHandle, HubStats, StalePolicy};
    pub use roomcast_protocol::{
        ClientMessage, RoomEntities, RoomId, RoomState, ServerMessage, Terrain,
    };
    pub use roomcast_session::SessionConfig;
    pub use roomcast_upstream::{BackoffConfig, EntityStream, UpstreamError, WorldSource};
}
