//! Wire protocol for Roomcast.
//!
//! This crate defines the "language" spoken on both edges of the relay:
//!
//! - **Upstream** ([`RoomEntities`]): one snapshot of a room as emitted
//!   by the simulation producer.
//! - **Downstream** ([`ClientMessage`], [`ServerMessage`]): the JSON
//!   frames exchanged with viewers.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those messages
//!   are converted to/from text frames.
//! - **Errors** ([`ProtocolError`]): what can go wrong while doing so.
//!
//! The protocol layer knows nothing about sockets, sessions or the hub.
//!
//! ```text
//! Producer (RoomEntities) → Hub (RoomState) → Session (ServerMessage) → viewer
//! ```

mod codec;
mod error;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use types::{
    ClientMessage, Entity, RoomEntities, RoomId, RoomState, ServerMessage,
    Terrain,
};
