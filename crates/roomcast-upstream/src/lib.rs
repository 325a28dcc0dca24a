//! Upstream ingestion for Roomcast.
//!
//! Two jobs, both against the simulation producer:
//!
//! 1. **Terrain enumeration** ([`load_terrain`]) runs once at startup and
//!    fills the hub's terrain cache before any viewer can connect.
//! 2. **Snapshot ingestion** ([`Ingestor`]) keeps a stream open for the
//!    life of the process and feeds the hub's update channel, reopening
//!    the stream with [`Backoff`] whenever it ends.
//!
//! The producer itself sits behind [`WorldSource`]; [`HttpWorldSource`] is
//! the shipped binding.

mod backoff;
mod error;
mod ingest;
mod source;

pub use backoff::{
    Backoff, BackoffConfig, DEFAULT_BASE_DELAY, DEFAULT_JITTER, DEFAULT_MAX_DELAY,
    DEFAULT_MULTIPLIER,
};
pub use error::UpstreamError;
pub use ingest::{Ingestor, load_terrain};
pub use source::{EntityStream, HttpWorldSource, WorldSource, WsEntityStream};
