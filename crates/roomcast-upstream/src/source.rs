//! The producer binding.
//!
//! [`WorldSource`] is everything the relay needs from the simulation: the
//! room enumeration and per-room terrain, fetched once at startup, and a
//! long-lived stream of room snapshots.
//!
//! [`HttpWorldSource`] speaks to a producer over plain HTTP for the
//! request/response calls and a WebSocket for the stream:
//!
//! ```text
//! GET  {sim}/rooms                  → [{"q":0,"r":0}, ...]
//! GET  {sim}/rooms/{q}/{r}/terrain  → opaque terrain JSON
//! WS   {sim}/entities               → one RoomEntities JSON per text frame
//! ```

use std::future::Future;

use futures_util::{SinkExt, StreamExt};
use roomcast_protocol::{RoomEntities, RoomId, Terrain};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use crate::UpstreamError;

/// A source of room data.
pub trait WorldSource: Send + Sync + 'static {
    /// The snapshot stream type.
    type Stream: EntityStream;

    /// Lists every room the world currently has.
    fn room_list(&self) -> impl Future<Output = Result<Vec<RoomId>, UpstreamError>> + Send;

    /// Fetches the static terrain for one room.
    fn room_terrain(
        &self,
        room_id: RoomId,
    ) -> impl Future<Output = Result<Terrain, UpstreamError>> + Send;

    /// Opens the snapshot stream.
    fn open_entities(&self) -> impl Future<Output = Result<Self::Stream, UpstreamError>> + Send;
}

/// An open snapshot stream.
pub trait EntityStream: Send + 'static {
    /// Waits for the next snapshot.
    ///
    /// Returns `Ok(None)` when the producer closed the stream cleanly.
    fn next_snapshot(
        &mut self,
    ) -> impl Future<Output = Result<Option<RoomEntities>, UpstreamError>> + Send;
}

// ---------------------------------------------------------------------------
// HTTP + WebSocket binding
// ---------------------------------------------------------------------------

/// A producer reached over HTTP and WebSocket.
#[derive(Debug, Clone)]
pub struct HttpWorldSource {
    client: reqwest::Client,
    base: String,
    entities_url: String,
}

impl HttpWorldSource {
    /// Creates a source for the producer at `base`
    /// (for example `http://localhost:50051`).
    ///
    /// # Errors
    /// [`UpstreamError::InvalidAddress`] unless `base` is an `http://` or
    /// `https://` URL.
    pub fn new(base: impl Into<String>) -> Result<Self, UpstreamError> {
        let base = base.into().trim_end_matches('/').to_owned();
        let ws_base = if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{rest}")
        } else if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{rest}")
        } else {
            return Err(UpstreamError::InvalidAddress(base));
        };

        Ok(Self {
            client: reqwest::Client::new(),
            entities_url: format!("{ws_base}/entities"),
            base,
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: String) -> Result<T, UpstreamError> {
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status {
                url,
                status: status.as_u16(),
            });
        }
        Ok(response.json().await?)
    }
}

impl WorldSource for HttpWorldSource {
    type Stream = WsEntityStream;

    async fn room_list(&self) -> Result<Vec<RoomId>, UpstreamError> {
        self.get_json(format!("{}/rooms", self.base)).await
    }

    async fn room_terrain(&self, room_id: RoomId) -> Result<Terrain, UpstreamError> {
        self.get_json(format!(
            "{}/rooms/{}/{}/terrain",
            self.base, room_id.q, room_id.r
        ))
        .await
    }

    async fn open_entities(&self) -> Result<WsEntityStream, UpstreamError> {
        let (ws, _) = connect_async(&self.entities_url).await?;
        tracing::debug!(url = %self.entities_url, "snapshot stream opened");
        Ok(WsEntityStream { ws })
    }
}

/// Snapshot stream over a WebSocket.
pub struct WsEntityStream {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl EntityStream for WsEntityStream {
    async fn next_snapshot(&mut self) -> Result<Option<RoomEntities>, UpstreamError> {
        while let Some(msg) = self.ws.next().await {
            match msg? {
                Message::Text(text) => match serde_json::from_str(text.as_str()) {
                    Ok(snapshot) => return Ok(Some(snapshot)),
                    Err(e) => tracing::warn!(error = %e, "skipping malformed snapshot"),
                },
                Message::Ping(payload) => self.ws.send(Message::Pong(payload)).await?,
                Message::Close(_) => return Ok(None),
                _ => {}
            }
        }
        Ok(None)
    }
}
