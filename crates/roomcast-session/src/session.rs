//! The client session: one viewer connection bridged to the hub.
//!
//! A session runs two loops concurrently over the two halves of its
//! connection:
//!
//! - **inbound** reads control frames, maintains the subscription set and
//!   mirrors every accepted change to the hub;
//! - **outbound** drains the bounded queue the hub fills and sends a
//!   liveness probe on a timer.
//!
//! Whichever loop ends first ends the session. Both converge on a single
//! cleanup path that de-registers from the hub and closes the socket, so
//! cleanup happens exactly once whatever the cause.
//!
//! ```text
//! registered(∅) ──subscribe/unsubscribe──→ registered(S) ──end──→ removed
//! ```

use std::fmt;

use roomcast_hub::{HubHandle, OutboundReceiver, outbound_queue};
use roomcast_protocol::{ClientMessage, Codec, JsonCodec, ProtocolError};
use roomcast_transport::{Frame, FrameSink, FrameSource, SessionId};
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::{SessionConfig, SessionError, Subscriptions};

/// Why a session ended.
#[derive(Debug)]
pub enum SessionEnd {
    /// The viewer closed the connection.
    PeerClosed,
    /// The hub closed the outbound queue (slow consumer).
    Evicted,
    /// A protocol violation, deadline or transport failure.
    Failed(SessionError),
}

impl fmt::Display for SessionEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PeerClosed => write!(f, "peer closed"),
            Self::Evicted => write!(f, "evicted"),
            Self::Failed(e) => write!(f, "failed: {e}"),
        }
    }
}

/// One viewer session.
pub struct ClientSession<C: Codec = JsonCodec> {
    id: SessionId,
    hub: HubHandle,
    config: SessionConfig,
    codec: C,
}

impl ClientSession<JsonCodec> {
    /// Creates a session speaking the JSON protocol.
    pub fn new(id: SessionId, hub: HubHandle, config: SessionConfig) -> Self {
        Self::with_codec(id, hub, config, JsonCodec)
    }
}

impl<C: Codec> ClientSession<C> {
    pub fn with_codec(id: SessionId, hub: HubHandle, config: SessionConfig, codec: C) -> Self {
        Self {
            id,
            hub,
            config,
            codec,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Registers with the hub, runs both loops until one of them ends,
    /// then de-registers and closes the connection.
    pub async fn run<Src, Snk>(self, mut source: Src, mut sink: Snk) -> SessionEnd
    where
        Src: FrameSource,
        Snk: FrameSink,
    {
        let session_id = self.id;
        let (outbound, mut queue) = outbound_queue(self.config.outbound_capacity);

        if let Err(e) = self.hub.register(session_id, outbound).await {
            let _ = sink.close().await;
            return SessionEnd::Failed(e.into());
        }
        tracing::info!(%session_id, "session started");

        let mut subscriptions = Subscriptions::new(self.config.max_subscriptions);

        let end = tokio::select! {
            end = self.inbound(&mut source, &mut subscriptions) => end,
            end = self.outbound(&mut sink, &mut queue) => end,
        };

        if let Err(e) = self.hub.unregister(session_id).await {
            tracing::debug!(%session_id, error = %e, "de-registration failed");
        }
        if let Err(e) = sink.close().await {
            tracing::debug!(%session_id, error = %e, "close failed");
        }

        match &end {
            SessionEnd::Failed(SessionError::Protocol(e)) => {
                tracing::info!(%session_id, error = %e, "session ended on protocol violation");
            }
            end => tracing::info!(%session_id, %end, "session ended"),
        }
        end
    }

    // -----------------------------------------------------------------------
    // Inbound loop
    // -----------------------------------------------------------------------

    async fn inbound<Src: FrameSource>(
        &self,
        source: &mut Src,
        subscriptions: &mut Subscriptions,
    ) -> SessionEnd {
        let mut deadline = Instant::now() + self.config.idle_timeout;

        loop {
            let frame = match time::timeout_at(deadline, source.recv()).await {
                Ok(Ok(Some(frame))) => frame,
                Ok(Ok(None)) => return SessionEnd::PeerClosed,
                Ok(Err(e)) => return SessionEnd::Failed(SessionError::Transport(Box::new(e))),
                Err(_) => return SessionEnd::Failed(SessionError::IdleTimeout),
            };

            let text = match frame {
                Frame::Text(text) => text,
                Frame::Pong(_) => {
                    deadline = Instant::now() + self.config.idle_timeout;
                    continue;
                }
                Frame::Ping(_) => continue,
                Frame::Binary(_) => {
                    return SessionEnd::Failed(SessionError::Protocol(
                        ProtocolError::UnexpectedFrame("binary"),
                    ));
                }
            };

            if let Err(e) = self.handle_control(&text, subscriptions).await {
                return SessionEnd::Failed(e);
            }
        }
    }

    /// Applies one control frame. Only a rejected subscribe is tolerated;
    /// any other error ends the session.
    async fn handle_control(
        &self,
        text: &str,
        subscriptions: &mut Subscriptions,
    ) -> Result<(), SessionError> {
        if text.len() > self.config.max_frame_bytes {
            return Err(ProtocolError::FrameTooLarge {
                len: text.len(),
                max: self.config.max_frame_bytes,
            }
            .into());
        }

        let session_id = self.id;
        match self.codec.decode::<ClientMessage>(text)? {
            ClientMessage::Subscribe { room_id } => match subscriptions.insert(room_id) {
                Ok(_) => {
                    tracing::debug!(%session_id, %room_id, "subscribed");
                    self.hub.subscribe(session_id, room_id).await?;
                }
                Err(e) => {
                    tracing::warn!(%session_id, %room_id, error = %e, "subscription rejected");
                }
            },
            ClientMessage::Unsubscribe { room_id } => {
                if subscriptions.remove(&room_id) {
                    tracing::debug!(%session_id, %room_id, "unsubscribed");
                    self.hub.unsubscribe(session_id, room_id).await?;
                }
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Outbound loop
    // -----------------------------------------------------------------------

    async fn outbound<Snk: FrameSink>(
        &self,
        sink: &mut Snk,
        queue: &mut OutboundReceiver,
    ) -> SessionEnd {
        let period = self.config.ping_interval;
        let mut probe = time::interval_at(Instant::now() + period, period);
        probe.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let frame = tokio::select! {
                msg = queue.recv() => match msg {
                    Some(msg) => match self.codec.encode(&msg) {
                        Ok(text) => Frame::Text(text),
                        Err(e) => return SessionEnd::Failed(e.into()),
                    },
                    None => return SessionEnd::Evicted,
                },
                _ = probe.tick() => Frame::Ping(Vec::new()),
            };

            if let Err(e) = self.write(sink, frame).await {
                return SessionEnd::Failed(e);
            }
        }
    }

    async fn write<Snk: FrameSink>(&self, sink: &mut Snk, frame: Frame) -> Result<(), SessionError> {
        time::timeout(self.config.write_timeout, sink.send(frame))
            .await
            .map_err(|_| SessionError::WriteTimeout)?
            .map_err(|e| SessionError::Transport(Box::new(e)))
    }
}
