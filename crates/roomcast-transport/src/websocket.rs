//! WebSocket halves over an upgraded `axum` socket.

use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};

use crate::{Frame, FrameSink, FrameSource, SessionId, TransportError};

/// Splits an upgraded socket into independently owned read and write halves.
pub fn split(socket: WebSocket, id: SessionId) -> (WsSource, WsSink) {
    let (sink, stream) = socket.split();
    tracing::debug!(%id, "split WebSocket connection");
    (WsSource { id, stream }, WsSink { id, sink })
}

/// Read half of a viewer WebSocket.
pub struct WsSource {
    id: SessionId,
    stream: SplitStream<WebSocket>,
}

impl WsSource {
    pub fn id(&self) -> SessionId {
        self.id
    }
}

impl FrameSource for WsSource {
    type Error = TransportError;

    async fn recv(&mut self) -> Result<Option<Frame>, Self::Error> {
        match self.stream.next().await {
            Some(Ok(Message::Text(text))) => Ok(Some(Frame::Text(text.as_str().to_owned()))),
            Some(Ok(Message::Binary(data))) => Ok(Some(Frame::Binary(data.to_vec()))),
            Some(Ok(Message::Ping(data))) => Ok(Some(Frame::Ping(data.to_vec()))),
            Some(Ok(Message::Pong(data))) => Ok(Some(Frame::Pong(data.to_vec()))),
            Some(Ok(Message::Close(_))) | None => Ok(None),
            Some(Err(e)) => Err(TransportError::ReceiveFailed(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                e,
            ))),
        }
    }
}

/// Write half of a viewer WebSocket.
pub struct WsSink {
    id: SessionId,
    sink: SplitSink<WebSocket, Message>,
}

impl WsSink {
    pub fn id(&self) -> SessionId {
        self.id
    }
}

impl FrameSink for WsSink {
    type Error = TransportError;

    async fn send(&mut self, frame: Frame) -> Result<(), Self::Error> {
        let msg = match frame {
            Frame::Text(text) => Message::Text(text.into()),
            Frame::Binary(data) => Message::Binary(data.into()),
            Frame::Ping(data) => Message::Ping(data.into()),
            Frame::Pong(data) => Message::Pong(data.into()),
        };
        self.sink.send(msg).await.map_err(|e| {
            TransportError::SendFailed(std::io::Error::new(std::io::ErrorKind::BrokenPipe, e))
        })
    }

    async fn close(&mut self) -> Result<(), Self::Error> {
        self.sink.close().await.map_err(|e| {
            TransportError::SendFailed(std::io::Error::new(std::io::ErrorKind::BrokenPipe, e))
        })
    }
}
