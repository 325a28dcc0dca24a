//! Integration tests for the relay: HTTP surface, upgrade and full data flow.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use roomcast::prelude::*;
use serde_json::{Value, json};
use tokio::sync::{Mutex, mpsc};
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Producer fed by the test
// =========================================================================

/// A producer whose snapshot stream is an mpsc channel the test writes to.
struct ChannelWorld {
    stream: Mutex<Option<mpsc::Receiver<RoomEntities>>>,
}

struct ChannelStream {
    rx: mpsc::Receiver<RoomEntities>,
}

impl EntityStream for ChannelStream {
    async fn next_snapshot(&mut self) -> Result<Option<RoomEntities>, UpstreamError> {
        Ok(self.rx.recv().await)
    }
}

impl WorldSource for ChannelWorld {
    type Stream = ChannelStream;

    async fn room_list(&self) -> Result<Vec<RoomId>, UpstreamError> {
        Ok(vec![RoomId::new(0, 0), RoomId::new(2, 4)])
    }

    async fn room_terrain(&self, room_id: RoomId) -> Result<Terrain, UpstreamError> {
        Ok(json!({"room": [room_id.q, room_id.r], "tiles": "grass"}))
    }

    async fn open_entities(&self) -> Result<ChannelStream, UpstreamError> {
        self.stream
            .lock()
            .await
            .take()
            .map(|rx| ChannelStream { rx })
            .ok_or_else(|| UpstreamError::InvalidAddress("stream already taken".into()))
    }
}

/// Producer that cannot enumerate rooms.
struct DeadWorld;

impl WorldSource for DeadWorld {
    type Stream = ChannelStream;

    async fn room_list(&self) -> Result<Vec<RoomId>, UpstreamError> {
        Err(UpstreamError::Status {
            url: "/rooms".into(),
            status: 503,
        })
    }

    async fn room_terrain(&self, _room_id: RoomId) -> Result<Terrain, UpstreamError> {
        unreachable!("never enumerated")
    }

    async fn open_entities(&self) -> Result<ChannelStream, UpstreamError> {
        unreachable!("never opened")
    }
}

// =========================================================================
// Helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

struct Relay {
    addr: String,
    hub: HubHandle,
    producer: mpsc::Sender<RoomEntities>,
}

/// Starts a relay on a random port, fed by a channel producer.
async fn start_server(session: SessionConfig) -> Relay {
    let (producer, rx) = mpsc::channel(64);
    let world = ChannelWorld {
        stream: Mutex::new(Some(rx)),
    };

    let server = RoomcastServerBuilder::new()
        .bind("127.0.0.1:0")
        .session_config(session)
        .build_with_source(world)
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();
    let hub = server.hub();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    Relay {
        addr,
        hub,
        producer,
    }
}

async fn connect(addr: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/object-stream"))
        .await
        .expect("should connect");
    ws
}

async fn subscribe(ws: &mut ClientWs, q: i32, r: i32) {
    let frame = json!({"ty": "room_id", "room_id": {"q": q, "r": r}});
    ws.send(Message::Text(frame.to_string().into()))
        .await
        .expect("send subscribe");
}

/// Reads the next text frame as JSON.
async fn next_json(ws: &mut ClientWs) -> Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("timed out")
            .expect("stream ended")
            .expect("read failed");
        match msg {
            Message::Text(text) => return serde_json::from_str(text.as_str()).unwrap(),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("unexpected message: {other:?}"),
        }
    }
}

fn snapshot(q: i32, r: i32, time: i64) -> RoomEntities {
    RoomEntities {
        world_time: time,
        room_id: RoomId::new(q, r),
        bots: vec![json!({"id": "bot-1", "hp": 10})],
        structures: vec![json!({"id": "wall"})],
        resources: vec![],
    }
}

/// Waits until the connection is closed by the server.
async fn expect_closed(ws: &mut ClientWs) {
    let closed = tokio::time::timeout(Duration::from_secs(2), async {
        while let Some(msg) = ws.next().await {
            match msg {
                Ok(Message::Close(_)) | Err(_) => return,
                Ok(_) => continue,
            }
        }
    })
    .await;
    assert!(closed.is_ok(), "server did not close the connection");
}

async fn wait_for_sessions(hub: &HubHandle, expected: usize) {
    for _ in 0..200 {
        if hub.stats().await.unwrap().sessions == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("hub never reached {expected} sessions");
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_health_is_no_content() {
    let relay = start_server(SessionConfig::default()).await;
    let response = reqwest::get(format!("http://{}/health", relay.addr))
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 204);
    assert!(response.bytes().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_startup_fails_without_terrain() {
    let result = RoomcastServerBuilder::new()
        .bind("127.0.0.1:0")
        .build_with_source(DeadWorld)
        .await;
    assert!(matches!(
        result,
        Err(RoomcastError::Upstream(UpstreamError::Status { status: 503, .. }))
    ));
}

#[tokio::test]
async fn test_subscribe_receives_terrain_then_snapshots() {
    let relay = start_server(SessionConfig::default()).await;
    let mut ws = connect(&relay.addr).await;

    subscribe(&mut ws, 2, 4).await;
    let terrain = next_json(&mut ws).await;
    assert_eq!(terrain["ty"], "terrain");
    assert_eq!(terrain["payload"]["room"], json!([2, 4]));

    relay.producer.send(snapshot(9, 9, 1)).await.unwrap();
    relay.producer.send(snapshot(2, 4, 1)).await.unwrap();
    relay.producer.send(snapshot(2, 4, 2)).await.unwrap();

    for expected in 1..=2 {
        let msg = next_json(&mut ws).await;
        assert_eq!(msg["ty"], "entities");
        assert_eq!(msg["payload"]["time"], expected);
        assert_eq!(msg["payload"]["roomId"], json!({"q": 2, "r": 4}));
        assert_eq!(msg["payload"]["bots"][0]["id"], "bot-1");
        assert_eq!(msg["payload"]["structures"], json!([{"id": "wall"}]));
        assert_eq!(msg["payload"]["resources"], json!([]));
    }
}

#[tokio::test]
async fn test_two_viewers_share_a_room() {
    let relay = start_server(SessionConfig::default()).await;
    let mut a = connect(&relay.addr).await;
    let mut b = connect(&relay.addr).await;

    subscribe(&mut a, 0, 0).await;
    subscribe(&mut b, 0, 0).await;
    next_json(&mut a).await;
    next_json(&mut b).await;

    relay.producer.send(snapshot(0, 0, 5)).await.unwrap();
    assert_eq!(next_json(&mut a).await["payload"]["time"], 5);
    assert_eq!(next_json(&mut b).await["payload"]["time"], 5);
}

#[tokio::test]
async fn test_unknown_tag_closes_connection() {
    let relay = start_server(SessionConfig::default()).await;
    let mut ws = connect(&relay.addr).await;
    wait_for_sessions(&relay.hub, 1).await;

    ws.send(Message::Text(r#"{"ty":"hello"}"#.into()))
        .await
        .unwrap();
    expect_closed(&mut ws).await;
    wait_for_sessions(&relay.hub, 0).await;
}

#[tokio::test]
async fn test_oversized_frame_closes_connection() {
    let relay = start_server(SessionConfig::default()).await;
    let mut ws = connect(&relay.addr).await;

    let padded = format!(
        r#"{{"ty":"room_id","room_id":{{"q":0,"r":0}},"pad":"{}"}}"#,
        "x".repeat(512)
    );
    // The server may reset the socket before the write completes.
    let _ = ws.send(Message::Text(padded.into())).await;
    expect_closed(&mut ws).await;
}

#[tokio::test]
async fn test_client_disconnect_unregisters() {
    let relay = start_server(SessionConfig::default()).await;
    let mut ws = connect(&relay.addr).await;
    subscribe(&mut ws, 0, 0).await;
    next_json(&mut ws).await;
    assert_eq!(relay.hub.stats().await.unwrap().sessions, 1);

    ws.close(None).await.unwrap();
    wait_for_sessions(&relay.hub, 0).await;

    // Fan-out to a room nobody watches any more is harmless.
    relay.producer.send(snapshot(0, 0, 1)).await.unwrap();
    for _ in 0..200 {
        if relay.hub.stats().await.unwrap().updates == 1 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("update never applied");
}

#[tokio::test]
async fn test_subscription_cap_is_not_fatal() {
    let relay = start_server(SessionConfig {
        max_subscriptions: 1,
        ..SessionConfig::default()
    })
    .await;
    let mut ws = connect(&relay.addr).await;

    subscribe(&mut ws, 0, 0).await;
    subscribe(&mut ws, 2, 4).await;
    assert_eq!(next_json(&mut ws).await["payload"]["room"], json!([0, 0]));

    relay.producer.send(snapshot(2, 4, 1)).await.unwrap();
    relay.producer.send(snapshot(0, 0, 1)).await.unwrap();
    let msg = next_json(&mut ws).await;
    assert_eq!(msg["ty"], "entities");
    assert_eq!(msg["payload"]["roomId"], json!({"q": 0, "r": 0}));
}
