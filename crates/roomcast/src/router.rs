//! HTTP surface: the health probe and the viewer WebSocket endpoint.
//!
//! ```text
//! GET /health         → 204 No Content
//! GET /object-stream  → WebSocket upgrade, one ClientSession per socket
//! ```

use std::sync::Arc;

use axum::Router;
use axum::extract::ws::WebSocket;
use axum::extract::{State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use roomcast_hub::HubHandle;
use roomcast_session::{ClientSession, SessionConfig};
use roomcast_transport::SessionId;
use tower_http::trace::TraceLayer;

/// State shared by every request handler.
pub(crate) struct AppState {
    pub(crate) hub: HubHandle,
    pub(crate) session: SessionConfig,
}

pub(crate) fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/object-stream", get(object_stream))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn object_stream(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let limit = state.session.max_frame_bytes;
    ws.max_message_size(limit)
        .max_frame_size(limit)
        .on_upgrade(move |socket| run_session(socket, state))
}

async fn run_session(socket: WebSocket, state: Arc<AppState>) {
    let id = SessionId::next();
    let (source, sink) = roomcast_transport::split(socket, id);
    ClientSession::new(id, state.hub.clone(), state.session.clone())
        .run(source, sink)
        .await;
}
