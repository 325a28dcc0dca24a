//! `RoomcastServer` builder and server loop.
//!
//! This is the entry point for running a relay. Building ties the layers
//! together in startup order: terrain enumeration, hub, producer stream,
//! then the listener. Any failure along the way is returned and the
//! server never starts accepting viewers.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use roomcast_hub::{HubConfig, HubHandle, spawn_hub};
use roomcast_session::SessionConfig;
use roomcast_upstream::{BackoffConfig, HttpWorldSource, Ingestor, WorldSource, load_terrain};
use tokio::net::TcpListener;

use crate::RoomcastError;
use crate::router::{AppState, build_router};

/// Default viewer listen address.
pub const DEFAULT_ADDR: &str = "127.0.0.1:8080";

/// Default producer address.
pub const DEFAULT_SIM_ADDR: &str = "http://localhost:50051";

/// Builder for configuring and starting a relay.
///
/// # Example
///
/// ```rust,ignore
/// use roomcast::prelude::*;
///
/// let server = RoomcastServer::builder()
///     .bind("0.0.0.0:8080")
///     .sim_addr("http://sim:50051")
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct RoomcastServerBuilder {
    bind_addr: String,
    sim_addr: String,
    session_config: SessionConfig,
    hub_config: HubConfig,
    backoff: BackoffConfig,
}

impl RoomcastServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: DEFAULT_ADDR.to_string(),
            sim_addr: DEFAULT_SIM_ADDR.to_string(),
            session_config: SessionConfig::default(),
            hub_config: HubConfig::default(),
            backoff: BackoffConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the producer address used by [`build`](Self::build).
    pub fn sim_addr(mut self, addr: &str) -> Self {
        self.sim_addr = addr.to_string();
        self
    }

    /// Sets the per-session limits and deadlines.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    pub fn hub_config(mut self, config: HubConfig) -> Self {
        self.hub_config = config;
        self
    }

    pub fn backoff(mut self, config: BackoffConfig) -> Self {
        self.backoff = config;
        self
    }

    /// Builds the server against the HTTP/WebSocket producer at
    /// `sim_addr`.
    pub async fn build(self) -> Result<RoomcastServer, RoomcastError> {
        let source = HttpWorldSource::new(self.sim_addr.as_str())?;
        self.build_with_source(source).await
    }

    /// Builds the server against any producer binding.
    ///
    /// # Errors
    /// Terrain enumeration, the first stream open and the bind are all
    /// fatal.
    pub async fn build_with_source<S: WorldSource>(
        self,
        source: S,
    ) -> Result<RoomcastServer, RoomcastError> {
        let terrain = load_terrain(&source).await?;
        tracing::info!(rooms = terrain.len(), "terrain loaded");

        let hub = spawn_hub(self.hub_config, terrain);
        let ingestor = Ingestor::connect(source, hub.updates(), self.backoff).await?;
        tokio::spawn(ingestor.run());

        let listener = TcpListener::bind(&self.bind_addr)
            .await
            .map_err(|source| RoomcastError::Bind {
                addr: self.bind_addr.clone(),
                source,
            })?;

        let state = Arc::new(AppState {
            hub: hub.clone(),
            session: self.session_config,
        });

        Ok(RoomcastServer {
            listener,
            router: build_router(state),
            hub,
        })
    }
}

impl Default for RoomcastServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A relay ready to accept viewers.
///
/// Call [`run()`](Self::run) to start serving.
pub struct RoomcastServer {
    listener: TcpListener,
    router: Router,
    hub: HubHandle,
}

impl RoomcastServer {
    /// Creates a new builder.
    pub fn builder() -> RoomcastServerBuilder {
        RoomcastServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// A handle to the running hub.
    pub fn hub(&self) -> HubHandle {
        self.hub.clone()
    }

    /// Serves HTTP and WebSocket traffic until the process is terminated.
    pub async fn run(self) -> Result<(), RoomcastError> {
        if let Ok(addr) = self.listener.local_addr() {
            tracing::info!(%addr, "roomcast listening");
        }
        axum::serve(self.listener, self.router)
            .await
            .map_err(RoomcastError::Serve)
    }
}
