//! roomcast-server binary
//!
//! Enumerates terrain from the simulation producer, opens its snapshot
//! stream and serves viewers on `/object-stream`.
//!
//! | Flag / env                                  | Default                  |
//! |---------------------------------------------|--------------------------|
//! | `--addr` / `ROOMCAST_ADDR`                  | `127.0.0.1:8080`         |
//! | `--sim-addr` / `ROOMCAST_SIM_ADDR`          | `http://localhost:50051` |
//! | `--max-subscriptions` / `ROOMCAST_MAX_SUBSCRIPTIONS` | `100`           |
//! | `--outbound-capacity` / `ROOMCAST_OUTBOUND_CAPACITY` | `16`            |

use anyhow::{Context, Result};
use clap::Parser;
use roomcast::{DEFAULT_ADDR, DEFAULT_SIM_ADDR, RoomcastServer};
use roomcast_session::SessionConfig;

#[derive(Parser, Debug)]
#[command(name = "roomcast-server", about = "Room snapshot relay", version)]
struct Args {
    /// Viewer listen address
    #[arg(long, env = "ROOMCAST_ADDR", default_value = DEFAULT_ADDR)]
    addr: String,

    /// Simulation producer address
    #[arg(long, env = "ROOMCAST_SIM_ADDR", default_value = DEFAULT_SIM_ADDR)]
    sim_addr: String,

    /// Rooms one viewer may subscribe to (1 for single-room viewers)
    #[arg(long, env = "ROOMCAST_MAX_SUBSCRIPTIONS", default_value_t = 100)]
    max_subscriptions: usize,

    /// Per-viewer outbound queue length before eviction
    #[arg(long, env = "ROOMCAST_OUTBOUND_CAPACITY", default_value_t = 16)]
    outbound_capacity: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("roomcast=info".parse()?),
        )
        .init();

    let args = Args::parse();
    tracing::info!(addr = %args.addr, sim_addr = %args.sim_addr, "starting roomcast-server");

    let session_config = SessionConfig {
        max_subscriptions: args.max_subscriptions,
        outbound_capacity: args.outbound_capacity,
        ..SessionConfig::default()
    };

    let server = RoomcastServer::builder()
        .bind(&args.addr)
        .sim_addr(&args.sim_addr)
        .session_config(session_config)
        .build()
        .await
        .inspect_err(|e| tracing::error!(error = %e, "startup failed"))
        .context("startup failed")?;

    server.run().await.context("server stopped")
}
