//! Startup terrain enumeration and the long-running snapshot ingestor.

use futures_util::{StreamExt, TryStreamExt, stream};
use roomcast_hub::{TerrainCache, UpdateSender, Upstream};

use crate::{Backoff, BackoffConfig, EntityStream, UpstreamError, WorldSource};

/// How many terrain requests run at once during enumeration.
const TERRAIN_CONCURRENCY: usize = 8;

/// Enumerates every room and fetches its terrain.
///
/// Runs once, before the listener accepts viewers.
///
/// # Errors
/// Any failed request fails the whole enumeration.
pub async fn load_terrain<S: WorldSource>(source: &S) -> Result<TerrainCache, UpstreamError> {
    let rooms = source.room_list().await?;
    tracing::info!(rooms = rooms.len(), "enumerating terrain");

    let entries: Vec<_> = stream::iter(rooms)
        .map(|room_id| async move {
            source
                .room_terrain(room_id)
                .await
                .map(|terrain| (room_id, terrain))
        })
        .buffer_unordered(TERRAIN_CONCURRENCY)
        .try_collect()
        .await?;

    Ok(entries.into_iter().collect())
}

/// Forwards producer snapshots onto the hub's update channel.
///
/// The first stream is opened by [`Ingestor::connect`], and failing to
/// open it is an error for the caller. From then on the ingestor reopens
/// the stream forever, with backoff, until the hub goes away.
pub struct Ingestor<S: WorldSource> {
    source: S,
    updates: UpdateSender,
    backoff: Backoff,
    stream: Option<S::Stream>,
}

impl<S: WorldSource> Ingestor<S> {
    /// Opens the first snapshot stream.
    ///
    /// # Errors
    /// Whatever the source returns when the stream cannot be opened.
    pub async fn connect(
        source: S,
        updates: UpdateSender,
        backoff: BackoffConfig,
    ) -> Result<Self, UpstreamError> {
        let stream = source.open_entities().await?;
        tracing::info!("connected to producer");
        Ok(Self {
            source,
            updates,
            backoff: Backoff::new(backoff),
            stream: Some(stream),
        })
    }

    /// Runs until the hub's update channel closes.
    ///
    /// Every snapshot is handed to the hub with a blocking send, so a busy
    /// hub slows the ingestor down instead of losing updates. Each time a
    /// stream opens, a [`Upstream::Resync`] marker goes first.
    pub async fn run(mut self) {
        while !self.updates.is_closed() {
            let stream = match self.stream.take() {
                Some(stream) => stream,
                None => match self.source.open_entities().await {
                    Ok(stream) => {
                        tracing::info!("reconnected to producer");
                        stream
                    }
                    Err(e) => {
                        let delay = self.backoff.next_delay();
                        tracing::warn!(
                            error = %e,
                            retry_in_ms = delay.as_millis() as u64,
                            "producer unreachable"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                },
            };

            if self.updates.send(Upstream::Resync).await.is_err() {
                break;
            }
            if !self.pump(stream).await {
                break;
            }

            let delay = self.backoff.next_delay();
            tracing::debug!(retry_in_ms = delay.as_millis() as u64, "reopening stream");
            tokio::time::sleep(delay).await;
        }

        tracing::info!("hub closed, ingestor stopping");
    }

    /// Drains one stream. Returns `false` once the hub is gone.
    async fn pump(&mut self, mut stream: S::Stream) -> bool {
        loop {
            match stream.next_snapshot().await {
                Ok(Some(snapshot)) => {
                    self.backoff.reset();
                    if self.updates.send(Upstream::Snapshot(snapshot)).await.is_err() {
                        return false;
                    }
                }
                Ok(None) => {
                    tracing::warn!("producer closed the stream");
                    return true;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "snapshot stream failed");
                    return true;
                }
            }
        }
    }
}
