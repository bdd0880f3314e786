//! TCP front end: the accept loop and the per-connection tasks.

use crate::config::ServerConfig;
use crate::engine::Engine;
use crate::ingest::{read_actions, ActionQueue, SessionContext, SessionEvent};
use crate::registry::{Frame, SessionRegistry};
use crate::shutdown::Shutdown;
use crate::world::World;
use log::{debug, error, info, warn};
use shared::Map;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::sleep;

/// Snapshots buffered per connection before new ones are dropped.
const OUTBOX_CAPACITY: usize = 32;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },
}

/// Listening socket plus the handles each new connection is wired into.
pub struct Server {
    listener: TcpListener,
    ctx: SessionContext,
}

impl Server {
    /// Binds the listener and builds the simulation that goes with it.
    ///
    /// The returned [`Engine`] must be driven separately, typically with
    /// `tokio::spawn(engine.run(shutdown))`.
    pub async fn bind(config: &ServerConfig, shutdown: Shutdown) -> Result<(Self, Engine), ServerError> {
        let addr = config.bind_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.clone(),
                source,
            })?;

        let queue = Arc::new(ActionQueue::new());
        let registry = SessionRegistry::shared(config.max_players);
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let world = World::with_seed(Map::arena(), config.seed);
        let engine = Engine::new(
            world,
            Arc::clone(&queue),
            events_rx,
            Arc::clone(&registry),
            config,
        );

        let ctx = SessionContext {
            queue,
            registry,
            events: events_tx,
            shutdown,
        };

        Ok((Server { listener, ctx }, engine))
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts connections until shutdown. Accept failures are logged and
    /// the loop carries on.
    pub async fn run(self) {
        match self.local_addr() {
            Ok(addr) => info!("Server listening on {}", addr),
            Err(e) => warn!("Server listening on unknown address: {}", e),
        }

        while !self.ctx.shutdown.is_triggered() {
            match self.listener.accept().await {
                Ok((stream, addr)) => self.handle_connection(stream, addr).await,
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                    sleep(Duration::from_millis(10)).await;
                }
            }
        }

        info!("Accept loop stopped");
    }

    async fn handle_connection(&self, stream: TcpStream, addr: SocketAddr) {
        if let Err(e) = stream.set_nodelay(true) {
            debug!("Could not disable Nagle for {}: {}", addr, e);
        }

        let (outbox_tx, outbox_rx) = mpsc::channel::<Frame>(OUTBOX_CAPACITY);
        let player_id = {
            let mut registry = self.ctx.registry.write().await;
            let player_id = registry.add_session(addr, outbox_tx);
            match player_id {
                Some(_) => debug!("Players online: {:?}", registry.player_ids()),
                None => warn!(
                    "Rejected connection from {}: server full ({} players)",
                    addr,
                    registry.max_players()
                ),
            }
            player_id
        };
        let Some(player_id) = player_id else {
            return;
        };

        if self
            .ctx
            .events
            .send(SessionEvent::Joined { player_id })
            .is_err()
        {
            warn!("Simulation is gone, dropping player {}", player_id);
            self.ctx.registry.write().await.remove_session(player_id);
            return;
        }

        let (reader, writer) = stream.into_split();
        tokio::spawn(write_frames(player_id, writer, outbox_rx));

        let ctx = self.ctx.clone();
        tokio::spawn(async move {
            let (queued, exit) = read_actions(player_id, reader, &ctx).await;
            debug!(
                "Reader for player {} finished ({:?}) after {} actions",
                player_id, exit, queued
            );
        });
    }
}

/// Drains a session's outbox onto its socket until the session is removed
/// or a write fails.
pub async fn write_frames<W>(player_id: u32, mut writer: W, mut outbox: mpsc::Receiver<Frame>)
where
    W: AsyncWrite + Unpin,
{
    while let Some(frame) = outbox.recv().await {
        if let Err(e) = writer.write_all(&frame).await {
            warn!("Send to player {} failed: {}", player_id, e);
            break;
        }
    }
    if let Err(e) = writer.shutdown().await {
        debug!("Closing connection of player {} failed: {}", player_id, e);
    }
}
