//! Per-connection action ingestion.
//!
//! Each connected player gets its own reader task. It pulls one byte at a
//! time from the connection, maps it to a [`ClientAction`] and appends it to
//! the shared [`ActionQueue`]. When the peer goes away the reader deregisters
//! the session and asks the simulation to remove the player's tank.

use crate::registry::SharedRegistry;
use crate::shutdown::Shutdown;
use log::{debug, warn};
use shared::ClientAction;
use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueuedAction {
    pub player_id: u32,
    pub action: ClientAction,
}

/// FIFO of pending actions shared by all reader tasks and the simulation.
#[derive(Debug, Default)]
pub struct ActionQueue {
    pending: Mutex<VecDeque<QueuedAction>>,
}

impl ActionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<QueuedAction>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push(&self, player_id: u32, action: ClientAction) {
        self.lock().push_back(QueuedAction { player_id, action });
    }

    pub fn pop(&self) -> Option<QueuedAction> {
        self.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Connection lifecycle changes the simulation applies to the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Joined { player_id: u32 },
    Left { player_id: u32 },
}

/// Handles shared by every connection task.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub queue: Arc<ActionQueue>,
    pub registry: SharedRegistry,
    pub events: mpsc::UnboundedSender<SessionEvent>,
    pub shutdown: Shutdown,
}

/// Why a reader stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderExit {
    PeerClosed,
    ReceiveFailed,
    Shutdown,
}

/// Reads actions for `player_id` until the peer closes, then tears the
/// session down. Returns the number of actions queued.
///
/// Every receive asks the transport for a single byte; nothing is read ahead.
pub async fn read_actions<R>(player_id: u32, mut reader: R, ctx: &SessionContext) -> (usize, ReaderExit)
where
    R: AsyncRead + Unpin,
{
    let mut queued = 0;

    let exit = loop {
        if ctx.shutdown.is_triggered() {
            break ReaderExit::Shutdown;
        }

        let byte = match reader.read_u8().await {
            Ok(byte) => byte,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break ReaderExit::PeerClosed,
            Err(e) => {
                warn!("Receive failed for player {}: {}", player_id, e);
                break ReaderExit::ReceiveFailed;
            }
        };

        match ClientAction::from_byte(byte) {
            Some(action) => {
                ctx.queue.push(player_id, action);
                queued += 1;
            }
            None => debug!("Ignoring byte {:#04x} from player {}", byte, player_id),
        }
    };

    ctx.registry.write().await.remove_session(player_id);
    if ctx
        .events
        .send(SessionEvent::Left { player_id })
        .is_err()
    {
        debug!("Simulation stopped before player {} left", player_id);
    }

    (queued, exit)
}
