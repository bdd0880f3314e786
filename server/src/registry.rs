//! Session bookkeeping and snapshot fan-out.
//!
//! The registry maps each player id to the outbound queue of its connection.
//! Broadcasting never waits on a socket: frames are pushed into each session's
//! bounded queue and a per-connection writer task drains it. A full or closed
//! queue only costs that one session its frame.

use log::{debug, info};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, RwLock};

/// An encoded, framed snapshot shared by every session's queue.
pub type Frame = Arc<[u8]>;

pub type SharedRegistry = Arc<RwLock<SessionRegistry>>;

#[derive(Debug)]
pub struct Session {
    pub player_id: u32,
    pub addr: SocketAddr,
    outbox: mpsc::Sender<Frame>,
}

/// Per-broadcast delivery counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub dropped: usize,
}

#[derive(Debug)]
pub struct SessionRegistry {
    sessions: HashMap<u32, Session>,
    next_player_id: u32,
    max_players: usize,
}

impl SessionRegistry {
    /// Player ids start from 1 and are never reused.
    pub fn new(max_players: usize) -> Self {
        Self {
            sessions: HashMap::new(),
            next_player_id: 1,
            max_players,
        }
    }

    pub fn shared(max_players: usize) -> SharedRegistry {
        Arc::new(RwLock::new(Self::new(max_players)))
    }

    /// Registers a connection and assigns it the next player id.
    ///
    /// Returns `None` when the server is full; no id is consumed then.
    pub fn add_session(&mut self, addr: SocketAddr, outbox: mpsc::Sender<Frame>) -> Option<u32> {
        if self.sessions.len() >= self.max_players {
            return None;
        }

        let player_id = self.next_player_id;
        self.next_player_id += 1;

        info!("Player {} connected from {}", player_id, addr);
        self.sessions.insert(
            player_id,
            Session {
                player_id,
                addr,
                outbox,
            },
        );
        Some(player_id)
    }

    pub fn remove_session(&mut self, player_id: u32) -> bool {
        match self.sessions.remove(&player_id) {
            Some(session) => {
                info!("Player {} ({}) disconnected", player_id, session.addr);
                true
            }
            None => false,
        }
    }

    #[cfg(test)]
    pub fn get(&self, player_id: u32) -> Option<&Session> {
        self.sessions.get(&player_id)
    }

    #[cfg(test)]
    pub fn contains(&self, player_id: u32) -> bool {
        self.sessions.contains_key(&player_id)
    }

    /// Queues `frame` for every session. Each delivery is independent.
    pub fn broadcast(&self, frame: &Frame) -> BroadcastReport {
        let mut report = BroadcastReport::default();
        for session in self.sessions.values() {
            match session.outbox.try_send(Arc::clone(frame)) {
                Ok(()) => report.delivered += 1,
                Err(TrySendError::Full(_)) => {
                    debug!(
                        "Outbox full for player {}, dropping snapshot",
                        session.player_id
                    );
                    report.dropped += 1;
                }
                Err(TrySendError::Closed(_)) => {
                    debug!(
                        "Connection for player {} is closed, skipping snapshot",
                        session.player_id
                    );
                    report.dropped += 1;
                }
            }
        }
        report
    }

    pub fn player_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.sessions.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn max_players(&self) -> usize {
        self.max_players
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_addr() -> SocketAddr {
        "127.0.0.1:8080".parse().unwrap()
    }

    fn test_addr2() -> SocketAddr {
        "127.0.0.1:8081".parse().unwrap()
    }

    fn frame(text: &str) -> Frame {
        Arc::from(text.as_bytes())
    }

    #[test]
    fn test_registry_creation() {
        let registry = SessionRegistry::new(5);
        assert_eq!(registry.max_players(), 5);
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_ids_are_monotonic_from_one() {
        let mut registry = SessionRegistry::new(4);
        let (tx, _rx) = mpsc::channel(1);

        assert_eq!(registry.add_session(test_addr(), tx.clone()), Some(1));
        assert_eq!(registry.add_session(test_addr2(), tx.clone()), Some(2));
        assert!(registry.remove_session(1));
        assert_eq!(registry.add_session(test_addr(), tx), Some(3));
        assert_eq!(registry.player_ids(), vec![2, 3]);
        assert_eq!(registry.get(3).map(|s| s.addr), Some(test_addr()));
    }

    #[test]
    fn test_capacity_rejection_keeps_ids() {
        let mut registry = SessionRegistry::new(1);
        let (tx, _rx) = mpsc::channel(1);

        assert_eq!(registry.add_session(test_addr(), tx.clone()), Some(1));
        assert_eq!(registry.add_session(test_addr2(), tx.clone()), None);
        assert_eq!(registry.len(), 1);

        registry.remove_session(1);
        assert_eq!(registry.add_session(test_addr2(), tx), Some(2));
    }

    #[test]
    fn test_remove_nonexistent_session() {
        let mut registry = SessionRegistry::new(2);
        assert!(!registry.remove_session(999));
        assert!(!registry.contains(999));
    }

    #[test]
    fn test_broadcast_reaches_every_session() {
        let mut registry = SessionRegistry::new(4);
        let (tx1, mut rx1) = mpsc::channel(4);
        let (tx2, mut rx2) = mpsc::channel(4);
        registry.add_session(test_addr(), tx1);
        registry.add_session(test_addr2(), tx2);

        let report = registry.broadcast(&frame("T|B|G0,-1"));

        assert_eq!(
            report,
            BroadcastReport {
                delivered: 2,
                dropped: 0
            }
        );
        assert_eq!(&*rx1.try_recv().unwrap(), b"T|B|G0,-1");
        assert_eq!(&*rx2.try_recv().unwrap(), b"T|B|G0,-1");
    }

    #[test]
    fn test_broadcast_survives_closed_and_full_sessions() {
        let mut registry = SessionRegistry::new(4);
        let (closed_tx, closed_rx) = mpsc::channel(4);
        let (full_tx, _full_rx) = mpsc::channel(1);
        let (ok_tx, mut ok_rx) = mpsc::channel(4);
        registry.add_session(test_addr(), closed_tx);
        registry.add_session(test_addr(), full_tx.clone());
        registry.add_session(test_addr2(), ok_tx);

        drop(closed_rx);
        full_tx.try_send(frame("stale")).unwrap();

        let report = registry.broadcast(&frame("T|B|G0,-1"));

        assert_eq!(report.delivered, 1);
        assert_eq!(report.dropped, 2);
        assert_eq!(&*ok_rx.try_recv().unwrap(), b"T|B|G0,-1");
    }
}
