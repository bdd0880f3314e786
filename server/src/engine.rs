//! The simulation loop.
//!
//! The engine owns the [`World`] outright. On every iteration it applies
//! pending joins and leaves, then consults the [`Scheduler`]: when the global
//! cooldown has elapsed it applies at most one queued action, and when the
//! physics tick is due it advances the world and broadcasts the new snapshot.

use crate::config::ServerConfig;
use crate::ingest::{ActionQueue, QueuedAction, SessionEvent};
use crate::registry::{BroadcastReport, Frame, SharedRegistry};
use crate::scheduler::Scheduler;
use crate::shutdown::Shutdown;
use crate::world::{ActionOutcome, TickReport, World};
use log::{debug, error, info, warn};
use shared::{encode_game_state, Framing, GameState};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::time::sleep;

pub struct Engine {
    world: World,
    queue: Arc<ActionQueue>,
    events: mpsc::UnboundedReceiver<SessionEvent>,
    registry: SharedRegistry,
    scheduler: Scheduler,
    framing: Framing,
    idle_sleep: Duration,
    tick: u64,
}

impl Engine {
    pub fn new(
        world: World,
        queue: Arc<ActionQueue>,
        events: mpsc::UnboundedReceiver<SessionEvent>,
        registry: SharedRegistry,
        config: &ServerConfig,
    ) -> Self {
        Self {
            world,
            queue,
            events,
            registry,
            scheduler: Scheduler::new(config.cooldown, config.tick, Instant::now()),
            framing: config.framing,
            idle_sleep: config.idle_sleep,
            tick: 0,
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Number of physics ticks run so far.
    pub fn ticks(&self) -> u64 {
        self.tick
    }

    /// Applies every pending join and leave. Returns how many were handled.
    pub fn apply_session_events(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events.try_recv() {
            match event {
                SessionEvent::Joined { player_id } => {
                    if self.world.spawn_tank(player_id).is_none() {
                        warn!("No free cell to spawn a tank for player {}", player_id);
                    }
                }
                SessionEvent::Left { player_id } => {
                    self.world.remove_tank(player_id);
                }
            }
            handled += 1;
        }
        handled
    }

    /// Pops the oldest queued action, if any, and applies it.
    pub fn apply_next_action(&mut self) -> Option<(QueuedAction, ActionOutcome)> {
        let queued = self.queue.pop()?;
        let outcome = self.world.apply_action(queued.player_id, queued.action);
        match outcome {
            ActionOutcome::Fired(handle) => {
                if let Some(bullet) = self.world.bullet(handle) {
                    debug!(
                        "Player {} fired from ({}, {}) heading {:?}",
                        queued.player_id, bullet.x, bullet.y, bullet.direction
                    );
                }
            }
            _ => debug!(
                "Player {} {:?} -> {:?}",
                queued.player_id, queued.action, outcome
            ),
        }
        Some((queued, outcome))
    }

    /// Runs one physics tick and broadcasts the resulting snapshot.
    pub async fn physics_step(&mut self) -> (TickReport, GameState) {
        let report = self.world.physics_tick();
        self.tick += 1;
        if report.wall_impacts > 0 || !report.hits.is_empty() {
            debug!(
                "Tick {}: {} bullets hit walls, {} tanks hit",
                self.tick,
                report.wall_impacts,
                report.hits.len()
            );
        }
        let snapshot = self.world.snapshot();
        self.broadcast(&snapshot).await;
        (report, snapshot)
    }

    async fn broadcast(&self, snapshot: &GameState) -> BroadcastReport {
        let payload = encode_game_state(snapshot);
        let frame: Frame = match self.framing.encode(payload.as_bytes()) {
            Ok(bytes) => bytes.into(),
            Err(e) => {
                error!("Cannot frame snapshot for tick {}: {}", self.tick, e);
                return BroadcastReport::default();
            }
        };
        let report = self.registry.read().await.broadcast(&frame);
        if report.dropped > 0 {
            debug!(
                "Tick {}: snapshot delivered to {}, dropped for {}",
                self.tick, report.delivered, report.dropped
            );
        }
        report
    }

    /// One pass of the control loop at `now`.
    pub async fn step(&mut self, now: Instant) {
        self.apply_session_events();

        if self.scheduler.action_due(now) && self.apply_next_action().is_some() {
            self.scheduler.action_applied(now);
        }

        if self.scheduler.take_physics_tick(now) {
            self.physics_step().await;
        }
    }

    /// Runs until `shutdown` is triggered.
    pub async fn run(mut self, shutdown: Shutdown) {
        info!(
            "Simulation running: tick {:?}, action cooldown {:?}",
            self.scheduler.tick(),
            self.scheduler.cooldown()
        );

        while !shutdown.is_triggered() {
            self.step(Instant::now()).await;
            sleep(self.idle_sleep).await;
        }

        info!("Simulation stopped after {} ticks", self.ticks());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::SessionRegistry;
    use shared::{decode_game_state, ClientAction, Direction, Map, Tank};
    use std::net::SocketAddr;

    struct Harness {
        engine: Engine,
        queue: Arc<ActionQueue>,
        events: mpsc::UnboundedSender<SessionEvent>,
        registry: SharedRegistry,
    }

    fn harness(framing: Framing) -> Harness {
        let config = ServerConfig {
            framing,
            seed: Some(11),
            ..ServerConfig::default()
        };
        let queue = Arc::new(ActionQueue::new());
        let registry = SessionRegistry::shared(config.max_players);
        let (events, events_rx) = mpsc::unbounded_channel();
        let world = World::with_seed(Map::arena(), config.seed);
        let engine = Engine::new(
            world,
            Arc::clone(&queue),
            events_rx,
            Arc::clone(&registry),
            &config,
        );
        Harness {
            engine,
            queue,
            events,
            registry,
        }
    }

    fn tank(id: u32, x: i32, y: i32) -> Tank {
        Tank::new(id, x, y)
    }

    #[test]
    fn test_session_events_spawn_and_remove_tanks() {
        let mut h = harness(Framing::Raw);
        h.events.send(SessionEvent::Joined { player_id: 1 }).unwrap();
        h.events.send(SessionEvent::Joined { player_id: 2 }).unwrap();

        assert_eq!(h.engine.apply_session_events(), 2);
        assert!(h.engine.world().tank(1).is_some());
        assert!(h.engine.world().tank(2).is_some());

        h.events.send(SessionEvent::Left { player_id: 2 }).unwrap();
        h.engine.apply_session_events();
        assert!(h.engine.world().tank(2).is_none());
    }

    #[test]
    fn test_actions_applied_in_arrival_order() {
        let mut h = harness(Framing::Raw);
        h.engine.world.place_tank(tank(1, 10, 10));
        h.engine.world.place_tank(tank(2, 20, 10));
        h.queue.push(1, ClientAction::MoveLeft);
        h.queue.push(2, ClientAction::MoveRight);

        let (first, _) = h.engine.apply_next_action().unwrap();
        assert_eq!(first.player_id, 1);
        assert_eq!(h.engine.world().tank(1).unwrap().position(), (9, 10));
        assert_eq!(h.engine.world().tank(2).unwrap().position(), (20, 10));

        let (second, _) = h.engine.apply_next_action().unwrap();
        assert_eq!(second.player_id, 2);
        assert_eq!(h.engine.world().tank(2).unwrap().position(), (21, 10));
        assert!(h.engine.apply_next_action().is_none());
    }

    #[tokio::test]
    async fn test_one_action_per_cooldown() {
        let mut h = harness(Framing::Raw);
        h.engine.world.place_tank(tank(1, 10, 10));
        for _ in 0..3 {
            h.queue.push(1, ClientAction::MoveRight);
        }

        let start = Instant::now();
        h.engine.scheduler = Scheduler::new(
            Duration::from_millis(100),
            Duration::from_secs(3600),
            start,
        );

        h.engine.step(start + Duration::from_millis(100)).await;
        assert_eq!(h.engine.world().tank(1).unwrap().x, 11);
        assert_eq!(h.queue.len(), 2);

        h.engine.step(start + Duration::from_millis(150)).await;
        assert_eq!(h.engine.world().tank(1).unwrap().x, 11);

        h.engine.step(start + Duration::from_millis(200)).await;
        assert_eq!(h.engine.world().tank(1).unwrap().x, 12);
        assert_eq!(h.queue.len(), 1);
    }

    #[tokio::test]
    async fn test_physics_step_broadcasts_snapshot() {
        let mut h = harness(Framing::Raw);
        let addr: SocketAddr = "127.0.0.1:7000".parse().unwrap();
        let (tx, mut rx) = mpsc::channel(4);
        h.registry.write().await.add_session(addr, tx);
        h.engine.world.place_tank(Tank {
            id: 1,
            x: 2,
            y: 3,
            facing: Direction::Up,
            alive: true,
        });
        h.engine.world.place_tank(tank(2, 10, 10));

        let (report, snapshot) = h.engine.physics_step().await;

        assert!(!report.match_ended);
        assert_eq!(h.engine.ticks(), 1);
        let frame = rx.try_recv().unwrap();
        let decoded = decode_game_state(std::str::from_utf8(&frame).unwrap()).unwrap();
        assert_eq!(decoded, snapshot);
        assert_eq!(decoded.tanks.len(), 2);
    }

    #[tokio::test]
    async fn test_length_prefixed_broadcast() {
        let mut h = harness(Framing::LengthPrefixed);
        let addr: SocketAddr = "127.0.0.1:7000".parse().unwrap();
        let (tx, mut rx) = mpsc::channel(4);
        h.registry.write().await.add_session(addr, tx);

        h.engine.physics_step().await;

        let frame = rx.try_recv().unwrap();
        assert_eq!(&frame[..4], &[0, 0, 0, 9]);
        assert_eq!(&frame[4..], b"T|B|G0,-1");
    }

    #[tokio::test]
    async fn test_disconnect_ends_match_with_survivor() {
        let mut h = harness(Framing::Raw);
        h.events.send(SessionEvent::Joined { player_id: 1 }).unwrap();
        h.events.send(SessionEvent::Joined { player_id: 2 }).unwrap();
        h.engine.apply_session_events();

        let (report, _) = h.engine.physics_step().await;
        assert!(!report.match_ended);

        h.events.send(SessionEvent::Left { player_id: 2 }).unwrap();
        h.engine.apply_session_events();
        let (report, snapshot) = h.engine.physics_step().await;

        assert!(report.match_ended);
        assert!(snapshot.game_over);
        assert_eq!(snapshot.winner_id, Some(1));
    }

    #[tokio::test]
    async fn test_shot_travels_and_kills_over_ticks() {
        let mut h = harness(Framing::Raw);
        h.engine.world.place_tank(Tank {
            id: 1,
            x: 12,
            y: 10,
            facing: Direction::Left,
            alive: true,
        });
        h.engine.world.place_tank(tank(2, 9, 10));
        h.engine.world.place_tank(tank(3, 30, 17));
        h.queue.push(1, ClientAction::Shoot);
        h.engine.apply_next_action();

        let (report, snapshot) = h.engine.physics_step().await;
        assert!(report.hits.is_empty());
        assert_eq!(snapshot.bullets[0].position(), (10, 10));

        let (report, snapshot) = h.engine.physics_step().await;
        assert_eq!(report.hits.len(), 1);
        assert!(!snapshot.tank(2).unwrap().alive);
        assert!(snapshot.bullets.is_empty());
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let h = harness(Framing::Raw);
        let shutdown = Shutdown::new();
        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(1), h.engine.run(shutdown))
            .await
            .unwrap();
    }
}
