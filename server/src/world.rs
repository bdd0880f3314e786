//! The authoritative world: tanks, bullets and the match outcome on top of
//! the immutable arena map.
//!
//! A `World` is owned by exactly one simulation task. Everything else talks to
//! it through queued actions and session events, and observes it only through
//! [`World::snapshot`].

use crate::bullets::{BulletArena, BulletHandle};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use shared::{Bullet, ClientAction, GameState, Map, Tank};

/// Result of applying one queued action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The tank turned and moved one cell.
    Moved,
    /// The tank turned but a wall blocked the move.
    Blocked,
    Fired(BulletHandle),
    /// The cell in front of the barrel is a wall; nothing was spawned.
    ShotBlocked,
    /// The player has no tank or the tank is destroyed.
    Discarded,
}

/// A bullet striking a tank during a physics tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    pub victim_id: u32,
    pub shooter_id: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub wall_impacts: usize,
    pub hits: Vec<Hit>,
    /// Set only on the tick that ended the match.
    pub match_ended: bool,
}

pub struct World {
    map: Map,
    tanks: Vec<Tank>,
    bullets: BulletArena,
    game_over: bool,
    winner_id: Option<u32>,
    rng: StdRng,
}

impl World {
    pub fn new(map: Map, rng: StdRng) -> Self {
        Self {
            map,
            tanks: Vec::new(),
            bullets: BulletArena::new(),
            game_over: false,
            winner_id: None,
            rng,
        }
    }

    /// Creates a world whose spawn points follow `seed`, or entropy when absent.
    pub fn with_seed(map: Map, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::new(map, rng)
    }

    pub fn map(&self) -> &Map {
        &self.map
    }

    pub fn tanks(&self) -> &[Tank] {
        &self.tanks
    }

    pub fn tank(&self, id: u32) -> Option<&Tank> {
        self.tanks.iter().find(|tank| tank.id == id)
    }

    pub fn bullets(&self) -> impl Iterator<Item = &Bullet> + '_ {
        self.bullets.iter().map(|(_, bullet)| bullet)
    }

    pub fn bullet(&self, handle: BulletHandle) -> Option<&Bullet> {
        self.bullets.get(handle)
    }

    pub fn game_over(&self) -> bool {
        self.game_over
    }

    pub fn winner_id(&self) -> Option<u32> {
        self.winner_id
    }

    /// Places a new tank for `id` on a random open cell no other tank holds.
    ///
    /// Returns the chosen cell, or `None` when the player already has a tank
    /// or the arena has no free cell left.
    pub fn spawn_tank(&mut self, id: u32) -> Option<(i32, i32)> {
        if self.tank(id).is_some() {
            return None;
        }
        let free: Vec<(i32, i32)> = self
            .map
            .open_cells()
            .filter(|&cell| !self.tanks.iter().any(|tank| tank.position() == cell))
            .collect();
        let &(x, y) = free.choose(&mut self.rng)?;
        self.place_tank(Tank::new(id, x, y));
        info!("Spawned tank {} at ({}, {})", id, x, y);
        Some((x, y))
    }

    /// Inserts a tank exactly as given. Returns false if the id is taken or
    /// the tank sits on a wall.
    pub fn place_tank(&mut self, tank: Tank) -> bool {
        if self.tank(tank.id).is_some() || self.map.is_wall(tank.x, tank.y) {
            return false;
        }
        self.tanks.push(tank);
        true
    }

    /// Inserts a bullet as-is, returning `None` if it would sit on a wall.
    pub fn place_bullet(&mut self, bullet: Bullet) -> Option<BulletHandle> {
        if self.map.is_wall(bullet.x, bullet.y) {
            return None;
        }
        Some(self.bullets.insert(bullet))
    }

    pub fn remove_tank(&mut self, id: u32) -> bool {
        let before = self.tanks.len();
        self.tanks.retain(|tank| tank.id != id);
        let removed = self.tanks.len() != before;
        if removed {
            info!("Removed tank {}", id);
        }
        removed
    }

    pub fn apply_action(&mut self, player_id: u32, action: ClientAction) -> ActionOutcome {
        let Some(tank) = self.tanks.iter_mut().find(|tank| tank.id == player_id) else {
            return ActionOutcome::Discarded;
        };
        if !tank.alive {
            return ActionOutcome::Discarded;
        }

        let Some(direction) = action.direction() else {
            let (x, y) = tank.facing.step(tank.x, tank.y);
            let bullet = Bullet {
                owner_id: tank.id,
                x,
                y,
                direction: tank.facing,
            };
            return match self.place_bullet(bullet) {
                Some(handle) => ActionOutcome::Fired(handle),
                None => ActionOutcome::ShotBlocked,
            };
        };

        tank.facing = direction;
        let (x, y) = direction.step(tank.x, tank.y);
        if self.map.is_wall(x, y) {
            return ActionOutcome::Blocked;
        }
        tank.x = x;
        tank.y = y;
        ActionOutcome::Moved
    }

    /// Advances bullets, resolves wall impacts and hits, then checks whether
    /// the match is decided.
    pub fn physics_tick(&mut self) -> TickReport {
        let mut report = TickReport::default();

        self.bullets.for_each_mut(Bullet::advance);
        let map = &self.map;
        report.wall_impacts = self.bullets.mark_where(|bullet| map.is_wall(bullet.x, bullet.y));

        // Marked bullets keep colliding until compaction so that one bullet
        // resolves every hit on its cell this tick.
        let mut spent = Vec::new();
        for tank in self.tanks.iter_mut().filter(|tank| tank.alive) {
            for (handle, bullet) in self.bullets.iter() {
                if bullet.owner_id != tank.id && bullet.position() == tank.position() {
                    tank.alive = false;
                    spent.push(handle);
                    report.hits.push(Hit {
                        victim_id: tank.id,
                        shooter_id: bullet.owner_id,
                    });
                }
            }
        }
        for handle in spent {
            self.bullets.mark(handle);
        }
        self.bullets.compact();

        for hit in &report.hits {
            debug!("Tank {} destroyed by tank {}", hit.victim_id, hit.shooter_id);
        }

        report.match_ended = self.check_winner();
        report
    }

    /// Ends the match once at most one tank is alive. A world with no tanks at
    /// all is still waiting for players and never ends.
    fn check_winner(&mut self) -> bool {
        if self.game_over || self.tanks.is_empty() {
            return false;
        }
        let mut alive = self.tanks.iter().filter(|tank| tank.alive);
        let survivor = alive.next().map(|tank| tank.id);
        if alive.next().is_some() {
            return false;
        }

        self.game_over = true;
        self.winner_id = survivor;
        match survivor {
            Some(id) => info!("Game over! Winner is player {}", id),
            None => info!("Game over! No tanks survived"),
        }
        true
    }

    pub fn snapshot(&self) -> GameState {
        GameState {
            tanks: self.tanks.clone(),
            bullets: self.bullets().cloned().collect(),
            game_over: self.game_over,
            winner_id: self.winner_id,
        }
    }
}
