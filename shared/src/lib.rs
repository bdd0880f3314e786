//! Types shared by the tank battle server and client: the entity model,
//! the text wire codec, the arena map, the key mapping for client actions
//! and the broadcast framing helpers.

pub mod action;
pub mod codec;
pub mod frame;
pub mod map;

pub use action::ClientAction;
pub use codec::{decode_game_state, encode_game_state, DecodeError};
pub use frame::{Framing, FrameError, MAX_FRAME_LEN};
pub use map::{Map, MapError};

/// TCP port the server listens on unless configured otherwise.
pub const DEFAULT_PORT: u16 = 8080;

/// Compass direction of a tank's barrel or a bullet's flight.
///
/// The discriminants are the values used on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up = 0,
    Down = 1,
    Left = 2,
    Right = 3,
}

impl Direction {
    /// Unit step `(dx, dy)` for one cell in this direction. `y` grows downward.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    /// Cell adjacent to `(x, y)` in this direction.
    pub fn step(self, x: i32, y: i32) -> (i32, i32) {
        let (dx, dy) = self.delta();
        (x + dx, y + dy)
    }

    pub fn from_wire(value: i64) -> Option<Self> {
        match value {
            0 => Some(Direction::Up),
            1 => Some(Direction::Down),
            2 => Some(Direction::Left),
            3 => Some(Direction::Right),
            _ => None,
        }
    }

    pub fn to_wire(self) -> u8 {
        self as u8
    }
}

/// A player's tank. The id is the owning player's id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tank {
    pub id: u32,
    pub x: i32,
    pub y: i32,
    pub facing: Direction,
    pub alive: bool,
}

impl Tank {
    /// Freshly spawned tanks face up and are alive.
    pub fn new(id: u32, x: i32, y: i32) -> Self {
        Self {
            id,
            x,
            y,
            facing: Direction::Up,
            alive: true,
        }
    }

    pub fn position(&self) -> (i32, i32) {
        (self.x, self.y)
    }
}

/// A bullet in flight, owned by the tank that fired it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bullet {
    pub owner_id: u32,
    pub x: i32,
    pub y: i32,
    pub direction: Direction,
}

impl Bullet {
    pub fn position(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    /// Moves the bullet one cell along its direction.
    pub fn advance(&mut self) {
        let (x, y) = self.direction.step(self.x, self.y);
        self.x = x;
        self.y = y;
    }
}

/// Snapshot of the authoritative world as broadcast to clients.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GameState {
    pub tanks: Vec<Tank>,
    pub bullets: Vec<Bullet>,
    pub game_over: bool,
    /// `None` encodes as `-1` on the wire.
    pub winner_id: Option<u32>,
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tank(&self, id: u32) -> Option<&Tank> {
        self.tanks.iter().find(|tank| tank.id == id)
    }

    pub fn alive_count(&self) -> usize {
        self.tanks.iter().filter(|tank| tank.alive).count()
    }
}
