//! Text wire format for world snapshots.
//!
//! A snapshot is encoded as
//!
//! ```text
//! T<tank>;<tank>;...|B<bullet>;<bullet>;...|G<game_over>,<winner_id>
//! ```
//!
//! where a tank is `id,x,y,facing,alive`, a bullet is `owner_id,x,y,direction`,
//! directions use their wire discriminant and booleans are `0`/`1`. A missing
//! winner is written as `-1`.
//!
//! Decoding is strict: every field must be a plain base-10 integer within
//! range, and any deviation is reported as a [`DecodeError`] rather than
//! producing a partial snapshot.

use crate::{Bullet, Direction, GameState, Tank};
use thiserror::Error;

const TANKS_MARKER: &str = "T";
const BULLETS_MARKER: &str = "|B";
const GAME_MARKER: &str = "|G";
const NO_WINNER: i64 = -1;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("missing section marker `{0}`")]
    MissingMarker(&'static str),

    #[error("{section} section does not end with `;`")]
    Unterminated { section: &'static str },

    #[error("{section} segment `{segment}` has {found} fields, expected {expected}")]
    FieldCount {
        section: &'static str,
        segment: String,
        expected: usize,
        found: usize,
    },

    #[error("field `{field}` is not a base-10 integer: `{value}`")]
    InvalidNumber { field: &'static str, value: String },

    #[error("field `{field}` is out of range: {value}")]
    OutOfRange { field: &'static str, value: i64 },
}

pub fn encode_tank(tank: &Tank) -> String {
    format!(
        "{},{},{},{},{};",
        tank.id,
        tank.x,
        tank.y,
        tank.facing.to_wire(),
        u8::from(tank.alive)
    )
}

pub fn encode_bullet(bullet: &Bullet) -> String {
    format!(
        "{},{},{},{};",
        bullet.owner_id,
        bullet.x,
        bullet.y,
        bullet.direction.to_wire()
    )
}

pub fn encode_game_state(state: &GameState) -> String {
    let mut out = String::from(TANKS_MARKER);
    for tank in &state.tanks {
        out.push_str(&encode_tank(tank));
    }
    out.push_str(BULLETS_MARKER);
    for bullet in &state.bullets {
        out.push_str(&encode_bullet(bullet));
    }
    out.push_str(GAME_MARKER);
    let winner = state.winner_id.map_or(NO_WINNER, i64::from);
    out.push_str(&format!("{},{}", u8::from(state.game_over), winner));
    out
}

/// Decodes a single tank segment, with or without its trailing `;`.
pub fn decode_tank(segment: &str) -> Result<Tank, DecodeError> {
    let fields = split_fields("tank", segment, 5)?;
    Ok(Tank {
        id: parse_u32("tank.id", fields[0])?,
        x: parse_i32("tank.x", fields[1])?,
        y: parse_i32("tank.y", fields[2])?,
        facing: parse_direction("tank.facing", fields[3])?,
        alive: parse_flag("tank.alive", fields[4])?,
    })
}

/// Decodes a single bullet segment, with or without its trailing `;`.
pub fn decode_bullet(segment: &str) -> Result<Bullet, DecodeError> {
    let fields = split_fields("bullet", segment, 4)?;
    Ok(Bullet {
        owner_id: parse_u32("bullet.owner_id", fields[0])?,
        x: parse_i32("bullet.x", fields[1])?,
        y: parse_i32("bullet.y", fields[2])?,
        direction: parse_direction("bullet.direction", fields[3])?,
    })
}

pub fn decode_game_state(data: &str) -> Result<GameState, DecodeError> {
    let body = data
        .strip_prefix(TANKS_MARKER)
        .ok_or(DecodeError::MissingMarker(TANKS_MARKER))?;
    let bullets_at = body
        .find(BULLETS_MARKER)
        .ok_or(DecodeError::MissingMarker(BULLETS_MARKER))?;
    let (tanks_part, rest) = body.split_at(bullets_at);
    let rest = &rest[BULLETS_MARKER.len()..];
    let game_at = rest
        .find(GAME_MARKER)
        .ok_or(DecodeError::MissingMarker(GAME_MARKER))?;
    let (bullets_part, rest) = rest.split_at(game_at);
    let game_part = &rest[GAME_MARKER.len()..];

    let tanks = split_segments("tanks", tanks_part)?
        .into_iter()
        .map(decode_tank)
        .collect::<Result<Vec<_>, _>>()?;
    let bullets = split_segments("bullets", bullets_part)?
        .into_iter()
        .map(decode_bullet)
        .collect::<Result<Vec<_>, _>>()?;

    let fields = split_fields("game", game_part, 2)?;
    let game_over = parse_flag("game.game_over", fields[0])?;
    let winner_id = match parse_int("game.winner_id", fields[1])? {
        NO_WINNER => None,
        value => Some(
            u32::try_from(value).map_err(|_| DecodeError::OutOfRange {
                field: "game.winner_id",
                value,
            })?,
        ),
    };

    Ok(GameState {
        tanks,
        bullets,
        game_over,
        winner_id,
    })
}

/// Splits a `;`-terminated run of segments. An empty section has no segments.
fn split_segments<'a>(section: &'static str, part: &'a str) -> Result<Vec<&'a str>, DecodeError> {
    if part.is_empty() {
        return Ok(Vec::new());
    }
    let body = part
        .strip_suffix(';')
        .ok_or(DecodeError::Unterminated { section })?;
    Ok(body.split(';').collect())
}

fn split_fields<'a>(
    section: &'static str,
    segment: &'a str,
    expected: usize,
) -> Result<Vec<&'a str>, DecodeError> {
    let trimmed = segment.strip_suffix(';').unwrap_or(segment);
    let fields: Vec<&str> = trimmed.split(',').collect();
    if fields.len() != expected {
        return Err(DecodeError::FieldCount {
            section,
            segment: segment.to_string(),
            expected,
            found: fields.len(),
        });
    }
    Ok(fields)
}

fn parse_int(field: &'static str, raw: &str) -> Result<i64, DecodeError> {
    let digits = raw.strip_prefix('-').unwrap_or(raw);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DecodeError::InvalidNumber {
            field,
            value: raw.to_string(),
        });
    }
    raw.parse().map_err(|_| DecodeError::InvalidNumber {
        field,
        value: raw.to_string(),
    })
}

fn parse_i32(field: &'static str, raw: &str) -> Result<i32, DecodeError> {
    let value = parse_int(field, raw)?;
    i32::try_from(value).map_err(|_| DecodeError::OutOfRange { field, value })
}

fn parse_u32(field: &'static str, raw: &str) -> Result<u32, DecodeError> {
    let value = parse_int(field, raw)?;
    u32::try_from(value).map_err(|_| DecodeError::OutOfRange { field, value })
}

fn parse_flag(field: &'static str, raw: &str) -> Result<bool, DecodeError> {
    match parse_int(field, raw)? {
        0 => Ok(false),
        1 => Ok(true),
        value => Err(DecodeError::OutOfRange { field, value }),
    }
}

fn parse_direction(field: &'static str, raw: &str) -> Result<Direction, DecodeError> {
    let value = parse_int(field, raw)?;
    Direction::from_wire(value).ok_or(DecodeError::OutOfRange { field, value })
}
