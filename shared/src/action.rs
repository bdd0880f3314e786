//! Single-byte commands sent from clients to the server.

use crate::Direction;

/// An action requested by a player. Each action travels as one raw byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientAction {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    Shoot,
}

impl ClientAction {
    /// Maps an input byte to an action. Letters are case-insensitive; any byte
    /// outside `W/S/A/D/space` yields `None` and is meant to be ignored.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte.to_ascii_uppercase() {
            b'W' => Some(ClientAction::MoveUp),
            b'S' => Some(ClientAction::MoveDown),
            b'A' => Some(ClientAction::MoveLeft),
            b'D' => Some(ClientAction::MoveRight),
            b' ' => Some(ClientAction::Shoot),
            _ => None,
        }
    }

    /// Canonical byte sent by the client for this action.
    pub fn to_byte(self) -> u8 {
        match self {
            ClientAction::MoveUp => b'W',
            ClientAction::MoveDown => b'S',
            ClientAction::MoveLeft => b'A',
            ClientAction::MoveRight => b'D',
            ClientAction::Shoot => b' ',
        }
    }

    /// Heading requested by a movement action; `None` for [`ClientAction::Shoot`].
    pub fn direction(self) -> Option<Direction> {
        match self {
            ClientAction::MoveUp => Some(Direction::Up),
            ClientAction::MoveDown => Some(Direction::Down),
            ClientAction::MoveLeft => Some(Direction::Left),
            ClientAction::MoveRight => Some(Direction::Right),
            ClientAction::Shoot => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letter_mapping_is_case_insensitive() {
        assert_eq!(ClientAction::from_byte(b'W'), Some(ClientAction::MoveUp));
        assert_eq!(ClientAction::from_byte(b'w'), Some(ClientAction::MoveUp));
        assert_eq!(ClientAction::from_byte(b's'), Some(ClientAction::MoveDown));
        assert_eq!(ClientAction::from_byte(b'A'), Some(ClientAction::MoveLeft));
        assert_eq!(ClientAction::from_byte(b'd'), Some(ClientAction::MoveRight));
        assert_eq!(ClientAction::from_byte(b' '), Some(ClientAction::Shoot));
    }

    #[test]
    fn test_unrecognized_bytes() {
        for byte in [b'q', b'\n', b'\r', b'x', 0u8, 0xFF] {
            assert_eq!(ClientAction::from_byte(byte), None);
        }
    }

    #[test]
    fn test_movement_directions() {
        assert_eq!(ClientAction::MoveLeft.direction(), Some(Direction::Left));
        assert_eq!(ClientAction::MoveDown.direction(), Some(Direction::Down));
        assert_eq!(ClientAction::Shoot.direction(), None);
    }

    #[test]
    fn test_canonical_byte_maps_back() {
        for action in [
            ClientAction::MoveUp,
            ClientAction::MoveDown,
            ClientAction::MoveLeft,
            ClientAction::MoveRight,
            ClientAction::Shoot,
        ] {
            assert_eq!(ClientAction::from_byte(action.to_byte()), Some(action));
        }
    }
}
