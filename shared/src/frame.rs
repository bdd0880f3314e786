//! Framing of server broadcasts on the byte stream.
//!
//! With [`Framing::LengthPrefixed`] every snapshot is preceded by its length
//! as a big-endian `u32`, so a reader can recover message boundaries no matter
//! how TCP splits or merges segments. [`Framing::Raw`] writes the bare text and
//! relies on each read returning exactly one snapshot.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Upper bound accepted for a single frame payload.
pub const MAX_FRAME_LEN: usize = 64 * 1024;

pub const HEADER_LEN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Framing {
    #[default]
    LengthPrefixed,
    Raw,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("frame of {0} bytes exceeds the {} byte limit", MAX_FRAME_LEN)]
    TooLarge(usize),

    #[error("frame payload is not valid UTF-8")]
    NotUtf8,

    #[error("unknown framing `{0}`, expected `length-prefixed` or `raw`")]
    UnknownFraming(String),
}

impl Framing {
    /// Wraps a payload for transmission.
    pub fn encode(self, payload: &[u8]) -> Result<Vec<u8>, FrameError> {
        match self {
            Framing::Raw => Ok(payload.to_vec()),
            Framing::LengthPrefixed => {
                if payload.len() > MAX_FRAME_LEN {
                    return Err(FrameError::TooLarge(payload.len()));
                }
                let mut frame = Vec::with_capacity(HEADER_LEN + payload.len());
                frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
                frame.extend_from_slice(payload);
                Ok(frame)
            }
        }
    }
}

/// Reads the payload length out of a length-prefix header.
pub fn payload_len(header: [u8; HEADER_LEN]) -> Result<usize, FrameError> {
    let len = u32::from_be_bytes(header) as usize;
    if len > MAX_FRAME_LEN {
        return Err(FrameError::TooLarge(len));
    }
    Ok(len)
}

pub fn payload_text(payload: &[u8]) -> Result<&str, FrameError> {
    std::str::from_utf8(payload).map_err(|_| FrameError::NotUtf8)
}

impl FromStr for Framing {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "length-prefixed" | "length" => Ok(Framing::LengthPrefixed),
            "raw" => Ok(Framing::Raw),
            other => Err(FrameError::UnknownFraming(other.to_string())),
        }
    }
}

impl fmt::Display for Framing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Framing::LengthPrefixed => write!(f, "length-prefixed"),
            Framing::Raw => write!(f, "raw"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_prefixed_header() {
        let frame = Framing::LengthPrefixed.encode(b"T|B|G0,-1").unwrap();
        assert_eq!(&frame[..HEADER_LEN], &[0, 0, 0, 9]);
        assert_eq!(&frame[HEADER_LEN..], b"T|B|G0,-1");
        assert_eq!(payload_len([0, 0, 0, 9]), Ok(9));
    }

    #[test]
    fn test_raw_is_untouched() {
        let frame = Framing::Raw.encode(b"T|B|G0,-1").unwrap();
        assert_eq!(frame, b"T|B|G0,-1");
    }

    #[test]
    fn test_oversized_frames_rejected() {
        let payload = vec![b'x'; MAX_FRAME_LEN + 1];
        assert_eq!(
            Framing::LengthPrefixed.encode(&payload),
            Err(FrameError::TooLarge(MAX_FRAME_LEN + 1))
        );
        assert!(payload_len(u32::MAX.to_be_bytes()).is_err());
    }

    #[test]
    fn test_payload_text() {
        assert_eq!(payload_text(b"T|B|G0,-1"), Ok("T|B|G0,-1"));
        assert_eq!(payload_text(&[0xFF, 0xFE]), Err(FrameError::NotUtf8));
    }

    #[test]
    fn test_framing_from_str() {
        assert_eq!("raw".parse::<Framing>(), Ok(Framing::Raw));
        assert_eq!(
            "Length-Prefixed".parse::<Framing>(),
            Ok(Framing::LengthPrefixed)
        );
        assert!("json".parse::<Framing>().is_err());
        assert_eq!(Framing::default().to_string(), "length-prefixed");
    }
}
