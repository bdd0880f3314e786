//! # Tank Battle Client
//!
//! Terminal client for the tank battle server. It puts the terminal in raw
//! mode, forwards each key press to the server as it happens and redraws the arena as ASCII art every time a
//! snapshot arrives. The client keeps no game logic of its own; what it
//! draws is exactly what the server last broadcast.
//!
//! ## Modules
//!
//! - [`input`]: maps key events to actions and the quit key, and owns the
//!   raw-mode terminal guard.
//! - [`network`]: connection handling and [`network::FrameReader`], which
//!   recovers snapshots from the byte stream under either framing.
//! - [`rendering`]: turns a [`shared::GameState`] into terminal text.
//!
//! ## Controls
//!
//! `w`/`a`/`s`/`d` move, space shoots, `q` or Ctrl+C quits. Keys take effect
//! immediately; there is no need to press Enter.

pub mod input;
pub mod network;
pub mod rendering;

/// Logger settings for the client binary: `RUST_LOG` when set, `info`
/// otherwise.
pub fn log_env() -> env_logger::Env<'static> {
    env_logger::Env::default().default_filter_or("info")
}
