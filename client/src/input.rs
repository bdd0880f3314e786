//! Keyboard input read key by key from a raw-mode terminal.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use log::debug;
use shared::ClientAction;
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Action(ClientAction),
    Quit,
}

/// Maps one terminal event to input, or `None` for anything unbound.
///
/// `q` and Ctrl+C quit. Raw mode swallows the interrupt signal, so Ctrl+C
/// arrives here as an ordinary key.
pub fn translate(event: &Event) -> Option<InputEvent> {
    let Event::Key(KeyEvent {
        code: KeyCode::Char(c),
        modifiers,
        kind,
        ..
    }) = event
    else {
        return None;
    };
    if *kind == KeyEventKind::Release {
        return None;
    }

    if modifiers.contains(KeyModifiers::CONTROL) {
        return c.eq_ignore_ascii_case(&'c').then_some(InputEvent::Quit);
    }
    if c.eq_ignore_ascii_case(&'q') {
        return Some(InputEvent::Quit);
    }
    u8::try_from(*c)
        .ok()
        .and_then(ClientAction::from_byte)
        .map(InputEvent::Action)
}

/// Keeps the terminal in raw mode for as long as it is alive.
///
/// Keys are delivered without waiting for Enter and are not echoed. The
/// previous mode is restored on drop, whichever way the session ends.
pub struct RawTerminal {
    _private: (),
}

impl RawTerminal {
    pub fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self { _private: () })
    }
}

impl Drop for RawTerminal {
    fn drop(&mut self) {
        if let Err(e) = terminal::disable_raw_mode() {
            debug!("Failed to restore terminal mode: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(c: char, modifiers: KeyModifiers) -> Event {
        Event::Key(KeyEvent::new(KeyCode::Char(c), modifiers))
    }

    #[test]
    fn test_movement_and_shoot_keys() {
        assert_eq!(
            translate(&key('w', KeyModifiers::NONE)),
            Some(InputEvent::Action(ClientAction::MoveUp))
        );
        assert_eq!(
            translate(&key('A', KeyModifiers::SHIFT)),
            Some(InputEvent::Action(ClientAction::MoveLeft))
        );
        assert_eq!(
            translate(&key(' ', KeyModifiers::NONE)),
            Some(InputEvent::Action(ClientAction::Shoot))
        );
    }

    #[test]
    fn test_quit_keys() {
        assert_eq!(translate(&key('q', KeyModifiers::NONE)), Some(InputEvent::Quit));
        assert_eq!(translate(&key('Q', KeyModifiers::SHIFT)), Some(InputEvent::Quit));
        assert_eq!(translate(&key('c', KeyModifiers::CONTROL)), Some(InputEvent::Quit));
    }

    #[test]
    fn test_unbound_events_ignored() {
        assert_eq!(translate(&key('x', KeyModifiers::NONE)), None);
        assert_eq!(translate(&key('é', KeyModifiers::NONE)), None);
        assert_eq!(translate(&key('w', KeyModifiers::CONTROL)), None);
        assert_eq!(
            translate(&Event::Key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE))),
            None
        );
        assert_eq!(translate(&Event::Resize(80, 24)), None);
    }

    #[test]
    fn test_key_release_ignored() {
        let release = Event::Key(KeyEvent::new_with_kind(
            KeyCode::Char('d'),
            KeyModifiers::NONE,
            KeyEventKind::Release,
        ));
        assert_eq!(translate(&release), None);
    }
}
