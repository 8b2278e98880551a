//! Raw single-keystroke input.
//!
//! The confirmation prompt reads exactly one key without waiting for Enter
//! and without echoing into any line-editing history. Crossterm covers both
//! the POSIX termios path and the Windows console path behind one
//! implementation, so a single reader serves every platform.

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use std::io::Write;

/// A single keystroke read from the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPress {
    /// A printable character key.
    Char(char),
    /// Ctrl-C pressed while the terminal was in raw mode.
    Interrupt,
    /// Enter, Esc, or any other non-character key. The confirmation prompt
    /// treats this the same as answering "no".
    Other,
}

/// Capability trait for reading one keystroke.
///
/// Production code uses [`CrosstermKeyReader`]; tests inject scripted
/// implementations.
pub trait RawKeyReader {
    /// Writes `prompt` without a trailing newline, blocks until one key is
    /// pressed, echoes it followed by a newline, and returns it. Exactly one
    /// keystroke is consumed; nothing is buffered.
    fn read_key(&mut self, prompt: &str) -> Result<KeyPress>;
}

/// Restores the previous terminal mode when dropped.
///
/// Raw mode is a scoped resource: it must be left again even if the read
/// fails or the caller panics, otherwise the user's terminal is corrupted.
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

/// Terminal-backed key reader.
pub struct CrosstermKeyReader;

impl RawKeyReader for CrosstermKeyReader {
    fn read_key(&mut self, prompt: &str) -> Result<KeyPress> {
        let mut stdout = std::io::stdout();
        write!(stdout, "{}", prompt)?;
        stdout.flush()?;

        let key = {
            let _guard = RawModeGuard::enable()?;
            Self::next_key_press()?
            // guard drops here, leaving raw mode before we echo
        };

        match key {
            KeyPress::Char(c) => writeln!(stdout, "{}", c)?,
            _ => writeln!(stdout)?,
        }

        Ok(key)
    }
}

impl CrosstermKeyReader {
    fn next_key_press() -> Result<KeyPress> {
        loop {
            if let Event::Key(key_event) = event::read()? {
                // Release/repeat events would double-read on Windows.
                if key_event.kind != KeyEventKind::Press {
                    continue;
                }
                return Ok(match key_event.code {
                    KeyCode::Char('c')
                        if key_event.modifiers.contains(KeyModifiers::CONTROL) =>
                    {
                        KeyPress::Interrupt
                    }
                    KeyCode::Char(c) => KeyPress::Char(c),
                    _ => KeyPress::Other,
                });
            }
        }
    }
}
