//! Multiline-newline key translation
//!
//! The embedded CLI treats a bare carriage return as "submit". Its
//! convention for inserting a newline without submitting is ESC CR, which
//! terminal widgets do not produce on their own, so the surface's raw
//! key-event hook routes every key through here before its normal
//! translation. The raw Shift+Enter event must never reach the process
//! on any transition, or the CLI would see a duplicate submission.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// ESC CR, the multiline-input sequence the embedded CLI understands
pub const MULTILINE_NEWLINE: &[u8] = b"\x1b\r";

/// Outcome of the raw key-event hook for one key event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDisposition {
    /// Send these bytes instead of the surface's own translation
    Translated(&'static [u8]),
    /// Swallow the event entirely
    Suppressed,
    /// Not ours; let the surface translate it normally
    Unhandled,
}

/// Intercept the multiline-newline chord (Shift+Enter)
///
/// Only the press transition produces bytes; repeat and release are
/// swallowed so the chord can never submit twice.
pub fn translate_multiline_key(key: &KeyEvent) -> KeyDisposition {
    if key.code == KeyCode::Enter && key.modifiers.contains(KeyModifiers::SHIFT) {
        return match key.kind {
            KeyEventKind::Press => KeyDisposition::Translated(MULTILINE_NEWLINE),
            // Repeat and release are swallowed too
            _ => KeyDisposition::Suppressed,
        };
    }

    KeyDisposition::Unhandled
}
