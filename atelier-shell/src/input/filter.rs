//! Mouse escape sequence filtering
//!
//! The display surface reports keystrokes and pastes as raw chunks, but
//! mouse interaction makes it emit tracking sequences on the same
//! stream. Forwarding those to the process produces spurious blank input
//! lines, so they are suppressed here. Everything else passes through
//! byte-for-byte: the process is the authority on its own input stream.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Numbered mouse/cursor reports: ESC [ digits ; digits {M,m,R,t}
    static ref NUMBERED_REPORT: Regex =
        Regex::new(r"^\x1b\[\d+;\d+[MmRt]$").expect("valid report pattern");
}

/// What to do with one raw input chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputDisposition {
    /// Forward verbatim to the process
    Forward,
    /// Drop without forwarding
    Suppress,
}

/// Classify a raw input chunk from the display surface
pub fn classify(chunk: &str) -> InputDisposition {
    // Mouse button (ESC [ M), SGR mouse (ESC [ <), and mode reports
    // (ESC [ t) arrive as prefixes of longer payloads
    if chunk.starts_with("\x1b[M")
        || chunk.starts_with("\x1b[<")
        || chunk.starts_with("\x1b[t")
        || NUMBERED_REPORT.is_match(chunk)
    {
        return InputDisposition::Suppress;
    }

    InputDisposition::Forward
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suppresses_mouse_button_sequences() {
        assert_eq!(classify("\x1b[M abc"), InputDisposition::Suppress);
        assert_eq!(classify("\x1b[<0;42;13M"), InputDisposition::Suppress);
        assert_eq!(classify("\x1b[t"), InputDisposition::Suppress);
    }

    #[test]
    fn test_suppresses_numbered_reports() {
        assert_eq!(classify("\x1b[12;34M"), InputDisposition::Suppress);
        assert_eq!(classify("\x1b[1;1R"), InputDisposition::Suppress);
        assert_eq!(classify("\x1b[8;24t"), InputDisposition::Suppress);
        assert_eq!(classify("\x1b[120;5m"), InputDisposition::Suppress);
    }

    #[test]
    fn test_forwards_plain_text() {
        assert_eq!(classify("hello"), InputDisposition::Forward);
        assert_eq!(classify("a"), InputDisposition::Forward);
        assert_eq!(classify("\r"), InputDisposition::Forward);
        assert_eq!(classify(""), InputDisposition::Forward);
    }

    #[test]
    fn test_forwards_cursor_and_function_keys() {
        // Arrow keys and similar sequences must reach the process
        assert_eq!(classify("\x1b[A"), InputDisposition::Forward);
        assert_eq!(classify("\x1b[1~"), InputDisposition::Forward);
        assert_eq!(classify("\x1bOP"), InputDisposition::Forward);
        assert_eq!(classify("\x1b"), InputDisposition::Forward);
    }

    #[test]
    fn test_numbered_report_must_match_whole_chunk() {
        // A report embedded in a longer paste is user data, not tracking
        assert_eq!(classify("x\x1b[1;2R"), InputDisposition::Forward);
        assert_eq!(classify("\x1b[1;2Rtail"), InputDisposition::Forward);
        // Wrong terminator letter
        assert_eq!(classify("\x1b[1;2H"), InputDisposition::Forward);
    }
}
