//! Shared session types for the host boundary

use std::fmt;
use std::path::PathBuf;

/// Opaque session identifier assigned by the process host at spawn time
///
/// The shell never inspects the contents; [`PtyHost`](crate::PtyHost)
/// assigns UUID v4 strings, other hosts may use whatever they multiplex by.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Create a session id from a raw value
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the raw value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Everything the host needs to start one interactive process
#[derive(Debug, Clone)]
pub struct SpawnSpec {
    /// Executable to run
    pub command: String,
    /// Arguments passed at spawn, in order
    pub args: Vec<String>,
    /// Absolute path used as the process's starting directory
    pub working_dir: PathBuf,
    /// Initial terminal width in columns
    pub cols: u16,
    /// Initial terminal height in rows
    pub rows: u16,
}

impl SpawnSpec {
    /// Create a spec with an 80x24 terminal and no arguments
    pub fn new(command: impl Into<String>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            working_dir: working_dir.into(),
            cols: 80,
            rows: 24,
        }
    }

    /// Set the spawn arguments
    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Set the initial terminal dimensions
    pub fn size(mut self, cols: u16, rows: u16) -> Self {
        self.cols = cols;
        self.rows = rows;
        self
    }
}

/// Notification that a session's process has terminated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitNotice {
    /// The session that exited
    pub session_id: SessionId,
}
