//! Error types for atelier
//!
//! Provides a unified error type used across all atelier crates.

use std::path::PathBuf;

/// Main error type for atelier operations
#[derive(Debug, thiserror::Error)]
pub enum AtelierError {
    // === IO Errors ===

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    // === Configuration Errors ===

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration at {path}: {message}")]
    ConfigInvalid { path: PathBuf, message: String },

    // === Session Errors ===

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Session already exited: {0}")]
    SessionExited(String),

    // === PTY Errors ===

    #[error("PTY error: {0}")]
    Pty(String),

    #[error("Failed to spawn process: {0}")]
    ProcessSpawn(String),

    // === Internal Errors ===

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AtelierError {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a PTY error
    pub fn pty(msg: impl Into<String>) -> Self {
        Self::Pty(msg.into())
    }

    /// Create a spawn error
    pub fn spawn(msg: impl Into<String>) -> Self {
        Self::ProcessSpawn(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether a spawn failure means the target executable is not installed
    ///
    /// Used to decide between installation guidance and the raw error
    /// message when reporting a failed spawn to the user.
    pub fn indicates_missing_executable(&self) -> bool {
        match self {
            Self::ProcessSpawn(msg) => {
                let msg = msg.to_lowercase();
                msg.contains("not found") || msg.contains("no such file")
            }
            _ => false,
        }
    }
}

/// Result type alias using AtelierError
pub type Result<T> = std::result::Result<T, AtelierError>;
