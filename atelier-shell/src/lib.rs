//! atelier-shell: the interactive session controller
//!
//! This crate is the core of the atelier desktop shell: it owns the
//! lifecycle of the embedded AI assistant CLI running behind a process
//! host, bridges its output stream to the display surface, filters the
//! surface's keystroke stream, debounces geometry renegotiation, and
//! supports replacing the live session with a resumed conversation
//! without tearing down the surrounding UI.
//!
//! The embedding application provides two collaborators:
//! - a [`ProcessHost`](atelier_host::ProcessHost) that actually runs the
//!   process (see `atelier-host` for the PTY-backed one), and
//! - a [`DisplaySurface`] that renders bytes and produces keystrokes.
//!
//! Everything else (spawn, resume, teardown, command injection) goes
//! through [`SessionController`].

pub mod config;
pub mod input;
pub mod resize;
pub mod session;
pub mod surface;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::ShellConfig;
pub use resize::ResizeCoordinator;
pub use session::{EventBridge, Liveness, SessionController, SessionRecord};
pub use surface::DisplaySurface;

// Host boundary types the embedding application needs by name
pub use atelier_host::{ProcessHost, SessionId, SpawnSpec};
