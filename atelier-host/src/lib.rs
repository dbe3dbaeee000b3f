//! atelier-host: process host boundary for the atelier shell
//!
//! Defines the [`ProcessHost`] trait the session controller is written
//! against, the shared session types, and [`PtyHost`], a reference
//! implementation that multiplexes local pseudo-terminal processes by
//! opaque session id.

mod host;
mod pty;
mod types;

pub use host::{ExitSubscription, OutputSubscription, ProcessHost};
pub use pty::PtyHost;
pub use types::{ExitNotice, SessionId, SpawnSpec};
