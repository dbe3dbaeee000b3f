//! The process host boundary consumed by the session controller
//!
//! A host multiplexes interactive processes by opaque [`SessionId`] and
//! delivers per-session output and exit events through subscription
//! handles. Subscriptions are plain channel receivers: dropping a
//! subscription is the unsubscribe, and the host prunes senders whose
//! receiver is gone on the next delivery.

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

use atelier_utils::Result;

use crate::types::{ExitNotice, SessionId, SpawnSpec};

/// Request/response + event-subscription facade over a process host
///
/// Contract notes:
/// - `spawn` fails with [`AtelierError::ProcessSpawn`] when the executable
///   cannot be located or the host refuses the request.
/// - `write` and `resize` fail on unknown or exited sessions; callers are
///   expected to log and continue, a later exit notification explains the
///   state.
/// - `kill` is idempotent: killing an unknown id succeeds.
/// - Output chunks are delivered in order with no duplicates, and stop
///   once the session's exit notification has fired.
///
/// [`AtelierError::ProcessSpawn`]: atelier_utils::AtelierError::ProcessSpawn
#[async_trait]
pub trait ProcessHost: Send + Sync {
    /// Start a new interactive process, returning its host-assigned id
    async fn spawn(&self, spec: SpawnSpec) -> Result<SessionId>;

    /// Write raw bytes to the process's input
    async fn write(&self, id: &SessionId, bytes: &[u8]) -> Result<()>;

    /// Renegotiate the terminal dimensions for a session
    async fn resize(&self, id: &SessionId, cols: u16, rows: u16) -> Result<()>;

    /// Terminate a session, best-effort
    async fn kill(&self, id: &SessionId) -> Result<()>;

    /// Subscribe to the session's ordered output stream
    fn subscribe_output(&self, id: &SessionId) -> Result<OutputSubscription>;

    /// Subscribe to the session's exit notification
    ///
    /// A session that already exited delivers its notice immediately on
    /// subscription, so late subscribers never miss termination.
    fn subscribe_exit(&self, id: &SessionId) -> Result<ExitSubscription>;
}

/// Receiving half of an output subscription
///
/// Dropping the subscription unsubscribes; the host stops delivering.
#[derive(Debug)]
pub struct OutputSubscription {
    rx: mpsc::UnboundedReceiver<Bytes>,
}

impl OutputSubscription {
    /// Wrap a channel receiver as a subscription handle
    pub fn new(rx: mpsc::UnboundedReceiver<Bytes>) -> Self {
        Self { rx }
    }

    /// Receive the next output chunk, or `None` once the stream is closed
    pub async fn recv(&mut self) -> Option<Bytes> {
        self.rx.recv().await
    }

    /// Take a chunk that is already queued, without waiting
    pub fn try_recv(&mut self) -> Option<Bytes> {
        self.rx.try_recv().ok()
    }
}

/// Receiving half of an exit subscription
#[derive(Debug)]
pub struct ExitSubscription {
    rx: mpsc::UnboundedReceiver<ExitNotice>,
}

impl ExitSubscription {
    /// Wrap a channel receiver as a subscription handle
    pub fn new(rx: mpsc::UnboundedReceiver<ExitNotice>) -> Self {
        Self { rx }
    }

    /// Receive the exit notice, or `None` if the subscription closed first
    pub async fn recv(&mut self) -> Option<ExitNotice> {
        self.rx.recv().await
    }
}
