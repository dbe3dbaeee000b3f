//! Per-session event bridge
//!
//! Routes one session's output stream to the display surface and watches
//! for its exit notification. Created at promotion, disposed before the
//! session record is discarded so a superseded session can never deliver
//! into the surface alongside its successor.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use atelier_host::{ExitSubscription, OutputSubscription, SessionId};

use crate::session::record::SessionStore;
use crate::surface::DisplaySurface;

/// Marker written to the surface when the process terminates
const EXIT_MARKER: &[u8] = b"\r\n\x1b[33mProcess exited\x1b[0m\r\n";

/// Subscription pair bound to exactly one session id
pub struct EventBridge {
    cancel: CancellationToken,
}

impl EventBridge {
    /// Start forwarding for `session_id`
    ///
    /// Output chunks are written to the surface in arrival order with no
    /// batching. On exit the marker is written and the record flipped to
    /// terminated; the controller takes no automatic action beyond that.
    pub(crate) fn spawn(
        session_id: SessionId,
        mut output: OutputSubscription,
        mut exit: ExitSubscription,
        surface: Arc<dyn DisplaySurface>,
        store: Arc<Mutex<SessionStore>>,
    ) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        tokio::spawn(async move {
            let mut output_open = true;

            let exited = loop {
                tokio::select! {
                    _ = token.cancelled() => break false,
                    notice = exit.recv() => break notice.is_some(),
                    chunk = output.recv(), if output_open => match chunk {
                        Some(chunk) => surface.write(&chunk),
                        None => output_open = false,
                    },
                }
            };

            if exited {
                // Flush output that was queued ahead of the exit notice
                while let Some(chunk) = output.try_recv() {
                    surface.write(&chunk);
                }
                surface.write(EXIT_MARKER);
                store.lock().mark_terminated(&session_id);
                debug!(session_id = %session_id, "session terminated");
            }
        });

        Self { cancel }
    }

    /// Stop forwarding and release both subscriptions
    ///
    /// Safe to call any number of times.
    pub fn dispose(&self) {
        self.cancel.cancel();
    }
}

impl Drop for EventBridge {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
