//! Debounced geometry renegotiation
//!
//! Continuous window-dragging produces a burst of geometry notifications;
//! forwarding each one would hammer the process host. The coordinator
//! absorbs a burst until it has been quiet for one debounce window, then
//! forwards a single resize carrying the last geometry observed.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use atelier_host::ProcessHost;

use crate::session::SessionStore;

/// Debounce front-end for geometry change notifications
///
/// State machine: idle until the first notification of a burst, pending
/// while the burst continues, back to idle after forwarding exactly one
/// resize per burst.
pub struct ResizeCoordinator {
    tx: mpsc::UnboundedSender<(u16, u16)>,
}

impl ResizeCoordinator {
    /// Start the coordinator task
    pub(crate) fn spawn(
        host: Arc<dyn ProcessHost>,
        store: Arc<Mutex<SessionStore>>,
        window: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<(u16, u16)>();

        tokio::spawn(async move {
            loop {
                // idle: wait for the first notification of a burst
                let mut latest = tokio::select! {
                    _ = shutdown.cancelled() => break,
                    geometry = rx.recv() => match geometry {
                        Some(geometry) => geometry,
                        None => break,
                    },
                };

                // pending: absorb until quiet for one full window
                loop {
                    tokio::select! {
                        _ = shutdown.cancelled() => return,
                        geometry = tokio::time::timeout(window, rx.recv()) => {
                            match geometry {
                                Ok(Some(geometry)) => latest = geometry,
                                Ok(None) => return,
                                Err(_) => break,
                            }
                        }
                    }
                }

                // Snapshot the id at forward time, not burst start
                let id = store.lock().active_id();
                if let Some(id) = id {
                    let (cols, rows) = latest;
                    if let Err(e) = host.resize(&id, cols, rows).await {
                        warn!(session_id = %id, "resize failed: {}", e);
                    }
                }
            }
        });

        Self { tx }
    }

    /// Record a geometry change; coalesced with the rest of the burst
    pub fn notify(&self, cols: u16, rows: u16) {
        // After shutdown the task is gone and the burst has nowhere to go
        let _ = self.tx.send((cols, rows));
    }
}
