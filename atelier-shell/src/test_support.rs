//! Test doubles for the host and surface boundaries

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::{mpsc, Notify};

use atelier_host::{
    ExitNotice, ExitSubscription, OutputSubscription, ProcessHost, SessionId, SpawnSpec,
};
use atelier_utils::{AtelierError, Result};

use crate::surface::DisplaySurface;

/// Poll a condition until it holds or a 5s deadline passes
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !condition() {
        if tokio::time::Instant::now() > deadline {
            panic!("condition not reached in time");
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// One recorded call against the mock host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    Spawn {
        command: String,
        args: Vec<String>,
        cols: u16,
        rows: u16,
    },
    Write {
        id: String,
        bytes: Vec<u8>,
    },
    Resize {
        id: String,
        cols: u16,
        rows: u16,
    },
    Kill {
        id: String,
    },
    SubscribeOutput {
        id: String,
    },
    SubscribeExit {
        id: String,
    },
}

/// Gate that holds a spawn open until the test releases it
///
/// Used to interleave teardown with an in-flight spawn.
pub struct SpawnGate {
    entered: Notify,
    release: Notify,
}

impl SpawnGate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            entered: Notify::new(),
            release: Notify::new(),
        })
    }

    /// Wait until a spawn call has reached the gate
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    /// Let the gated spawn resolve
    pub fn release(&self) {
        self.release.notify_one();
    }
}

#[derive(Default)]
struct MockChannels {
    output_tx: Option<mpsc::UnboundedSender<Bytes>>,
    exit_tx: Option<mpsc::UnboundedSender<ExitNotice>>,
}

/// Scripted in-memory process host
#[derive(Default)]
pub struct MockHost {
    calls: Mutex<Vec<HostCall>>,
    spawn_results: Mutex<VecDeque<std::result::Result<String, String>>>,
    sessions: Mutex<HashMap<String, MockChannels>>,
    fail_writes: Mutex<bool>,
    gate: Mutex<Option<Arc<SpawnGate>>>,
    auto_id: AtomicUsize,
}

impl MockHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a successful spawn returning `id`
    pub fn expect_spawn_ok(&self, id: &str) {
        self.spawn_results.lock().push_back(Ok(id.to_string()));
    }

    /// Queue a failed spawn with the given message
    pub fn expect_spawn_err(&self, message: &str) {
        self.spawn_results.lock().push_back(Err(message.to_string()));
    }

    /// Make every write fail as if the session already exited
    pub fn set_fail_writes(&self, fail: bool) {
        *self.fail_writes.lock() = fail;
    }

    /// Hold the next spawns open until the gate is released
    pub fn set_gate(&self, gate: Arc<SpawnGate>) {
        *self.gate.lock() = Some(gate);
    }

    /// Snapshot of every recorded call, in order
    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.lock().clone()
    }

    /// Deliver an output chunk to the session's subscriber, if any
    pub fn push_output(&self, id: &str, bytes: &[u8]) {
        let sessions = self.sessions.lock();
        if let Some(tx) = sessions.get(id).and_then(|c| c.output_tx.as_ref()) {
            let _ = tx.send(Bytes::copy_from_slice(bytes));
        }
    }

    /// Deliver the exit notice to the session's subscriber, if any
    pub fn fire_exit(&self, id: &str) {
        let sessions = self.sessions.lock();
        if let Some(tx) = sessions.get(id).and_then(|c| c.exit_tx.as_ref()) {
            let _ = tx.send(ExitNotice {
                session_id: SessionId::new(id),
            });
        }
    }

    /// Whether an output subscription was ever taken for `id`
    pub fn has_output_subscriber(&self, id: &str) -> bool {
        self.sessions
            .lock()
            .get(id)
            .map(|c| c.output_tx.is_some())
            .unwrap_or(false)
    }

    /// Whether the subscriber side of the output channel is gone
    pub fn output_closed(&self, id: &str) -> bool {
        self.sessions
            .lock()
            .get(id)
            .and_then(|c| c.output_tx.as_ref())
            .map(|tx| tx.is_closed())
            .unwrap_or(true)
    }

    fn record(&self, call: HostCall) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl ProcessHost for MockHost {
    async fn spawn(&self, spec: SpawnSpec) -> Result<SessionId> {
        self.record(HostCall::Spawn {
            command: spec.command.clone(),
            args: spec.args.clone(),
            cols: spec.cols,
            rows: spec.rows,
        });

        let gate = self.gate.lock().clone();
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }

        let next = self.spawn_results.lock().pop_front();
        let id = match next {
            Some(Ok(id)) => id,
            Some(Err(message)) => return Err(AtelierError::spawn(message)),
            None => format!("mock-{}", self.auto_id.fetch_add(1, Ordering::SeqCst)),
        };

        self.sessions
            .lock()
            .insert(id.clone(), MockChannels::default());
        Ok(SessionId::new(id))
    }

    async fn write(&self, id: &SessionId, bytes: &[u8]) -> Result<()> {
        self.record(HostCall::Write {
            id: id.to_string(),
            bytes: bytes.to_vec(),
        });
        if *self.fail_writes.lock() {
            return Err(AtelierError::SessionExited(id.to_string()));
        }
        Ok(())
    }

    async fn resize(&self, id: &SessionId, cols: u16, rows: u16) -> Result<()> {
        self.record(HostCall::Resize {
            id: id.to_string(),
            cols,
            rows,
        });
        Ok(())
    }

    async fn kill(&self, id: &SessionId) -> Result<()> {
        self.record(HostCall::Kill { id: id.to_string() });
        Ok(())
    }

    fn subscribe_output(&self, id: &SessionId) -> Result<OutputSubscription> {
        self.record(HostCall::SubscribeOutput { id: id.to_string() });
        let (tx, rx) = mpsc::unbounded_channel();
        self.sessions
            .lock()
            .get_mut(id.as_str())
            .ok_or_else(|| AtelierError::SessionNotFound(id.to_string()))?
            .output_tx = Some(tx);
        Ok(OutputSubscription::new(rx))
    }

    fn subscribe_exit(&self, id: &SessionId) -> Result<ExitSubscription> {
        self.record(HostCall::SubscribeExit { id: id.to_string() });
        let (tx, rx) = mpsc::unbounded_channel();
        self.sessions
            .lock()
            .get_mut(id.as_str())
            .ok_or_else(|| AtelierError::SessionNotFound(id.to_string()))?
            .exit_tx = Some(tx);
        Ok(ExitSubscription::new(rx))
    }
}

/// Event observed on the mock surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceEvent {
    Write(Vec<u8>),
    Clear,
}

/// Recording display surface
pub struct MockSurface {
    events: Mutex<Vec<SurfaceEvent>>,
    size: Mutex<(u16, u16)>,
}

impl MockSurface {
    pub fn new(cols: u16, rows: u16) -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            size: Mutex::new((cols, rows)),
        }
    }

    /// Everything written since the last clear, lossily decoded
    pub fn text(&self) -> String {
        let events = self.events.lock();
        let mut text = String::new();
        for event in events.iter() {
            match event {
                SurfaceEvent::Write(bytes) => {
                    text.push_str(&String::from_utf8_lossy(bytes));
                }
                SurfaceEvent::Clear => text.clear(),
            }
        }
        text
    }

    pub fn clear_count(&self) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| matches!(e, SurfaceEvent::Clear))
            .count()
    }

    pub fn set_size(&self, cols: u16, rows: u16) {
        *self.size.lock() = (cols, rows);
    }
}

impl DisplaySurface for MockSurface {
    fn write(&self, bytes: &[u8]) {
        self.events.lock().push(SurfaceEvent::Write(bytes.to_vec()));
    }

    fn clear(&self) {
        self.events.lock().push(SurfaceEvent::Clear);
    }

    fn size(&self) -> (u16, u16) {
        *self.size.lock()
    }
}
