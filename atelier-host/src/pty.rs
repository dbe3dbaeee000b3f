//! PTY-backed process host
//!
//! Each spawned session owns a native pseudo-terminal pair. A blocking
//! reader thread pumps the master side, splits emissions on valid UTF-8
//! boundaries so multi-byte characters are never torn across chunks, and
//! fans chunks out to output subscribers. EOF on the master is the exit
//! signal: remaining bytes are flushed, exit subscribers are notified,
//! and output delivery stops.

use std::io::{Read, Write};
use std::sync::Arc;
use std::thread;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use parking_lot::Mutex;
use portable_pty::{native_pty_system, ChildKiller, CommandBuilder, MasterPty, PtySize};
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use atelier_utils::{AtelierError, Result};

use crate::host::{ExitSubscription, OutputSubscription, ProcessHost};
use crate::types::{ExitNotice, SessionId, SpawnSpec};

/// Read buffer size for PTY reads
const READ_BUFFER_SIZE: usize = 8192;

/// Find the last position in a byte slice that ends on a valid UTF-8
/// boundary
///
/// Returns the length of the longest prefix that is safe to emit without
/// splitting a multi-byte character. Bytes past the boundary belong to an
/// incomplete trailing character and must wait for the next read.
fn utf8_boundary(bytes: &[u8]) -> usize {
    let len = bytes.len();

    // Scan backwards for the start of the trailing character
    for i in (0..len).rev() {
        let byte = bytes[i];

        if byte < 0x80 {
            // ASCII, boundary is right after it
            return i + 1;
        }
        if byte >= 0xC0 {
            // Lead byte of a 2-4 byte sequence
            let expected = if byte >= 0xF0 {
                4
            } else if byte >= 0xE0 {
                3
            } else {
                2
            };
            return if len - i >= expected { i + expected } else { i };
        }
        // Continuation byte, keep scanning
    }

    0
}

/// Per-session fan-out state shared with the reader thread
struct SessionChannels {
    output_txs: Vec<mpsc::UnboundedSender<Bytes>>,
    exit_txs: Vec<mpsc::UnboundedSender<ExitNotice>>,
    /// Chunks produced before the first output subscriber attached.
    /// Replayed to that subscriber, then buffering stops for good.
    early_output: Option<Vec<Bytes>>,
    exited: bool,
}

impl SessionChannels {
    fn new() -> Self {
        Self {
            output_txs: Vec::new(),
            exit_txs: Vec::new(),
            early_output: Some(Vec::new()),
            exited: false,
        }
    }

    fn deliver_output(&mut self, chunk: Bytes) {
        if let Some(buffer) = &mut self.early_output {
            buffer.push(chunk);
            return;
        }
        self.output_txs.retain(|tx| tx.send(chunk.clone()).is_ok());
    }

    fn deliver_exit(&mut self, id: &SessionId) {
        self.exited = true;
        for tx in self.exit_txs.drain(..) {
            let _ = tx.send(ExitNotice {
                session_id: id.clone(),
            });
        }
        // Output stops being delivered once exit has fired. The early
        // buffer is kept so a first subscriber attaching after a fast
        // exit still sees everything the process printed.
        self.output_txs.clear();
    }
}

/// Handle to one spawned PTY session
struct PtyEntry {
    master: Mutex<Box<dyn MasterPty + Send>>,
    writer: Mutex<Box<dyn Write + Send>>,
    killer: Box<dyn ChildKiller + Send + Sync>,
    channels: Arc<Mutex<SessionChannels>>,
}

/// Process host multiplexing local PTY sessions by opaque id
#[derive(Default)]
pub struct PtyHost {
    sessions: DashMap<SessionId, PtyEntry>,
}

impl PtyHost {
    /// Create an empty host
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sessions currently tracked
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

#[async_trait]
impl ProcessHost for PtyHost {
    async fn spawn(&self, spec: SpawnSpec) -> Result<SessionId> {
        let pty_system = native_pty_system();

        let pair = pty_system
            .openpty(PtySize {
                rows: spec.rows.max(1),
                cols: spec.cols.max(1),
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| AtelierError::pty(format!("Failed to open PTY: {}", e)))?;

        let mut cmd = CommandBuilder::new(&spec.command);
        cmd.args(&spec.args);
        cmd.cwd(&spec.working_dir);

        // The embedded process expects a modern terminal environment
        cmd.env("TERM", "xterm-256color");
        cmd.env("COLORTERM", "truecolor");
        cmd.env("LANG", "en_US.UTF-8");

        let child = pair
            .slave
            .spawn_command(cmd)
            .map_err(|e| AtelierError::spawn(format!("{:#}", e)))?;

        let mut reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| AtelierError::pty(format!("Failed to clone reader: {}", e)))?;
        let writer = pair
            .master
            .take_writer()
            .map_err(|e| AtelierError::pty(format!("Failed to take writer: {}", e)))?;

        let id = SessionId::new(Uuid::new_v4().to_string());
        let channels = Arc::new(Mutex::new(SessionChannels::new()));

        self.sessions.insert(
            id.clone(),
            PtyEntry {
                master: Mutex::new(pair.master),
                writer: Mutex::new(writer),
                killer: child.clone_killer(),
                channels: channels.clone(),
            },
        );

        debug!(session_id = %id, command = %spec.command, "spawned PTY session");

        // Reader thread: pump output until EOF, then signal exit
        let reader_id = id.clone();
        let reader_channels = channels;
        thread::spawn(move || {
            let mut buf = [0u8; READ_BUFFER_SIZE];
            let mut pending: Vec<u8> = Vec::new();

            loop {
                match reader.read(&mut buf) {
                    Ok(0) => {
                        let mut channels = reader_channels.lock();
                        if !pending.is_empty() {
                            channels.deliver_output(Bytes::from(std::mem::take(&mut pending)));
                        }
                        channels.deliver_exit(&reader_id);
                        break;
                    }
                    Ok(n) => {
                        pending.extend_from_slice(&buf[..n]);
                        let boundary = utf8_boundary(&pending);
                        if boundary > 0 {
                            let chunk: Vec<u8> = pending.drain(..boundary).collect();
                            reader_channels.lock().deliver_output(Bytes::from(chunk));
                        }
                    }
                    Err(e) => {
                        warn!(session_id = %reader_id, "PTY read error: {}", e);
                        reader_channels.lock().deliver_exit(&reader_id);
                        break;
                    }
                }
            }
        });

        // Reaper thread so the child does not linger as a zombie
        let mut child = child;
        thread::spawn(move || {
            let _ = child.wait();
        });

        Ok(id)
    }

    async fn write(&self, id: &SessionId, bytes: &[u8]) -> Result<()> {
        let entry = self
            .sessions
            .get_mut(id)
            .ok_or_else(|| AtelierError::SessionNotFound(id.to_string()))?;

        if entry.channels.lock().exited {
            return Err(AtelierError::SessionExited(id.to_string()));
        }

        let mut writer = entry.writer.lock();
        writer
            .write_all(bytes)
            .map_err(|e| AtelierError::pty(format!("Write failed: {}", e)))?;
        writer
            .flush()
            .map_err(|e| AtelierError::pty(format!("Flush failed: {}", e)))
    }

    async fn resize(&self, id: &SessionId, cols: u16, rows: u16) -> Result<()> {
        let entry = self
            .sessions
            .get(id)
            .ok_or_else(|| AtelierError::SessionNotFound(id.to_string()))?;

        let result = entry
            .master
            .lock()
            .resize(PtySize {
                rows,
                cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| AtelierError::pty(format!("Resize failed: {}", e)));
        result
    }

    async fn kill(&self, id: &SessionId) -> Result<()> {
        // Idempotent: killing an id we no longer know is fine
        if let Some((_, mut entry)) = self.sessions.remove(id) {
            if let Err(e) = entry.killer.kill() {
                debug!(session_id = %id, "kill signal failed: {}", e);
            }
            debug!(session_id = %id, "killed PTY session");
        }
        Ok(())
    }

    fn subscribe_output(&self, id: &SessionId) -> Result<OutputSubscription> {
        let entry = self
            .sessions
            .get(id)
            .ok_or_else(|| AtelierError::SessionNotFound(id.to_string()))?;

        let (tx, rx) = mpsc::unbounded_channel();
        let mut channels = entry.channels.lock();
        if let Some(buffered) = channels.early_output.take() {
            for chunk in buffered {
                let _ = tx.send(chunk);
            }
        }
        if !channels.exited {
            channels.output_txs.push(tx);
        }
        Ok(OutputSubscription::new(rx))
    }

    fn subscribe_exit(&self, id: &SessionId) -> Result<ExitSubscription> {
        let entry = self
            .sessions
            .get(id)
            .ok_or_else(|| AtelierError::SessionNotFound(id.to_string()))?;

        let (tx, rx) = mpsc::unbounded_channel();
        let mut channels = entry.channels.lock();
        if channels.exited {
            // Late subscriber: deliver the notice immediately
            let _ = tx.send(ExitNotice {
                session_id: id.clone(),
            });
        } else {
            channels.exit_txs.push(tx);
        }
        Ok(ExitSubscription::new(rx))
    }
}
