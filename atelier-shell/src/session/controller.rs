//! Session controller
//!
//! Orchestrates spawn, teardown, command injection, and session
//! replacement. One controller drives one display surface and at most
//! one live session at a time; the embedding UI calls in from its own
//! task, and the controller's background pieces (event bridge, resize
//! coordinator) communicate through the shared record store.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use atelier_host::{ProcessHost, SessionId, SpawnSpec};
use atelier_utils::{AtelierError, Result};

use crate::config::ShellConfig;
use crate::input::{classify, InputDisposition};
use crate::resize::ResizeCoordinator;
use crate::session::bridge::EventBridge;
use crate::session::record::{Liveness, SessionRecord, SessionStore};
use crate::surface::DisplaySurface;

/// Kill-line control: clears whatever is typed at the process's line
/// editor before a command is injected
const CLEAR_LINE: &str = "\x15";

/// Owns the lifecycle of the embedded interactive session
pub struct SessionController {
    host: Arc<dyn ProcessHost>,
    surface: Arc<dyn DisplaySurface>,
    config: ShellConfig,
    store: Arc<Mutex<SessionStore>>,
    /// Teardown signal; a spawn resolving after this fires is killed
    /// instead of promoted
    shutdown: CancellationToken,
    bridge: Mutex<Option<EventBridge>>,
    resize: ResizeCoordinator,
    connection_error: Mutex<Option<String>>,
    session_tx: watch::Sender<Option<SessionId>>,
}

impl SessionController {
    /// Create a controller; must be called within a tokio runtime
    ///
    /// No session exists until [`start`](Self::start) is called.
    pub fn new(
        host: Arc<dyn ProcessHost>,
        surface: Arc<dyn DisplaySurface>,
        config: ShellConfig,
    ) -> Self {
        let store = Arc::new(Mutex::new(SessionStore::default()));
        let shutdown = CancellationToken::new();
        let resize = ResizeCoordinator::spawn(
            host.clone(),
            store.clone(),
            Duration::from_millis(config.resize_debounce_ms),
            shutdown.child_token(),
        );
        let (session_tx, _) = watch::channel(None);

        Self {
            host,
            surface,
            config,
            store,
            shutdown,
            bridge: Mutex::new(None),
            resize,
            connection_error: Mutex::new(None),
            session_tx,
        }
    }

    /// Spawn the initial session with the configured fresh arguments
    ///
    /// Spawn failures are reported on the surface (with installation
    /// guidance when the executable is missing) and recorded as the
    /// connection error; they do not propagate. The controller stays
    /// usable for a later [`resume_session`](Self::resume_session).
    pub async fn start(&self) -> Result<()> {
        match self.spawn_and_promote(self.config.launch_args.clone()).await {
            Ok(_) => Ok(()),
            Err(e @ AtelierError::ProcessSpawn(_)) => {
                self.report_spawn_failure(&e);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Replace the live session with one resuming a saved conversation
    ///
    /// The previous bridge is disposed and the previous session killed
    /// before the new spawn is issued; geometry is re-measured from the
    /// surface at spawn time. On failure the controller is left with no
    /// active session and the spawn error propagates to the caller,
    /// which owns user-facing reporting for explicit resume requests.
    pub async fn resume_session(&self, conversation_id: &str) -> Result<()> {
        self.teardown_current_session().await;
        self.surface.clear();

        let mut args = self.config.launch_args.clone();
        args.push("--resume".to_string());
        args.push(conversation_id.to_string());

        match self.spawn_and_promote(args).await {
            Ok(_) => Ok(()),
            Err(e) => {
                *self.connection_error.lock() = Some(e.to_string());
                error!("failed to resume session: {}", e);
                Err(e)
            }
        }
    }

    /// Forward raw text to the active session
    ///
    /// No-op without an active session: the UI calls this
    /// opportunistically. Write failures are logged, never surfaced; a
    /// dead session announces itself through the exit notification.
    pub async fn send_input(&self, text: &str) {
        let Some(id) = self.store.lock().active_id() else {
            return;
        };
        if let Err(e) = self.host.write(&id, text.as_bytes()).await {
            warn!(session_id = %id, "write to session failed: {}", e);
        }
    }

    /// Entry point for the display surface's keystroke stream
    ///
    /// Applies the mouse-escape filter before forwarding; suppressed
    /// chunks never reach the write path.
    pub async fn handle_surface_input(&self, chunk: &str) {
        match classify(chunk) {
            InputDisposition::Forward => self.send_input(chunk).await,
            InputDisposition::Suppress => {}
        }
    }

    /// Inject a command at the process's line editor
    ///
    /// Clears any partially-typed line, sends the command text, waits
    /// for the line editor to echo it, then sends the terminating
    /// carriage return. No-op without an active session.
    pub async fn send_command(&self, command: &str) {
        if self.store.lock().active_id().is_none() {
            return;
        }

        self.send_input(CLEAR_LINE).await;
        self.send_input(command).await;
        tokio::time::sleep(Duration::from_millis(self.config.command_delay_ms)).await;
        self.send_input("\r").await;
    }

    /// Record a geometry change from the surface's size observer
    pub fn notify_geometry_changed(&self, cols: u16, rows: u16) {
        self.resize.notify(cols, rows);
    }

    /// Id of the current session, if any
    pub fn current_session_id(&self) -> Option<SessionId> {
        self.store.lock().current_id()
    }

    /// Last spawn failure message, cleared on the next successful spawn
    pub fn connection_error(&self) -> Option<String> {
        self.connection_error.lock().clone()
    }

    /// Observe changes of the active session id
    pub fn subscribe_session_changes(&self) -> watch::Receiver<Option<SessionId>> {
        self.session_tx.subscribe()
    }

    /// Tear the controller down
    ///
    /// Any spawn still in flight is neutralized when it resolves; the
    /// bridge, session, and resize task are released. Never fails:
    /// cleanup is best-effort.
    pub async fn dispose(&self) {
        self.shutdown.cancel();
        self.teardown_current_session().await;
        info!("session controller disposed");
    }

    /// Dispose the bridge and kill the current session, best-effort
    async fn teardown_current_session(&self) {
        if let Some(bridge) = self.bridge.lock().take() {
            bridge.dispose();
        }

        let previous = self.store.lock().clear();
        if let Some(record) = previous {
            if let Err(e) = self.host.kill(&record.id).await {
                debug!(session_id = %record.id, "kill during teardown failed: {}", e);
            }
            self.session_tx.send_replace(None);
        }
    }

    /// Spawn with the given arguments and promote the result
    ///
    /// Returns `Ok(None)` when a teardown signal arrived while the spawn
    /// was pending: the resolved session is killed immediately and never
    /// promoted, and no subscription is created for it.
    async fn spawn_and_promote(&self, launch_args: Vec<String>) -> Result<Option<SessionId>> {
        let (cols, rows) = self.surface.size();
        let spec = SpawnSpec::new(&self.config.command, &self.config.working_dir)
            .args(launch_args.iter().cloned())
            .size(cols, rows);

        let id = self.host.spawn(spec).await?;

        if self.shutdown.is_cancelled() {
            debug!(session_id = %id, "controller torn down mid-spawn, discarding session");
            let _ = self.host.kill(&id).await;
            return Ok(None);
        }

        let output = self.host.subscribe_output(&id)?;
        let exit = self.host.subscribe_exit(&id)?;

        self.store.lock().promote(SessionRecord {
            id: id.clone(),
            working_dir: self.config.working_dir.clone(),
            launch_args,
            liveness: Liveness::Spawning,
        });

        let bridge = EventBridge::spawn(
            id.clone(),
            output,
            exit,
            self.surface.clone(),
            self.store.clone(),
        );
        if let Some(stale) = self.bridge.lock().replace(bridge) {
            stale.dispose();
        }

        self.store.lock().activate(&id);
        *self.connection_error.lock() = None;
        self.session_tx.send_replace(Some(id.clone()));
        info!(session_id = %id, "session active");

        Ok(Some(id))
    }

    /// Report a failed fresh spawn on the surface
    fn report_spawn_failure(&self, err: &AtelierError) {
        let message = err.to_string();
        *self.connection_error.lock() = Some(message.clone());
        error!("failed to spawn session: {}", message);

        if err.indicates_missing_executable() {
            self.surface
                .write(b"\r\n\x1b[31mError: Claude Code not found\x1b[0m\r\n");
            self.surface.write(b"\r\nPlease install Claude Code:\r\n");
            self.surface
                .write(b"  \x1b[36mnpm install -g @anthropic-ai/claude-code\x1b[0m\r\n");
            self.surface
                .write(b"\r\nOr visit: \x1b[36mhttps://claude.ai/code\x1b[0m\r\n");
        } else {
            self.surface
                .write(format!("\r\n\x1b[31mError: {}\x1b[0m\r\n", message).as_bytes());
            self.surface
                .write(b"\r\nPlease ensure the assistant CLI is installed and accessible\r\n");
        }
    }
}
