//! Shell configuration loading
//!
//! Reads the `[shell]` section of the shared config file. Every field
//! has a default, so a missing or unparseable file degrades to the
//! built-in configuration with a warning.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Default executable for the embedded assistant CLI
const DEFAULT_COMMAND: &str = "claude";

/// Default quiescence window for resize debouncing, in milliseconds
const DEFAULT_RESIZE_DEBOUNCE_MS: u64 = 100;

/// Default pause between injected command text and its terminating
/// carriage return, in milliseconds
///
/// Tuned against the embedded CLI's line editor, which needs to echo the
/// command before it will accept the terminator. Not a timing guarantee.
const DEFAULT_COMMAND_DELAY_MS: u64 = 100;

/// Tunables for the session controller
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Executable spawned for each session
    pub command: String,
    /// Base arguments passed on every spawn (resume arguments are
    /// appended to these)
    pub launch_args: Vec<String>,
    /// Working directory for spawned sessions
    pub working_dir: PathBuf,
    /// Resize debounce window in milliseconds
    pub resize_debounce_ms: u64,
    /// Delay before the carriage return when injecting a command, in
    /// milliseconds
    pub command_delay_ms: u64,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            command: DEFAULT_COMMAND.into(),
            launch_args: Vec::new(),
            working_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            resize_debounce_ms: DEFAULT_RESIZE_DEBOUNCE_MS,
            command_delay_ms: DEFAULT_COMMAND_DELAY_MS,
        }
    }
}

/// Shape of the shared config file; the shell only reads its own section
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    shell: Option<ShellConfig>,
}

impl ShellConfig {
    /// Load from the standard config file location
    pub fn load() -> Self {
        Self::load_from(&atelier_utils::paths::config_file())
    }

    /// Load from a specific path, falling back to defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            tracing::debug!("Config file not found, using default shell config");
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str::<FileConfig>(&content) {
                Ok(config) => config.shell.unwrap_or_default(),
                Err(e) => {
                    tracing::warn!("Failed to parse config file: {}, using defaults", e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read config file: {}, using defaults", e);
                Self::default()
            }
        }
    }
}
