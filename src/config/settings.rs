//! Process-level settings read from the environment.
//!
//! | variable         | default                    |
//! |------------------|----------------------------|
//! | `AF_HOME`        | `~/.actionflow`            |
//! | `AF_DEBUG`       | off                        |
//! | `AF_MAX_WORKERS` | available parallelism      |
//! | `AF_PID_FILE`    | `<temp dir>/actionflow.pid` |

use std::env;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::flow::default_max_workers;

pub const HOME_VAR: &str = "AF_HOME";
pub const DEBUG_VAR: &str = "AF_DEBUG";
pub const MAX_WORKERS_VAR: &str = "AF_MAX_WORKERS";
pub const PID_FILE_VAR: &str = "AF_PID_FILE";

/// Variables read by [`Settings`]; they never act as template overrides.
pub const SETTINGS_VARS: [&str; 4] = [HOME_VAR, DEBUG_VAR, MAX_WORKERS_VAR, PID_FILE_VAR];

/// Runtime settings shared by the CLI and the loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Home directory holding the log file and the default workspace.
    pub home: PathBuf,
    /// Verbose logging.
    pub debug: bool,
    /// Bound on concurrently running actions within a group.
    pub max_workers: usize,
    /// PID file guarding against concurrent runs.
    pub pid_file: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            home: default_home(),
            debug: false,
            max_workers: default_max_workers(),
            pid_file: env::temp_dir().join("actionflow.pid"),
        }
    }
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read settings through `lookup`; unset or invalid values keep their default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = Self::default();

        if let Some(home) = lookup(HOME_VAR).filter(|v| !v.is_empty()) {
            settings.home = PathBuf::from(home);
        }
        if let Some(debug) = lookup(DEBUG_VAR) {
            settings.debug = is_truthy(&debug);
        }
        if let Some(raw) = lookup(MAX_WORKERS_VAR) {
            match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => settings.max_workers = n,
                _ => warn!("Ignoring invalid AF_MAX_WORKERS={:?}", raw),
            }
        }
        if let Some(pid_file) = lookup(PID_FILE_VAR).filter(|v| !v.is_empty()) {
            settings.pid_file = PathBuf::from(pid_file);
        }

        settings
    }

    /// Use `home` instead of the configured home directory.
    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = home.into();
        self
    }

    /// Home directory.
    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Log file path.
    pub fn logfile(&self) -> PathBuf {
        self.home.join("main.log")
    }

    /// Default workspace for flows that do not declare one.
    pub fn workspace(&self) -> PathBuf {
        self.home.join("workspace")
    }
}

fn default_home() -> PathBuf {
    home::home_dir()
        .unwrap_or_else(env::temp_dir)
        .join(".actionflow")
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
