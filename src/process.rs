//! PID-file guard preventing concurrent runs.
//!
//! A run holds the PID file for its whole lifetime; the file is removed when
//! the [`PidGuard`] drops. A file left behind by a dead process is stale and
//! is reclaimed.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{FlowError, Result};

/// Holds the PID file while alive.
#[derive(Debug)]
pub struct PidGuard {
    path: PathBuf,
    pid: u32,
}

impl PidGuard {
    /// Create the PID file at `path`.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyRunning` if a live process holds the file.
    pub fn acquire(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if path.exists() {
            match running_pid(&path) {
                Some(pid) => {
                    debug!("PID file {} held by {}", path.display(), pid);
                    return Err(FlowError::AlreadyRunning { pid_file: path });
                }
                None => {
                    warn!("Removing stale PID file {}", path.display());
                    fs::remove_file(&path)?;
                }
            }
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let pid = std::process::id();
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(FlowError::AlreadyRunning { pid_file: path });
            }
            Err(e) => return Err(e.into()),
        };
        writeln!(file, "{}", pid)?;

        debug!("Acquired PID file {}", path.display());
        Ok(Self { path, pid })
    }

    /// PID file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PidGuard {
    fn drop(&mut self) {
        // Only remove the file if it is still ours.
        if read_pid(&self.path) == Some(self.pid) {
            if let Err(e) = fs::remove_file(&self.path) {
                warn!("Failed to remove PID file {}: {}", self.path.display(), e);
            }
        }
    }
}

/// PID recorded in the file at `path`, if readable.
pub fn read_pid(path: &Path) -> Option<u32> {
    fs::read_to_string(path).ok()?.trim().parse().ok()
}

/// PID of the live process holding `path`, if any.
pub fn running_pid(path: &Path) -> Option<u32> {
    read_pid(path).filter(|&pid| is_alive(pid))
}

#[cfg(unix)]
fn is_alive(pid: u32) -> bool {
    let Ok(pid) = libc::pid_t::try_from(pid) else {
        return false;
    };
    if pid <= 0 {
        return false;
    }
    // SAFETY: signal 0 performs error checking only; nothing is delivered.
    if unsafe { libc::kill(pid, 0) } == 0 {
        return true;
    }
    std::io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
}

#[cfg(not(unix))]
fn is_alive(_pid: u32) -> bool {
    true
}
