//! Single-instance guard, one per [`Mode`].

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use logmon_core::atomic;
use logmon_core::mailbox::{EventDraft, MailboxWriter};
use logmon_core::{Mode, MonitorError};
use tracing::{debug, warn};

/// Host-specific check for another live process of the same mode.
pub trait InstanceGuard {
    /// `true` when another instance of `mode` is alive. Otherwise the
    /// caller now holds the mode until the guard is dropped.
    fn already_running(&mut self, mode: Mode) -> Result<bool, MonitorError>;
}

/// Pid-file guard. Liveness of a recorded pid is checked through `/proc`.
///
/// The pid file is created only when absent, so of two instances starting
/// together exactly one wins. A file left by a dead process is removed and
/// the claim retried.
#[derive(Debug)]
pub struct PidFileGuard {
    dir: PathBuf,
    proc_root: PathBuf,
    pid: u32,
    held: Option<PathBuf>,
}

const CLAIM_ATTEMPTS: usize = 3;

impl PidFileGuard {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_proc_root(dir, "/proc")
    }

    pub fn with_proc_root(dir: impl Into<PathBuf>, proc_root: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            proc_root: proc_root.into(),
            pid: std::process::id(),
            held: None,
        }
    }

    pub fn pid_path(&self, mode: Mode) -> PathBuf {
        self.dir.join(format!("logmon-{mode}.pid"))
    }

    fn is_alive(&self, pid: u32) -> bool {
        self.proc_root.join(pid.to_string()).is_dir()
    }

    /// The live pid recorded in `path`, if any.
    fn live_holder(&self, path: &Path) -> Result<Option<u32>, MonitorError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            // released between our create and read
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(MonitorError::io(path, e)),
        };
        match text.trim().parse::<u32>() {
            Ok(pid) if pid != self.pid && self.is_alive(pid) => Ok(Some(pid)),
            Ok(pid) => {
                debug!(pid, path = %path.display(), "removing stale pid file");
                Ok(None)
            }
            Err(_) => {
                warn!(path = %path.display(), "removing unreadable pid file");
                Ok(None)
            }
        }
    }
}

impl InstanceGuard for PidFileGuard {
    fn already_running(&mut self, mode: Mode) -> Result<bool, MonitorError> {
        if !self.proc_root.is_dir() {
            return Err(MonitorError::UnsupportedPlatform(format!(
                "process table {} is not available",
                self.proc_root.display()
            )));
        }

        let path = self.pid_path(mode);
        let own = self.pid;
        for _ in 0..CLAIM_ATTEMPTS {
            match atomic::create_file(&path, |out| writeln!(out, "{own}")) {
                Ok(()) => {
                    self.held = Some(path);
                    return Ok(false);
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
                Err(e) => return Err(MonitorError::io(&path, e)),
            }

            if let Some(pid) = self.live_holder(&path)? {
                debug!(%mode, pid, "instance already running");
                return Ok(true);
            }
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(MonitorError::io(&path, e)),
            }
        }

        // every attempt lost to another claimant
        Ok(true)
    }
}

impl Drop for PidFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.held.take() {
            if let Err(e) = fs::remove_file(&path) {
                warn!(path = %path.display(), error = %e, "cannot remove pid file");
            }
        }
    }
}

/// Claim `mode` through `guard`.
///
/// In run mode a refused claim (or an unsupported host) is recorded through
/// `mailbox` before the error is returned. Read mode passes no mailbox and
/// leaves the store untouched.
pub fn claim(
    guard: &mut impl InstanceGuard,
    mode: Mode,
    mailbox: Option<&MailboxWriter>,
) -> Result<(), MonitorError> {
    let err = match guard.already_running(mode) {
        Ok(false) => return Ok(()),
        Ok(true) => MonitorError::DuplicateProcess(mode),
        Err(err) => err,
    };
    if let Some(mailbox) = mailbox {
        let draft = EventDraft::new(err.code()).with_message(err.to_string());
        if let Err(terminated) = mailbox.append(draft) {
            if !matches!(terminated, MonitorError::Terminated { .. }) {
                return Err(terminated);
            }
        }
    }
    Err(err)
}
