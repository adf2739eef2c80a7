//! Process termination.
//!
//! Graceful kills send SIGTERM, wait [`GRACEFUL_KILL_TIMEOUT`], and follow up
//! with SIGKILL if the process is still around. On Windows the same pattern
//! runs through `taskkill` and `taskkill /F`.

use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::ports::ProcessKillerPort;

/// Grace period between SIGTERM and SIGKILL.
pub const GRACEFUL_KILL_TIMEOUT: Duration = Duration::from_millis(500);

/// How long to wait for the kernel to reap a SIGKILLed process.
const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(50);
const EXIT_POLL_ATTEMPTS: u32 = 10;

/// Platform kill executor.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessKiller;

impl ProcessKiller {
    pub fn new() -> Self {
        Self
    }

    /// SIGKILL `pid`. A pid that does not exist is `ProcessNotFound`.
    async fn force_kill(&self, pid: u32) -> Result<bool> {
        debug!(pid = pid, "Force killing process");
        platform::force(pid).await?;
        Ok(wait_for_exit(pid).await)
    }

    /// SIGKILL after a SIGTERM that was delivered; the process exiting in
    /// between counts as success.
    async fn escalate(&self, pid: u32) -> Result<bool> {
        match self.force_kill(pid).await {
            Err(Error::ProcessNotFound(_)) => {
                debug!(pid = pid, "Process exited before SIGKILL");
                Ok(true)
            }
            other => other,
        }
    }
}

async fn wait_for_exit(pid: u32) -> bool {
    for _ in 0..EXIT_POLL_ATTEMPTS {
        if !platform::is_running(pid) {
            return true;
        }
        sleep(EXIT_POLL_INTERVAL).await;
    }
    !platform::is_running(pid)
}

#[cfg(unix)]
mod platform {
    use nix::errno::Errno;
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;
    use tracing::debug;

    use crate::error::{Error, Result};

    fn to_pid(pid: u32) -> Result<Pid> {
        i32::try_from(pid)
            .map(Pid::from_raw)
            .map_err(|_| Error::KillFailed {
                pid,
                reason: "PID out of range".to_string(),
            })
    }

    /// Deliver `signal` to `pid`.
    pub fn send_signal(pid: u32, signal: Signal) -> Result<bool> {
        debug!(pid = pid, signal = ?signal, "Sending signal to process");
        match kill(to_pid(pid)?, signal) {
            Ok(()) => Ok(true),
            Err(Errno::ESRCH) => Err(Error::ProcessNotFound(pid)),
            Err(Errno::EPERM) => Err(Error::PermissionDenied(format!(
                "not allowed to signal process {}",
                pid
            ))),
            Err(errno) => Err(Error::KillFailed {
                pid,
                reason: errno.desc().to_string(),
            }),
        }
    }

    pub async fn terminate(pid: u32) -> Result<bool> {
        send_signal(pid, Signal::SIGTERM)
    }

    pub async fn force(pid: u32) -> Result<bool> {
        send_signal(pid, Signal::SIGKILL)
    }

    pub fn is_running(pid: u32) -> bool {
        let Ok(pid) = to_pid(pid) else {
            return false;
        };
        // signal 0 probes for existence; EPERM means it exists but is not ours
        match kill(pid, None) {
            Ok(()) => true,
            Err(Errno::EPERM) => true,
            Err(_) => false,
        }
    }
}

#[cfg(windows)]
mod platform {
    use std::process::Stdio;

    use tokio::process::Command;
    use tracing::debug;

    use crate::error::{Error, Result};

    async fn taskkill(pid: u32, force: bool) -> Result<bool> {
        debug!(pid = pid, force = force, "Executing taskkill");
        let mut cmd = Command::new("taskkill");
        cmd.args(["/PID", &pid.to_string()]);
        if force {
            cmd.arg("/F");
        }
        let output = cmd
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| Error::CommandFailed(format!("Failed to run taskkill: {}", e)))?;

        if output.status.success() {
            return Ok(true);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.contains("not found") {
            Err(Error::ProcessNotFound(pid))
        } else if stderr.contains("Access is denied") {
            Err(Error::PermissionDenied(format!(
                "not allowed to terminate process {}",
                pid
            )))
        } else {
            Err(Error::KillFailed {
                pid,
                reason: stderr.trim().to_string(),
            })
        }
    }

    pub async fn terminate(pid: u32) -> Result<bool> {
        taskkill(pid, false).await
    }

    pub async fn force(pid: u32) -> Result<bool> {
        taskkill(pid, true).await
    }

    pub fn is_running(pid: u32) -> bool {
        std::process::Command::new("tasklist")
            .args(["/FI", &format!("PID eq {}", pid), "/NH"])
            .output()
            .map(|o| String::from_utf8_lossy(&o.stdout).contains(&pid.to_string()))
            .unwrap_or(false)
    }
}

impl ProcessKillerPort for ProcessKiller {
    async fn kill(&self, pid: u32, force: bool) -> Result<bool> {
        if force {
            self.force_kill(pid).await
        } else {
            self.kill_gracefully(pid).await
        }
    }

    async fn kill_gracefully(&self, pid: u32) -> Result<bool> {
        debug!(pid = pid, "Attempting graceful kill");

        if let Err(e) = platform::terminate(pid).await {
            warn!(pid = pid, error = %e, "Failed to request termination");
            return Err(e);
        }

        sleep(GRACEFUL_KILL_TIMEOUT).await;

        if !platform::is_running(pid) {
            debug!(pid = pid, "Process exited within grace period");
            return Ok(true);
        }

        debug!(pid = pid, "Process still running, escalating");
        self.escalate(pid).await
    }

    fn is_running(&self, pid: u32) -> bool {
        platform::is_running(pid)
    }
}
