//! Kill executor (interface).

use crate::error::Result;

/// Port for terminating processes.
///
/// Single-shot: implementations do not retry. `Ok(true)` means the process is
/// gone, `Ok(false)` means the signal was delivered but the process may still
/// be running. A pid that does not exist when the first signal is sent is
/// `Error::ProcessNotFound`.
pub trait ProcessKillerPort: Send + Sync {
    /// Kill a process by PID. `force` sends SIGKILL straight away.
    fn kill(&self, pid: u32, force: bool) -> impl std::future::Future<Output = Result<bool>> + Send;

    /// SIGTERM, a short grace period, then SIGKILL if the process survived.
    fn kill_gracefully(
        &self,
        pid: u32,
    ) -> impl std::future::Future<Output = Result<bool>> + Send;

    /// Check if a process is still running.
    fn is_running(&self, pid: u32) -> bool;
}
