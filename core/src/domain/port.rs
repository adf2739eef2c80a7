//! Port record model.

use serde::{Deserialize, Serialize};

use super::ProcessType;

/// Process name shown for ports that are favorited or watched but not listening.
pub const INACTIVE_PROCESS_NAME: &str = "Not running";

/// One listening port and the process that owns it.
///
/// Records come either from a scan (`is_active == true`) or are synthesised
/// placeholders for favorite/watched ports that are not listening right now
/// (`is_active == false`, `pid == 0`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortInfo {
    /// The port number (e.g., 3000, 8080).
    pub port: u16,
    /// Process ID of the owning process, 0 for placeholders.
    pub pid: u32,
    /// Short process name.
    pub process_name: String,
    /// Address the socket is bound to (e.g., "*", "127.0.0.1", "[::1]").
    pub address: String,
    /// Username of the process owner.
    pub user: String,
    /// Full command line of the process.
    pub command: String,
    /// OS specific handle label (lsof FD column, ss fd number).
    pub fd: String,
    /// Whether this record came from the latest scan.
    pub is_active: bool,
}

impl PortInfo {
    /// Create an active record from scan results.
    pub fn active(
        port: u16,
        pid: u32,
        process_name: impl Into<String>,
        address: impl Into<String>,
        user: impl Into<String>,
        command: impl Into<String>,
        fd: impl Into<String>,
    ) -> Self {
        Self {
            port,
            pid,
            process_name: process_name.into(),
            address: address.into(),
            user: user.into(),
            command: command.into(),
            fd: fd.into(),
            is_active: true,
        }
    }

    /// Create an inactive placeholder for a favorited/watched port.
    pub fn inactive(port: u16) -> Self {
        Self {
            port,
            pid: 0,
            process_name: INACTIVE_PROCESS_NAME.to_string(),
            address: "-".to_string(),
            user: "-".to_string(),
            command: String::new(),
            fd: String::new(),
            is_active: false,
        }
    }

    /// Formatted port number for display (e.g., ":3000").
    pub fn display_port(&self) -> String {
        format!(":{}", self.port)
    }

    /// Category of the owning process, derived from `process_name` on every call.
    pub fn process_type(&self) -> ProcessType {
        ProcessType::detect(&self.process_name)
    }

    /// Whether this record points at a real process that can be signalled.
    pub fn is_killable(&self) -> bool {
        self.is_active && self.pid != 0
    }

    /// Case-insensitive search across process name, port, PID, address, user and command.
    pub fn matches_search(&self, query: &str) -> bool {
        if query.is_empty() {
            return true;
        }

        let query = query.to_lowercase();
        self.process_name.to_lowercase().contains(&query)
            || self.port.to_string().contains(&query)
            || self.pid.to_string().contains(&query)
            || self.address.to_lowercase().contains(&query)
            || self.user.to_lowercase().contains(&query)
            || self.command.to_lowercase().contains(&query)
    }
}

impl std::fmt::Display for PortInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_active {
            write!(
                f,
                "{}:{} (PID: {}, Process: {})",
                self.address, self.port, self.pid, self.process_name
            )
        } else {
            write!(f, ":{} ({})", self.port, self.process_name)
        }
    }
}
