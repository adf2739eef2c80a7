//! Watched port model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A port the user wants start/stop notifications for.
///
/// At most one `WatchedPort` exists per port number; the `id` stays the same
/// when the notification flags are edited.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchedPort {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub port: u16,
    /// Notify when the port goes from inactive to active.
    #[serde(default = "default_true")]
    pub notify_on_start: bool,
    /// Notify when the port goes from active to inactive.
    #[serde(default = "default_true")]
    pub notify_on_stop: bool,
}

fn default_true() -> bool {
    true
}

impl WatchedPort {
    /// Watch `port` with both notifications enabled.
    pub fn new(port: u16) -> Self {
        Self::with_notifications(port, true, true)
    }

    pub fn with_notifications(port: u16, notify_on_start: bool, notify_on_stop: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            port,
            notify_on_start,
            notify_on_stop,
        }
    }

    /// Change the notification flags, keeping the identity.
    pub fn set_notifications(&mut self, notify_on_start: bool, notify_on_stop: bool) {
        self.notify_on_start = notify_on_start;
        self.notify_on_stop = notify_on_stop;
    }
}

impl std::fmt::Display for WatchedPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.notify_on_start, self.notify_on_stop) {
            (true, true) => write!(f, "Port {} (notify: start, stop)", self.port),
            (true, false) => write!(f, "Port {} (notify: start)", self.port),
            (false, true) => write!(f, "Port {} (notify: stop)", self.port),
            (false, false) => write!(f, "Port {} (no notifications)", self.port),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_watched_port_defaults() {
        let wp = WatchedPort::new(3000);
        assert_eq!(wp.port, 3000);
        assert!(wp.notify_on_start);
        assert!(wp.notify_on_stop);
    }

    #[test]
    fn test_set_notifications_keeps_id() {
        let mut wp = WatchedPort::new(8080);
        let id = wp.id;
        wp.set_notifications(false, true);
        assert_eq!(wp.id, id);
        assert!(!wp.notify_on_start);
        assert!(wp.notify_on_stop);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            WatchedPort::new(3000).to_string(),
            "Port 3000 (notify: start, stop)"
        );
        assert_eq!(
            WatchedPort::with_notifications(22, false, false).to_string(),
            "Port 22 (no notifications)"
        );
    }

    #[test]
    fn test_deserialize_missing_fields_use_defaults() {
        let wp: WatchedPort = serde_json::from_str(r#"{"port": 5432}"#).unwrap();
        assert_eq!(wp.port, 5432);
        assert!(wp.notify_on_start && wp.notify_on_stop);
    }
}
