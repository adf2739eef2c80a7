//! User intent layered over scans: favorite ports and watched ports.

use std::collections::{BTreeSet, HashSet};

use super::WatchedPort;

/// The favorite set and watched set as one value.
///
/// Both are keyed by port number and independent of whether the port is
/// currently listening.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overlay {
    pub favorites: HashSet<u16>,
    pub watched: Vec<WatchedPort>,
}

impl Overlay {
    /// Port 0 entries are dropped.
    pub fn new(mut favorites: HashSet<u16>, watched: Vec<WatchedPort>) -> Self {
        favorites.remove(&0);
        let mut overlay = Self {
            favorites,
            watched: Vec::with_capacity(watched.len()),
        };
        // first entry per port wins
        for wp in watched {
            if wp.port != 0 && !overlay.is_watching(wp.port) {
                overlay.watched.push(wp);
            }
        }
        overlay
    }

    pub fn is_favorite(&self, port: u16) -> bool {
        self.favorites.contains(&port)
    }

    pub fn is_watching(&self, port: u16) -> bool {
        self.watched.iter().any(|w| w.port == port)
    }

    pub fn watched_port(&self, port: u16) -> Option<&WatchedPort> {
        self.watched.iter().find(|w| w.port == port)
    }

    /// Flip favorite membership. Returns the new membership.
    pub fn toggle_favorite(&mut self, port: u16) -> bool {
        if self.favorites.remove(&port) {
            false
        } else {
            self.favorites.insert(port);
            true
        }
    }

    /// Create a watch with both notifications on, or remove the existing one.
    /// Returns whether the port is watched afterwards.
    pub fn toggle_watch(&mut self, port: u16) -> bool {
        if self.is_watching(port) {
            self.watched.retain(|w| w.port != port);
            false
        } else {
            self.watched.push(WatchedPort::new(port));
            true
        }
    }

    /// Ports that need a placeholder when they are not in the scan.
    pub fn tracked_ports(&self) -> BTreeSet<u16> {
        self.favorites
            .iter()
            .copied()
            .chain(self.watched.iter().map(|w| w.port))
            .filter(|&port| port != 0)
            .collect()
    }

    /// Sort rank used by the "actions" ordering: favorite 2, watched 1, neither 0.
    pub fn priority(&self, port: u16) -> u8 {
        if self.is_favorite(port) {
            2
        } else if self.is_watching(port) {
            1
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_favorite_twice_restores_state() {
        let mut overlay = Overlay::default();
        overlay.favorites.insert(22);
        let original = overlay.clone();

        assert!(overlay.toggle_favorite(3000));
        assert!(overlay.is_favorite(3000));
        assert!(!overlay.toggle_favorite(3000));
        assert_eq!(overlay, original);
    }

    #[test]
    fn test_toggle_watch_creates_with_defaults_and_removes() {
        let mut overlay = Overlay::default();
        assert!(overlay.toggle_watch(5432));
        let wp = overlay.watched_port(5432).unwrap();
        assert!(wp.notify_on_start && wp.notify_on_stop);
        assert!(!overlay.is_favorite(5432));

        assert!(!overlay.toggle_watch(5432));
        assert!(overlay.watched.is_empty());
    }

    #[test]
    fn test_new_drops_duplicate_watches() {
        let first = WatchedPort::with_notifications(80, true, false);
        let overlay = Overlay::new(
            HashSet::new(),
            vec![first.clone(), WatchedPort::new(80), WatchedPort::new(443)],
        );
        assert_eq!(overlay.watched.len(), 2);
        assert_eq!(overlay.watched_port(80), Some(&first));
    }

    #[test]
    fn test_tracked_ports_union() {
        let overlay = Overlay::new(
            [3000, 8080].into_iter().collect(),
            vec![WatchedPort::new(8080), WatchedPort::new(5432)],
        );
        let tracked: Vec<u16> = overlay.tracked_ports().into_iter().collect();
        assert_eq!(tracked, vec![3000, 5432, 8080]);
    }

    #[test]
    fn test_priority() {
        let overlay = Overlay::new(
            [3000].into_iter().collect(),
            vec![WatchedPort::new(3000), WatchedPort::new(5432)],
        );
        assert_eq!(overlay.priority(3000), 2);
        assert_eq!(overlay.priority(5432), 1);
        assert_eq!(overlay.priority(80), 0);
    }

    #[test]
    fn test_port_zero_is_never_tracked() {
        let overlay = Overlay::new(
            [0, 22].into_iter().collect(),
            vec![WatchedPort::new(0), WatchedPort::new(80)],
        );
        assert!(!overlay.is_favorite(0));
        assert!(!overlay.is_watching(0));

        let mut raw = overlay.clone();
        raw.favorites.insert(0);
        assert_eq!(raw.tracked_ports().into_iter().collect::<Vec<_>>(), vec![22, 80]);
    }
}
