//! The merged port registry and its reconciliation.
//!
//! A [`Registry`] is an immutable snapshot: the latest scan plus one inactive
//! placeholder for every favorite or watched port that was not in that scan.
//! It is rebuilt from scratch on every merge rather than patched, so entries
//! that fell out of both the scan and the overlay simply disappear.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use tracing::{debug, trace};

use super::{Overlay, PortInfo, Transition, WatchedPort};

/// Synthesised entry for a favorite/watched port with no listening process.
///
/// The flags record why the placeholder exists at the time of the merge that
/// created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Placeholder {
    pub port: u16,
    pub favorite: bool,
    pub watched: bool,
}

/// One registry slot. A port is either active or a placeholder, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEntry {
    Active(PortInfo),
    Placeholder(Placeholder),
}

impl RegistryEntry {
    pub fn port(&self) -> u16 {
        match self {
            RegistryEntry::Active(info) => info.port,
            RegistryEntry::Placeholder(p) => p.port,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, RegistryEntry::Active(_))
    }

    /// The live record, if this slot has one.
    pub fn as_active(&self) -> Option<&PortInfo> {
        match self {
            RegistryEntry::Active(info) => Some(info),
            RegistryEntry::Placeholder(_) => None,
        }
    }

    /// Unified read view; placeholders render as [`PortInfo::inactive`].
    pub fn to_record(&self) -> PortInfo {
        match self {
            RegistryEntry::Active(info) => info.clone(),
            RegistryEntry::Placeholder(p) => PortInfo::inactive(p.port),
        }
    }
}

/// Result of merging a scan into a registry.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub registry: Registry,
    /// Start/stop events for watched ports, ordered by port.
    pub transitions: Vec<Transition>,
    /// Scan rows dropped because an earlier row already claimed the same port.
    pub collapsed: usize,
}

/// Immutable snapshot of every known port, keyed and ordered by port number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
    entries: BTreeMap<u16, RegistryEntry>,
    generation: u64,
}

impl Registry {
    /// A registry that has never seen a scan (generation 0).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of merges that produced this snapshot.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Merge a fresh scan with the overlay, producing the next snapshot.
    ///
    /// Transitions are computed against `self` only. When `self` is the
    /// generation-0 registry the merge only establishes a baseline and emits
    /// nothing.
    pub fn merge(&self, scan: impl IntoIterator<Item = PortInfo>, overlay: &Overlay) -> MergeOutcome {
        let mut entries = BTreeMap::new();
        let mut collapsed = 0;

        for mut info in scan {
            if info.port == 0 {
                trace!(pid = info.pid, "Skipping scan row without a port");
                continue;
            }
            info.is_active = true;
            match entries.entry(info.port) {
                Entry::Vacant(slot) => {
                    slot.insert(RegistryEntry::Active(info));
                }
                Entry::Occupied(_) => {
                    trace!(port = info.port, pid = info.pid, "Collapsing duplicate scan row");
                    collapsed += 1;
                }
            }
        }

        for port in overlay.tracked_ports() {
            entries.entry(port).or_insert_with(|| {
                RegistryEntry::Placeholder(Placeholder {
                    port,
                    favorite: overlay.is_favorite(port),
                    watched: overlay.is_watching(port),
                })
            });
        }

        let registry = Registry {
            entries,
            generation: self.generation + 1,
        };

        let transitions = if self.generation == 0 {
            Vec::new()
        } else {
            diff_watched(self, &registry, &overlay.watched)
        };

        debug!(
            generation = registry.generation,
            active = registry.active_count(),
            placeholders = registry.placeholder_count(),
            transitions = transitions.len(),
            collapsed,
            "Merged scan into registry"
        );

        MergeOutcome {
            registry,
            transitions,
            collapsed,
        }
    }

    pub fn get(&self, port: u16) -> Option<&RegistryEntry> {
        self.entries.get(&port)
    }

    /// Whether `port` has a live record in this snapshot.
    pub fn is_active(&self, port: u16) -> bool {
        self.active(port).is_some()
    }

    pub fn active(&self, port: u16) -> Option<&PortInfo> {
        self.entries.get(&port).and_then(RegistryEntry::as_active)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.entries.values()
    }

    /// Unified records in port order.
    pub fn records(&self) -> Vec<PortInfo> {
        self.entries.values().map(RegistryEntry::to_record).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.entries.values().filter(|e| e.is_active()).count()
    }

    pub fn placeholder_count(&self) -> usize {
        self.len() - self.active_count()
    }
}

fn diff_watched(previous: &Registry, next: &Registry, watched: &[WatchedPort]) -> Vec<Transition> {
    let mut transitions = Vec::new();

    for w in watched {
        match (previous.active(w.port), next.active(w.port)) {
            (None, Some(now)) if w.notify_on_start => {
                transitions.push(Transition::Started {
                    port: w.port,
                    process_name: now.process_name.clone(),
                });
            }
            (Some(before), None) if w.notify_on_stop => {
                transitions.push(Transition::Stopped {
                    port: w.port,
                    process_name: before.process_name.clone(),
                });
            }
            _ => {}
        }
    }

    transitions.sort_by_key(Transition::port);
    transitions
}
