//! Filter predicate over port records.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{PortInfo, ProcessType, WatchedPort};

/// Filter criteria for port listings.
///
/// Every clause is conjunctive; a clause left at its default is vacuously true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortFilter {
    /// Text to search across port info fields.
    #[serde(default)]
    pub search_text: String,
    /// Minimum port number (inclusive).
    #[serde(default)]
    pub min_port: Option<u16>,
    /// Maximum port number (inclusive).
    #[serde(default)]
    pub max_port: Option<u16>,
    /// Process types to include. An empty set places no restriction.
    #[serde(default = "all_process_types")]
    pub process_types: HashSet<ProcessType>,
    #[serde(default)]
    pub show_only_favorites: bool,
    #[serde(default)]
    pub show_only_watched: bool,
}

fn all_process_types() -> HashSet<ProcessType> {
    ProcessType::ALL.into_iter().collect()
}

impl Default for PortFilter {
    fn default() -> Self {
        Self {
            search_text: String::new(),
            min_port: None,
            max_port: None,
            process_types: all_process_types(),
            show_only_favorites: false,
            show_only_watched: false,
        }
    }
}

impl PortFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// True iff any criterion differs from its default.
    pub fn is_active(&self) -> bool {
        !self.search_text.is_empty()
            || self.min_port.is_some()
            || self.max_port.is_some()
            || self.process_types.len() < ProcessType::ALL.len()
            || self.show_only_favorites
            || self.show_only_watched
    }

    /// Check if a record passes every clause.
    pub fn matches(
        &self,
        port: &PortInfo,
        favorites: &HashSet<u16>,
        watched: &[WatchedPort],
    ) -> bool {
        if !port.matches_search(&self.search_text) {
            return false;
        }
        if self.min_port.is_some_and(|min| port.port < min) {
            return false;
        }
        if self.max_port.is_some_and(|max| port.port > max) {
            return false;
        }
        if !self.process_types.is_empty() && !self.process_types.contains(&port.process_type()) {
            return false;
        }
        if self.show_only_favorites && !favorites.contains(&port.port) {
            return false;
        }
        if self.show_only_watched && !watched.iter().any(|w| w.port == port.port) {
            return false;
        }
        true
    }

    /// Reset all filter criteria to defaults.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn with_search(mut self, text: impl Into<String>) -> Self {
        self.search_text = text.into();
        self
    }

    pub fn with_port_range(mut self, min: Option<u16>, max: Option<u16>) -> Self {
        self.min_port = min;
        self.max_port = max;
        self
    }

    pub fn with_process_types(mut self, types: impl IntoIterator<Item = ProcessType>) -> Self {
        self.process_types = types.into_iter().collect();
        self
    }

    pub fn with_favorites_only(mut self, enabled: bool) -> Self {
        self.show_only_favorites = enabled;
        self
    }

    pub fn with_watched_only(mut self, enabled: bool) -> Self {
        self.show_only_watched = enabled;
        self
    }
}

/// Apply a filter to a list of records, preserving their order.
pub fn filter_ports<'a>(
    ports: impl IntoIterator<Item = &'a PortInfo>,
    filter: &PortFilter,
    favorites: &HashSet<u16>,
    watched: &[WatchedPort],
) -> Vec<PortInfo> {
    ports
        .into_iter()
        .filter(|p| filter.matches(p, favorites, watched))
        .cloned()
        .collect()
}
