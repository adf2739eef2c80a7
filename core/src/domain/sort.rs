//! Ordering of filtered registry records for presentation.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::{Overlay, PortFilter, PortInfo, Registry};

/// Column to order port listings by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    #[default]
    Port,
    Process,
    Pid,
    /// Process category, by display name.
    Type,
    Address,
    User,
    /// Favorite first, then watched, then the rest; port ascending within a rank.
    Actions,
}

impl SortKey {
    pub const ALL: [SortKey; 7] = [
        SortKey::Port,
        SortKey::Process,
        SortKey::Pid,
        SortKey::Type,
        SortKey::Address,
        SortKey::User,
        SortKey::Actions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Port => "port",
            SortKey::Process => "process",
            SortKey::Pid => "pid",
            SortKey::Type => "type",
            SortKey::Address => "address",
            SortKey::User => "user",
            SortKey::Actions => "actions",
        }
    }

    fn compare(&self, a: &PortInfo, b: &PortInfo, overlay: &Overlay) -> Ordering {
        match self {
            SortKey::Port => a.port.cmp(&b.port),
            SortKey::Process => compare_text(&a.process_name, &b.process_name),
            SortKey::Pid => a.pid.cmp(&b.pid),
            SortKey::Type => a
                .process_type()
                .display_name()
                .cmp(b.process_type().display_name()),
            SortKey::Address => compare_text(&a.address, &b.address),
            SortKey::User => compare_text(&a.user, &b.user),
            SortKey::Actions => overlay
                .priority(b.port)
                .cmp(&overlay.priority(a.port))
                .then_with(|| a.port.cmp(&b.port)),
        }
    }
}

impl std::fmt::Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.to_lowercase();
        SortKey::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown sort key: {}", s))
    }
}

/// Case-insensitive text ordering; strings differing only in case compare equal.
fn compare_text(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

/// Sort records in place. `ascending == false` reverses the whole comparator,
/// including the actions tie-break. The sort is stable, so equal keys keep
/// their incoming order.
pub fn sort_ports(ports: &mut [PortInfo], key: SortKey, ascending: bool, overlay: &Overlay) {
    ports.sort_by(|a, b| {
        let ordering = key.compare(a, b, overlay);
        if ascending {
            ordering
        } else {
            ordering.reverse()
        }
    });
}

/// Filter the registry and order the result for display.
pub fn present(
    registry: &Registry,
    filter: &PortFilter,
    overlay: &Overlay,
    key: SortKey,
    ascending: bool,
) -> Vec<PortInfo> {
    let records = registry.records();
    let mut ports = super::filter_ports(&records, filter, &overlay.favorites, &overlay.watched);
    sort_ports(&mut ports, key, ascending, overlay);
    ports
}
