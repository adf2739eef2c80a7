//! Watched-port lifecycle events.

use serde::{Deserialize, Serialize};

/// Which way a watched port flipped between two consecutive scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Direction {
    Started,
    Stopped,
}

/// A watched port changed activity between two registry snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Transition {
    /// Port became active (process started listening).
    Started { port: u16, process_name: String },
    /// Port became inactive. `process_name` is what was listening before.
    Stopped { port: u16, process_name: String },
}

impl Transition {
    pub fn port(&self) -> u16 {
        match self {
            Transition::Started { port, .. } | Transition::Stopped { port, .. } => *port,
        }
    }

    pub fn process_name(&self) -> &str {
        match self {
            Transition::Started { process_name, .. } | Transition::Stopped { process_name, .. } => {
                process_name
            }
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            Transition::Started { .. } => Direction::Started,
            Transition::Stopped { .. } => Direction::Stopped,
        }
    }
}

impl std::fmt::Display for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Transition::Started { port, process_name } => {
                write!(f, "Port {} is now active ({})", port, process_name)
            }
            Transition::Stopped { port, process_name } => {
                write!(f, "Port {} stopped ({})", port, process_name)
            }
        }
    }
}
