//! PortWatch Core Library
//!
//! Local port monitoring with favorites, watched-port notifications and
//! process termination. Provides functionality to:
//! - Scan listening TCP and UDP ports and attribute them to processes
//! - Reconcile consecutive scans with the user's favorite and watched ports
//! - Filter and sort the merged view
//! - Kill processes by PID (gracefully or forcefully)
//!
//! # Architecture
//! This library follows hexagonal architecture (ports & adapters):
//! - `domain`: Pure business logic and data models
//! - `ports`: Trait definitions (interfaces)
//! - `adapters`: External system implementations
//! - `engine`: Stateful reconciliation engine tying them together
//!
//! # Platform Support
//! - macOS: Uses `lsof` and `ps` commands
//! - Linux: Uses `ss` and `ps` commands
//! - Other platforms: scanning reports `UnsupportedPlatform`

pub mod adapters;
pub mod domain;
pub mod engine;
pub mod error;
pub mod ports;

// Re-export domain types (primary API)
pub use domain::{
    filter_ports, present, sort_ports, Direction, MergeOutcome, Overlay, Placeholder, PortFilter,
    PortInfo, ProcessType, Registry, RegistryEntry, SortKey, Transition, WatchedPort,
};

// Re-export other commonly used types
pub use adapters::{Config, ConfigStore, PortScanner, ProcessKiller};
pub use engine::{EngineEvent, MergeSummary, MonitorHandle, PortWatchEngine};
pub use error::{Error, Result, TerminateError};
pub use ports::{ConfigRepository, PortScannerPort, ProcessKillerPort};

/// Engine wired to the platform scanner, the signal-based killer and the
/// JSON config file.
pub type SystemEngine = PortWatchEngine<PortScanner, ProcessKiller, ConfigStore>;
