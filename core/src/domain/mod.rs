//! Domain layer - Pure business logic and data models.
//!
//! Nothing in here performs I/O: classification, filtering, reconciliation
//! and ordering are all plain functions over values, testable in isolation.

mod filter;
mod overlay;
mod port;
mod process_type;
mod registry;
mod sort;
mod transition;
mod watched;

pub use filter::{filter_ports, PortFilter};
pub use overlay::Overlay;
pub use port::{PortInfo, INACTIVE_PROCESS_NAME};
pub use process_type::ProcessType;
pub use registry::{MergeOutcome, Placeholder, Registry, RegistryEntry};
pub use sort::{present, sort_ports, SortKey};
pub use transition::{Direction, Transition};
pub use watched::WatchedPort;
