//! Adapters layer - External system implementations.
//!
//! Concrete implementations of the traits in `ports`: OS port scanning,
//! process signalling and JSON config persistence.

pub mod config;
pub mod killer;
pub mod scanner;

pub use config::{Config, ConfigStore, DEFAULT_REFRESH_INTERVAL_SECS};
pub use killer::ProcessKiller;
pub use scanner::PortScanner;
