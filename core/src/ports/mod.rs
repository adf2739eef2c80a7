//! Ports layer - Trait definitions (interfaces).
//!
//! The engine talks to the outside world only through these traits.
//! Implementations live in `adapters`; tests substitute in-memory fakes.

mod config;
mod killer;
mod scanner;

pub use config::ConfigRepository;
pub use killer::ProcessKillerPort;
pub use scanner::PortScannerPort;
