//! Port snapshot source (interface).

use crate::domain::PortInfo;
use crate::error::Result;

/// Source of port snapshots.
///
/// Implementations report every locally listening socket with its owning
/// process. An empty `Ok` means nothing is listening; a probe that could not
/// run must return `Err` so callers can keep their last good state.
pub trait PortScannerPort: Send + Sync {
    /// Scan all listening ports once.
    fn scan(&self) -> impl std::future::Future<Output = Result<Vec<PortInfo>>> + Send;
}
