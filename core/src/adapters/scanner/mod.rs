//! Port scanner adapters.
//!
//! Platform-specific implementations of the snapshot source. Every scanner
//! returns rows deduplicated by (port, pid) and sorted by port, then pid.

#[cfg(target_os = "macos")]
mod darwin;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(not(any(target_os = "macos", target_os = "linux")))]
mod unsupported;

mod utils;

use tracing::{debug, warn};

use crate::domain::PortInfo;
use crate::error::Result;
use crate::ports::PortScannerPort;

pub use utils::parse_address;

/// The scanner for the current platform.
pub struct PortScanner {
    #[cfg(target_os = "macos")]
    inner: darwin::DarwinScanner,

    #[cfg(target_os = "linux")]
    inner: linux::LinuxScanner,

    #[cfg(not(any(target_os = "macos", target_os = "linux")))]
    inner: unsupported::UnsupportedScanner,
}

impl PortScanner {
    pub fn new() -> Self {
        Self {
            #[cfg(target_os = "macos")]
            inner: darwin::DarwinScanner::new(),

            #[cfg(target_os = "linux")]
            inner: linux::LinuxScanner::new(),

            #[cfg(not(any(target_os = "macos", target_os = "linux")))]
            inner: unsupported::UnsupportedScanner::new(),
        }
    }
}

impl Default for PortScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl PortScannerPort for PortScanner {
    async fn scan(&self) -> Result<Vec<PortInfo>> {
        debug!("Scanning listening ports");
        match self.inner.scan().await {
            Ok(ports) => {
                debug!(count = ports.len(), "Scan finished");
                Ok(ports)
            }
            Err(e) => {
                warn!(error = %e, "Scan failed");
                Err(e)
            }
        }
    }
}

/// Internal trait for platform-specific implementations.
trait Scanner: Send + Sync {
    fn scan(&self) -> impl std::future::Future<Output = Result<Vec<PortInfo>>> + Send;
}
