//! Fallback for platforms without a scanner implementation.

use crate::domain::PortInfo;
use crate::error::{Error, Result};

use super::Scanner;

pub struct UnsupportedScanner;

impl UnsupportedScanner {
    pub fn new() -> Self {
        Self
    }
}

impl Scanner for UnsupportedScanner {
    async fn scan(&self) -> Result<Vec<PortInfo>> {
        // TODO: Windows support via GetExtendedTcpTable / GetExtendedUdpTable
        Err(Error::UnsupportedPlatform(format!(
            "port scanning is not implemented for {}",
            std::env::consts::OS
        )))
    }
}
