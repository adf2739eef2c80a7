//! Overlay persistence (interface).

use std::collections::HashSet;

use crate::domain::WatchedPort;
use crate::error::Result;

/// Port for persisting user intent: favorites, watched ports and settings.
///
/// The engine always writes whole sets, so implementations only need
/// load/replace semantics.
pub trait ConfigRepository: Send + Sync {
    /// Get all favorite port numbers.
    fn get_favorites(&self) -> impl std::future::Future<Output = Result<HashSet<u16>>> + Send;

    /// Replace the stored favorite set.
    fn set_favorites(
        &self,
        favorites: &HashSet<u16>,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Get all watched ports.
    fn get_watched_ports(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<WatchedPort>>> + Send;

    /// Replace the stored watched ports.
    fn set_watched_ports(
        &self,
        watched: &[WatchedPort],
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Get the refresh interval in seconds.
    fn get_refresh_interval(&self) -> impl std::future::Future<Output = Result<u64>> + Send;

    /// Set the refresh interval in seconds.
    fn set_refresh_interval(
        &self,
        interval: u64,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}
