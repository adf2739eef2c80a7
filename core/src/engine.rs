//! PortWatch Engine - Central state management and auto-refresh.
//!
//! The engine owns the merged port registry and the user overlay (favorites
//! and watched ports). Reads are cheap snapshots: the registry lives
//! behind an `Arc` that every merge swaps out whole. Writers (merges and
//! overlay mutations) are serialised by one async gate so each sees a
//! consistent overlay, and overlay changes are persisted before they become
//! visible.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::{broadcast, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::domain::{
    self, MergeOutcome, Overlay, PortFilter, PortInfo, Registry, SortKey, Transition, WatchedPort,
};
use crate::error::{Error, Result, TerminateError};
use crate::ports::{ConfigRepository, PortScannerPort, ProcessKillerPort};

/// Shortest allowed refresh interval.
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(1);

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Transitions kept for [`PortWatchEngine::take_notifications`]; older ones
/// are dropped first.
pub const MAX_PENDING_NOTIFICATIONS: usize = EVENT_CHANNEL_CAPACITY;

/// Change notifications published by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum EngineEvent {
    /// A merge produced a new registry snapshot.
    RegistryUpdated { generation: u64 },
    /// A watched port started or stopped.
    Transition(Transition),
    /// A scan failed; the previous registry is still current.
    ScanFailed { message: String },
    /// Favorites or watched ports changed.
    OverlayChanged,
}

/// Counts describing one completed refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeSummary {
    pub generation: u64,
    pub active: usize,
    pub placeholders: usize,
    pub transitions: usize,
    pub collapsed: usize,
}

impl From<&MergeOutcome> for MergeSummary {
    fn from(outcome: &MergeOutcome) -> Self {
        Self {
            generation: outcome.registry.generation(),
            active: outcome.registry.active_count(),
            placeholders: outcome.registry.placeholder_count(),
            transitions: outcome.transitions.len(),
            collapsed: outcome.collapsed,
        }
    }
}

/// Favorites and watches need a real port number.
fn check_port(port: u16) -> Result<()> {
    if port == 0 {
        return Err(Error::InvalidPort(port));
    }
    Ok(())
}

/// Which overlay sets a mutation must write back.
#[derive(Debug, Clone, Copy)]
enum Persist {
    Favorites,
    Watched,
    Both,
}

/// The port reconciliation engine.
///
/// # Usage Pattern
/// Call [`refresh`](Self::refresh) periodically, or hand an `Arc` of the
/// engine to [`spawn_monitor`](Self::spawn_monitor). Between refreshes read
/// cached state through [`present`](Self::present), [`query`](Self::query)
/// and friends, or react to [`subscribe`](Self::subscribe) events.
pub struct PortWatchEngine<S, K, C> {
    scanner: S,
    killer: K,
    config: C,

    registry: RwLock<Arc<Registry>>,
    overlay: RwLock<Overlay>,
    pending: RwLock<Vec<Transition>>,
    last_scan_error: RwLock<Option<String>>,

    // serialises scans so a new one starts only after the previous merge
    refresh_gate: Mutex<()>,
    // serialises merges, overlay mutations and config writes
    write_gate: Mutex<()>,

    events: broadcast::Sender<EngineEvent>,
    refresh_interval_secs: AtomicU64,
}

impl<S, K, C> PortWatchEngine<S, K, C>
where
    S: PortScannerPort,
    K: ProcessKillerPort,
    C: ConfigRepository,
{
    /// Create an engine, loading favorites, watched ports and the refresh
    /// interval from `config`. The registry starts empty at generation 0.
    pub async fn load(scanner: S, killer: K, config: C) -> Result<Self> {
        let favorites = config.get_favorites().await?;
        let watched = config.get_watched_ports().await?;
        let interval = config
            .get_refresh_interval()
            .await?
            .max(MIN_REFRESH_INTERVAL.as_secs());

        debug!(
            favorites = favorites.len(),
            watched = watched.len(),
            interval_secs = interval,
            "Loaded overlay"
        );

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            scanner,
            killer,
            config,
            registry: RwLock::new(Arc::new(Registry::empty())),
            overlay: RwLock::new(Overlay::new(favorites, watched)),
            pending: RwLock::new(Vec::new()),
            last_scan_error: RwLock::new(None),
            refresh_gate: Mutex::new(()),
            write_gate: Mutex::new(()),
            events,
            refresh_interval_secs: AtomicU64::new(interval),
        })
    }

    // MARK: - Refresh

    /// Scan once and merge the result.
    ///
    /// On scanner failure the previous registry stays current, the message is
    /// kept in [`last_scan_error`](Self::last_scan_error), a
    /// [`EngineEvent::ScanFailed`] is broadcast and `Error::ScanFailure` is
    /// returned. An empty successful scan is merged like any other.
    pub async fn refresh(&self) -> Result<MergeSummary> {
        let _refresh = self.refresh_gate.lock().await;

        let scan = match self.scanner.scan().await {
            Ok(ports) => ports,
            Err(e) => {
                let message = match e {
                    Error::ScanFailure(message) => message,
                    other => other.to_string(),
                };
                warn!(error = %message, "Scan failed, keeping previous registry");
                *self.last_scan_error.write() = Some(message.clone());
                let _ = self.events.send(EngineEvent::ScanFailed {
                    message: message.clone(),
                });
                return Err(Error::ScanFailure(message));
            }
        };

        *self.last_scan_error.write() = None;
        let outcome = self.merge(scan).await;
        Ok(MergeSummary::from(&outcome))
    }

    /// Merge a scan into the current registry and publish the result.
    ///
    /// Never fails. Transitions are queued for
    /// [`take_notifications`](Self::take_notifications) and broadcast.
    pub async fn merge(&self, scan: Vec<PortInfo>) -> MergeOutcome {
        let _gate = self.write_gate.lock().await;

        let outcome = {
            let previous = self.registry();
            let overlay = self.overlay.read();
            previous.merge(scan, &overlay)
        };

        *self.registry.write() = Arc::new(outcome.registry.clone());
        if !outcome.transitions.is_empty() {
            let mut pending = self.pending.write();
            pending.extend(outcome.transitions.iter().cloned());
            let overflow = pending.len().saturating_sub(MAX_PENDING_NOTIFICATIONS);
            if overflow > 0 {
                pending.drain(..overflow);
                debug!(dropped = overflow, "Dropped oldest pending notifications");
            }
        }

        let _ = self.events.send(EngineEvent::RegistryUpdated {
            generation: outcome.registry.generation(),
        });
        for transition in &outcome.transitions {
            info!(
                port = transition.port(),
                process = transition.process_name(),
                direction = ?transition.direction(),
                "Watched port changed state"
            );
            let _ = self.events.send(EngineEvent::Transition(transition.clone()));
        }

        outcome
    }

    // MARK: - Registry Access

    /// The current registry snapshot. Later merges do not affect it.
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.read().clone()
    }

    /// Every record in port order, placeholders included.
    pub fn ports(&self) -> Vec<PortInfo> {
        self.registry().records()
    }

    /// Records matching `filter`, in port order.
    pub fn query(&self, filter: &PortFilter) -> Vec<PortInfo> {
        let records = self.ports();
        let overlay = self.overlay.read();
        domain::filter_ports(&records, filter, &overlay.favorites, &overlay.watched)
    }

    /// Records matching `filter`, ordered by `key`.
    pub fn present(&self, filter: &PortFilter, key: SortKey, ascending: bool) -> Vec<PortInfo> {
        let registry = self.registry();
        let overlay = self.overlay.read();
        domain::present(&registry, filter, &overlay, key, ascending)
    }

    /// Check if a specific port is active in the current snapshot.
    pub fn is_port_active(&self, port: u16) -> bool {
        self.registry().is_active(port)
    }

    /// Message of the most recent failed scan, cleared by the next good one.
    pub fn last_scan_error(&self) -> Option<String> {
        self.last_scan_error.read().clone()
    }

    // MARK: - Notifications

    /// Receive engine events from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    /// Get and clear queued transitions.
    pub fn take_notifications(&self) -> Vec<Transition> {
        std::mem::take(&mut *self.pending.write())
    }

    pub fn has_pending_notifications(&self) -> bool {
        !self.pending.read().is_empty()
    }

    // MARK: - Favorites & Watched Ports

    pub fn overlay(&self) -> Overlay {
        self.overlay.read().clone()
    }

    pub fn favorites(&self) -> HashSet<u16> {
        self.overlay.read().favorites.clone()
    }

    pub fn watched_ports(&self) -> Vec<WatchedPort> {
        self.overlay.read().watched.clone()
    }

    pub fn is_favorite(&self, port: u16) -> bool {
        self.overlay.read().is_favorite(port)
    }

    pub fn is_watching(&self, port: u16) -> bool {
        self.overlay.read().is_watching(port)
    }

    /// Flip favorite status. Returns whether `port` is a favorite afterwards.
    pub async fn toggle_favorite(&self, port: u16) -> Result<bool> {
        check_port(port)?;
        self.mutate_overlay(Persist::Favorites, |overlay| overlay.toggle_favorite(port))
            .await
    }

    /// Flip watch status; new watches notify on start and stop.
    /// Returns whether `port` is watched afterwards.
    pub async fn toggle_watch(&self, port: u16) -> Result<bool> {
        check_port(port)?;
        self.mutate_overlay(Persist::Watched, |overlay| overlay.toggle_watch(port))
            .await
    }

    /// Returns false if `port` already was a favorite.
    pub async fn add_favorite(&self, port: u16) -> Result<bool> {
        check_port(port)?;
        self.mutate_overlay(Persist::Favorites, |overlay| overlay.favorites.insert(port))
            .await
    }

    /// Returns false if `port` was not a favorite.
    pub async fn remove_favorite(&self, port: u16) -> Result<bool> {
        self.mutate_overlay(Persist::Favorites, |overlay| overlay.favorites.remove(&port))
            .await
    }

    /// Start watching `port`. Returns false, changing nothing, if it is
    /// already watched.
    pub async fn add_watched_port(
        &self,
        port: u16,
        notify_on_start: bool,
        notify_on_stop: bool,
    ) -> Result<bool> {
        check_port(port)?;
        self.mutate_overlay(Persist::Watched, |overlay| {
            if overlay.is_watching(port) {
                return false;
            }
            overlay.watched.push(WatchedPort::with_notifications(
                port,
                notify_on_start,
                notify_on_stop,
            ));
            true
        })
        .await
    }

    /// Returns false if `port` was not watched.
    pub async fn remove_watched_port(&self, port: u16) -> Result<bool> {
        self.mutate_overlay(Persist::Watched, |overlay| {
            let before = overlay.watched.len();
            overlay.watched.retain(|w| w.port != port);
            overlay.watched.len() != before
        })
        .await
    }

    /// Change the notification flags of an existing watch, keeping its id.
    /// Returns false if `port` is not watched.
    pub async fn update_watched_port(
        &self,
        port: u16,
        notify_on_start: bool,
        notify_on_stop: bool,
    ) -> Result<bool> {
        self.mutate_overlay(Persist::Watched, |overlay| {
            match overlay.watched.iter_mut().find(|w| w.port == port) {
                Some(watched) => {
                    watched.set_notifications(notify_on_start, notify_on_stop);
                    true
                }
                None => false,
            }
        })
        .await
    }

    /// Drop both favorite and watch status for `port`.
    ///
    /// Its placeholder disappears with the next merge. Returns false if the
    /// port was neither.
    pub async fn remove_from_list(&self, port: u16) -> Result<bool> {
        self.mutate_overlay(Persist::Both, |overlay| {
            let was_favorite = overlay.favorites.remove(&port);
            let before = overlay.watched.len();
            overlay.watched.retain(|w| w.port != port);
            was_favorite || overlay.watched.len() != before
        })
        .await
    }

    /// Re-read favorites, watched ports and the refresh interval from the
    /// config repository, replacing the in-memory copies.
    pub async fn reload_config(&self) -> Result<()> {
        let _gate = self.write_gate.lock().await;

        let favorites = self.config.get_favorites().await?;
        let watched = self.config.get_watched_ports().await?;
        let interval = self.config.get_refresh_interval().await?;

        *self.overlay.write() = Overlay::new(favorites, watched);
        self.refresh_interval_secs.store(
            interval.max(MIN_REFRESH_INTERVAL.as_secs()),
            Ordering::SeqCst,
        );
        debug!("Reloaded config");
        let _ = self.events.send(EngineEvent::OverlayChanged);
        Ok(())
    }

    /// Apply `apply` to a copy of the overlay, persist the touched sets and
    /// only then publish the copy. A failed write leaves the overlay as it
    /// was.
    async fn mutate_overlay<T>(
        &self,
        persist: Persist,
        apply: impl FnOnce(&mut Overlay) -> T,
    ) -> Result<T> {
        let _gate = self.write_gate.lock().await;

        let current = self.overlay();
        let mut next = current.clone();
        let result = apply(&mut next);
        if next == current {
            return Ok(result);
        }

        match persist {
            Persist::Favorites => self.config.set_favorites(&next.favorites).await?,
            Persist::Watched => self.config.set_watched_ports(&next.watched).await?,
            Persist::Both => {
                self.config.set_favorites(&next.favorites).await?;
                self.config.set_watched_ports(&next.watched).await?;
            }
        }

        *self.overlay.write() = next;
        let _ = self.events.send(EngineEvent::OverlayChanged);
        Ok(result)
    }

    // MARK: - Process Management

    /// Terminate the process behind `record` gracefully: SIGTERM, a grace
    /// period, then SIGKILL if it is still running.
    ///
    /// The registry is not touched; the next merge reflects the exit.
    pub async fn terminate(&self, record: &PortInfo) -> std::result::Result<(), TerminateError> {
        self.kill(record, false).await
    }

    /// Terminate the process behind `record` with SIGKILL straight away.
    pub async fn force_terminate(
        &self,
        record: &PortInfo,
    ) -> std::result::Result<(), TerminateError> {
        self.kill(record, true).await
    }

    async fn kill(&self, record: &PortInfo, force: bool) -> std::result::Result<(), TerminateError> {
        if !record.is_active {
            return Err(TerminateError::InvalidTarget {
                port: record.port,
                pid: record.pid,
                reason: "port is not active",
            });
        }
        if record.pid == 0 {
            return Err(TerminateError::InvalidTarget {
                port: record.port,
                pid: record.pid,
                reason: "record has no process",
            });
        }

        info!(
            port = record.port,
            pid = record.pid,
            process = %record.process_name,
            force = force,
            "Terminating process"
        );

        let gone = self.killer.kill(record.pid, force).await.map_err(|e| {
            warn!(pid = record.pid, error = %e, "Kill failed");
            e
        })?;

        if !gone || self.killer.is_running(record.pid) {
            warn!(pid = record.pid, "Process survived termination");
            return Err(Error::KillFailed {
                pid: record.pid,
                reason: "process is still running".to_string(),
            }
            .into());
        }

        Ok(())
    }

    // MARK: - Refresh Interval

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.load(Ordering::SeqCst))
    }

    /// Persist and apply a new refresh interval, rounded down to whole
    /// seconds and clamped to [`MIN_REFRESH_INTERVAL`].
    pub async fn set_refresh_interval(&self, interval: Duration) -> Result<Duration> {
        let secs = interval.as_secs().max(MIN_REFRESH_INTERVAL.as_secs());

        let _gate = self.write_gate.lock().await;
        self.config.set_refresh_interval(secs).await?;
        self.refresh_interval_secs.store(secs, Ordering::SeqCst);

        debug!(interval_secs = secs, "Refresh interval updated");
        Ok(Duration::from_secs(secs))
    }
}

impl<S, K, C> PortWatchEngine<S, K, C>
where
    S: PortScannerPort + 'static,
    K: ProcessKillerPort + 'static,
    C: ConfigRepository + 'static,
{
    /// Run `refresh` then sleep for the refresh interval, until stopped.
    ///
    /// A scan only starts after the previous refresh returned. Failed scans
    /// are reported through events and do not stop the loop.
    pub fn spawn_monitor(self: Arc<Self>) -> MonitorHandle {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            info!(interval = ?self.refresh_interval(), "Monitor started");
            loop {
                if let Err(e) = self.refresh().await {
                    debug!(error = %e, "Refresh failed");
                }

                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = sleep(self.refresh_interval()) => {}
                }
            }
            info!("Monitor stopped");
        });

        MonitorHandle {
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }
}

/// Handle to a running monitor task. Dropping it aborts the task.
pub struct MonitorHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl MonitorHandle {
    /// Stop after the refresh in progress, if any, and wait for the task.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "Monitor task ended abnormally");
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicBool;

    use parking_lot::Mutex as SyncMutex;
    use tokio::time::timeout;
    use tokio_test::{assert_err, assert_ok};

    use crate::domain::RegistryEntry;

    /// Scanner that replays scripted results, then reports nothing listening.
    #[derive(Default)]
    struct ScriptedScanner {
        results: SyncMutex<VecDeque<Result<Vec<PortInfo>>>>,
    }

    impl ScriptedScanner {
        fn push(&self, result: Result<Vec<PortInfo>>) {
            self.results.lock().push_back(result);
        }
    }

    impl PortScannerPort for ScriptedScanner {
        async fn scan(&self) -> Result<Vec<PortInfo>> {
            self.results.lock().pop_front().unwrap_or(Ok(Vec::new()))
        }
    }

    #[derive(Debug, Clone, Copy, Default, PartialEq)]
    enum KillBehavior {
        #[default]
        Exits,
        Survives,
        Denied,
        Gone,
    }

    #[derive(Default)]
    struct RecordingKiller {
        calls: SyncMutex<Vec<(u32, bool)>>,
        behavior: KillBehavior,
    }

    impl ProcessKillerPort for RecordingKiller {
        async fn kill(&self, pid: u32, force: bool) -> Result<bool> {
            self.calls.lock().push((pid, force));
            match self.behavior {
                KillBehavior::Exits => Ok(true),
                KillBehavior::Survives => Ok(false),
                KillBehavior::Denied => Err(Error::PermissionDenied(format!(
                    "not allowed to signal process {}",
                    pid
                ))),
                KillBehavior::Gone => Err(Error::ProcessNotFound(pid)),
            }
        }

        async fn kill_gracefully(&self, pid: u32) -> Result<bool> {
            self.kill(pid, false).await
        }

        fn is_running(&self, _pid: u32) -> bool {
            self.behavior == KillBehavior::Survives
        }
    }

    #[derive(Default)]
    struct MemoryConfig {
        favorites: SyncMutex<HashSet<u16>>,
        watched: SyncMutex<Vec<WatchedPort>>,
        interval: AtomicU64,
        fail_writes: AtomicBool,
    }

    impl MemoryConfig {
        fn check_writable(&self) -> Result<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                Err(Error::Config("disk full".to_string()))
            } else {
                Ok(())
            }
        }
    }

    impl ConfigRepository for MemoryConfig {
        async fn get_favorites(&self) -> Result<HashSet<u16>> {
            Ok(self.favorites.lock().clone())
        }

        async fn set_favorites(&self, favorites: &HashSet<u16>) -> Result<()> {
            self.check_writable()?;
            *self.favorites.lock() = favorites.clone();
            Ok(())
        }

        async fn get_watched_ports(&self) -> Result<Vec<WatchedPort>> {
            Ok(self.watched.lock().clone())
        }

        async fn set_watched_ports(&self, watched: &[WatchedPort]) -> Result<()> {
            self.check_writable()?;
            *self.watched.lock() = watched.to_vec();
            Ok(())
        }

        async fn get_refresh_interval(&self) -> Result<u64> {
            Ok(self.interval.load(Ordering::SeqCst))
        }

        async fn set_refresh_interval(&self, interval: u64) -> Result<()> {
            self.check_writable()?;
            self.interval.store(interval, Ordering::SeqCst);
            Ok(())
        }
    }

    type TestEngine = PortWatchEngine<ScriptedScanner, RecordingKiller, MemoryConfig>;

    async fn engine_with(config: MemoryConfig, killer: RecordingKiller) -> TestEngine {
        PortWatchEngine::load(ScriptedScanner::default(), killer, config)
            .await
            .unwrap()
    }

    async fn engine() -> TestEngine {
        engine_with(MemoryConfig::default(), RecordingKiller::default()).await
    }

    fn live(port: u16, pid: u32, name: &str) -> PortInfo {
        PortInfo::active(port, pid, name, "127.0.0.1", "dev", name, "")
    }

    async fn refresh_with(engine: &TestEngine, scan: Vec<PortInfo>) -> MergeSummary {
        engine.scanner.push(Ok(scan));
        engine.refresh().await.unwrap()
    }

    fn drain(rx: &mut broadcast::Receiver<EngineEvent>) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_load_reads_overlay_and_clamps_interval() {
        let config = MemoryConfig::default();
        config.favorites.lock().insert(3000);
        config.watched.lock().push(WatchedPort::new(5432));
        config.interval.store(0, Ordering::SeqCst);

        let engine = engine_with(config, RecordingKiller::default()).await;
        assert!(engine.is_favorite(3000));
        assert!(engine.is_watching(5432));
        assert_eq!(engine.refresh_interval(), MIN_REFRESH_INTERVAL);
        assert_eq!(engine.registry().generation(), 0);
    }

    #[tokio::test]
    async fn test_second_scan_replaces_first_and_keeps_placeholders() {
        let engine = engine().await;
        engine.add_favorite(9000).await.unwrap();
        engine.add_watched_port(5432, true, true).await.unwrap();

        refresh_with(&engine, vec![live(3000, 10, "node"), live(8080, 11, "java")]).await;
        let summary = refresh_with(&engine, vec![live(8080, 11, "java"), live(5432, 12, "postgres")]).await;

        assert_eq!(summary.generation, 2);
        assert_eq!(summary.active, 2);
        assert_eq!(summary.placeholders, 1);

        let ports: Vec<(u16, bool)> = engine.ports().iter().map(|p| (p.port, p.is_active)).collect();
        assert_eq!(ports, vec![(5432, true), (8080, true), (9000, false)]);
        assert!(!engine.is_port_active(3000));
    }

    #[tokio::test]
    async fn test_watched_port_start_is_notified_once() {
        let engine = engine().await;
        engine.add_watched_port(8080, true, false).await.unwrap();

        // baseline
        refresh_with(&engine, vec![]).await;
        assert!(!engine.has_pending_notifications());

        let mut rx = engine.subscribe();
        let summary = refresh_with(&engine, vec![live(8080, 42, "nginx")]).await;
        assert_eq!(summary.transitions, 1);

        let events = drain(&mut rx);
        assert_eq!(
            events,
            vec![
                EngineEvent::RegistryUpdated { generation: 2 },
                EngineEvent::Transition(Transition::Started {
                    port: 8080,
                    process_name: "nginx".to_string(),
                }),
            ]
        );

        assert_eq!(engine.take_notifications().len(), 1);
        assert!(!engine.has_pending_notifications());

        // notifyOnStop is off
        refresh_with(&engine, vec![]).await;
        assert!(engine.take_notifications().is_empty());
    }

    #[tokio::test]
    async fn test_pending_notifications_keep_only_the_newest() {
        let engine = engine().await;
        engine.add_watched_port(8080, true, true).await.unwrap();
        refresh_with(&engine, vec![]).await;

        let flips = MAX_PENDING_NOTIFICATIONS + 10;
        for i in 0..flips {
            let scan = if i % 2 == 0 {
                vec![live(8080, i as u32 + 1, "node")]
            } else {
                vec![]
            };
            refresh_with(&engine, scan).await;
        }

        let pending = engine.take_notifications();
        assert_eq!(pending.len(), MAX_PENDING_NOTIFICATIONS);
        // the last flip (odd index) stopped the port
        assert_eq!(
            pending.last(),
            Some(&Transition::Stopped {
                port: 8080,
                process_name: "node".to_string(),
            })
        );
        assert!(!engine.has_pending_notifications());
    }

    #[tokio::test]
    async fn test_first_refresh_is_a_silent_baseline() {
        let engine = engine().await;
        engine.toggle_watch(3000).await.unwrap();

        let summary = refresh_with(&engine, vec![live(3000, 1, "node")]).await;
        assert_eq!(summary.transitions, 0);
        assert!(engine.take_notifications().is_empty());
    }

    #[tokio::test]
    async fn test_scan_failure_keeps_previous_registry() {
        let engine = engine().await;
        refresh_with(&engine, vec![live(3000, 1, "node")]).await;
        let before = engine.registry();

        let mut rx = engine.subscribe();
        engine
            .scanner
            .push(Err(Error::CommandFailed("ss: not found".to_string())));
        let err = engine.refresh().await.unwrap_err();

        assert!(matches!(err, Error::ScanFailure(ref m) if m.contains("ss: not found")));
        assert_eq!(*engine.registry(), *before);
        assert!(engine.is_port_active(3000));
        assert!(engine.last_scan_error().is_some());
        assert!(matches!(
            drain(&mut rx).as_slice(),
            [EngineEvent::ScanFailed { .. }]
        ));

        // an empty but successful scan is a real state change
        refresh_with(&engine, vec![]).await;
        assert!(engine.last_scan_error().is_none());
        assert!(engine.registry().is_empty());
    }

    #[tokio::test]
    async fn test_snapshots_are_not_affected_by_later_merges() {
        let engine = engine().await;
        refresh_with(&engine, vec![live(3000, 1, "node")]).await;
        let snapshot = engine.registry();

        refresh_with(&engine, vec![live(4000, 2, "ruby")]).await;

        assert!(snapshot.is_active(3000));
        assert!(!snapshot.is_active(4000));
        assert!(engine.is_port_active(4000));
    }

    #[tokio::test]
    async fn test_concurrent_refresh_and_toggle_stay_consistent() {
        let engine = Arc::new(engine().await);
        for _ in 0..20 {
            engine.scanner.push(Ok(vec![live(3000, 1, "node")]));
        }

        let refresher = {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move {
                for _ in 0..20 {
                    engine.refresh().await.unwrap();
                }
            })
        };
        for _ in 0..20 {
            engine.toggle_favorite(9000).await.unwrap();
            let registry = engine.registry();
            if registry.generation() > 0 {
                assert!(registry.is_active(3000));
            }
        }
        refresher.await.unwrap();

        assert_eq!(engine.registry().generation(), 20);
        assert!(!engine.is_favorite(9000));
    }

    #[tokio::test]
    async fn test_terminate_inactive_record_is_rejected() {
        let engine = engine().await;
        engine.add_favorite(9000).await.unwrap();
        refresh_with(&engine, vec![]).await;

        let placeholder = engine.ports().remove(0);
        assert!(!placeholder.is_active);

        let err = engine.terminate(&placeholder).await.unwrap_err();
        assert!(matches!(err, TerminateError::InvalidTarget { port: 9000, .. }));
        assert!(engine.killer.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_terminate_record_without_pid_is_rejected() {
        let engine = engine().await;
        let record = live(3000, 0, "kernel");

        let err = engine.force_terminate(&record).await.unwrap_err();
        assert!(matches!(err, TerminateError::InvalidTarget { pid: 0, .. }));
        assert!(engine.killer.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_terminate_leaves_registry_to_next_merge() {
        let engine = engine().await;
        refresh_with(&engine, vec![live(3000, 77, "node")]).await;
        let record = engine.registry().active(3000).cloned().unwrap();

        assert_ok!(engine.terminate(&record).await);
        assert_ok!(engine.force_terminate(&record).await);

        assert_eq!(*engine.killer.calls.lock(), vec![(77, false), (77, true)]);
        assert!(engine.is_port_active(3000));

        refresh_with(&engine, vec![]).await;
        assert!(!engine.is_port_active(3000));
    }

    #[tokio::test]
    async fn test_terminate_surfaces_executor_errors() {
        let denied = engine_with(
            MemoryConfig::default(),
            RecordingKiller {
                behavior: KillBehavior::Denied,
                ..Default::default()
            },
        )
        .await;
        let err = denied.terminate(&live(22, 1, "sshd")).await.unwrap_err();
        assert!(matches!(
            err,
            TerminateError::Executor(Error::PermissionDenied(_))
        ));

        let stubborn = engine_with(
            MemoryConfig::default(),
            RecordingKiller {
                behavior: KillBehavior::Survives,
                ..Default::default()
            },
        )
        .await;
        let err = stubborn.terminate(&live(3000, 5, "node")).await.unwrap_err();
        assert!(matches!(
            err,
            TerminateError::Executor(Error::KillFailed { pid: 5, .. })
        ));

        let vanished = engine_with(
            MemoryConfig::default(),
            RecordingKiller {
                behavior: KillBehavior::Gone,
                ..Default::default()
            },
        )
        .await;
        let err = vanished.force_terminate(&live(3000, 6, "node")).await.unwrap_err();
        assert!(matches!(
            err,
            TerminateError::Executor(Error::ProcessNotFound(6))
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_terminate_exited_process_reports_not_found() {
        use crate::adapters::ProcessKiller;

        let mut child = std::process::Command::new("true").spawn().unwrap();
        let pid = child.id();
        child.wait().unwrap();

        let engine = PortWatchEngine::load(
            ScriptedScanner::default(),
            ProcessKiller::new(),
            MemoryConfig::default(),
        )
        .await
        .unwrap();

        let err = engine.terminate(&live(3000, pid, "true")).await.unwrap_err();
        assert!(matches!(
            err,
            TerminateError::Executor(Error::ProcessNotFound(p)) if p == pid
        ));
    }

    #[tokio::test]
    async fn test_port_zero_is_rejected_by_overlay_mutations() {
        let engine = engine().await;

        assert!(matches!(engine.toggle_favorite(0).await, Err(Error::InvalidPort(0))));
        assert!(matches!(engine.add_favorite(0).await, Err(Error::InvalidPort(0))));
        assert!(matches!(engine.toggle_watch(0).await, Err(Error::InvalidPort(0))));
        assert!(matches!(
            engine.add_watched_port(0, true, true).await,
            Err(Error::InvalidPort(0))
        ));

        assert!(engine.favorites().is_empty());
        assert!(engine.watched_ports().is_empty());
        assert!(engine.config.favorites.lock().is_empty());

        engine.merge(vec![]).await;
        assert!(engine.registry().is_empty());
    }

    #[tokio::test]
    async fn test_port_zero_in_stored_config_gets_no_placeholder() {
        let config = MemoryConfig::default();
        config.favorites.lock().extend([0, 3000]);
        config.watched.lock().push(WatchedPort::new(0));

        let engine = engine_with(config, RecordingKiller::default()).await;
        assert!(!engine.is_favorite(0));
        assert!(!engine.is_watching(0));

        engine.merge(vec![]).await;
        let ports: Vec<u16> = engine.ports().iter().map(|p| p.port).collect();
        assert_eq!(ports, vec![3000]);
    }

    #[tokio::test]
    async fn test_toggle_favorite_twice_restores_and_persists() {
        let engine = engine().await;

        assert!(engine.toggle_favorite(3000).await.unwrap());
        assert!(engine.config.favorites.lock().contains(&3000));

        assert!(!engine.toggle_favorite(3000).await.unwrap());
        assert!(engine.favorites().is_empty());
        assert!(engine.config.favorites.lock().is_empty());
    }

    #[tokio::test]
    async fn test_failed_persist_leaves_overlay_unchanged() {
        let engine = engine().await;
        engine.add_favorite(3000).await.unwrap();
        engine.config.fail_writes.store(true, Ordering::SeqCst);

        let mut rx = engine.subscribe();
        assert!(matches!(
            engine.toggle_favorite(3000).await,
            Err(Error::Config(_))
        ));
        assert_err!(engine.toggle_watch(8080).await);
        assert_err!(engine.set_refresh_interval(Duration::from_secs(9)).await);

        assert!(engine.is_favorite(3000));
        assert!(!engine.is_watching(8080));
        assert_ne!(engine.refresh_interval(), Duration::from_secs(9));
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_unchanged_overlay_is_not_written() {
        let engine = engine().await;
        engine.config.fail_writes.store(true, Ordering::SeqCst);

        assert!(!engine.remove_favorite(3000).await.unwrap());
        assert!(!engine.remove_watched_port(3000).await.unwrap());
        assert!(!engine.update_watched_port(3000, true, true).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_watched_port_keeps_identity() {
        let engine = engine().await;
        assert!(engine.add_watched_port(5432, true, true).await.unwrap());
        assert!(!engine.add_watched_port(5432, false, false).await.unwrap());
        let id = engine.watched_ports()[0].id;

        assert!(engine.update_watched_port(5432, false, true).await.unwrap());
        let watched = engine.config.watched.lock().clone();
        assert_eq!(watched.len(), 1);
        assert_eq!(watched[0].id, id);
        assert!(!watched[0].notify_on_start);
        assert!(watched[0].notify_on_stop);
    }

    #[tokio::test]
    async fn test_remove_from_list_prunes_placeholder_on_next_merge() {
        let engine = engine().await;
        engine.add_favorite(9000).await.unwrap();
        engine.toggle_watch(9000).await.unwrap();
        refresh_with(&engine, vec![]).await;
        assert!(matches!(
            engine.registry().get(9000),
            Some(RegistryEntry::Placeholder(p)) if p.favorite && p.watched
        ));

        assert!(engine.remove_from_list(9000).await.unwrap());
        assert!(!engine.is_favorite(9000));
        assert!(!engine.is_watching(9000));
        assert!(engine.registry().get(9000).is_some());

        refresh_with(&engine, vec![]).await;
        assert!(engine.registry().get(9000).is_none());
    }

    #[tokio::test]
    async fn test_present_orders_by_actions() {
        let engine = engine().await;
        engine.add_favorite(9000).await.unwrap();
        engine.add_watched_port(5000, true, true).await.unwrap();
        refresh_with(
            &engine,
            vec![live(1000, 1, "a"), live(3000, 3, "c"), live(5000, 5, "e")],
        )
        .await;

        let ports: Vec<u16> = engine
            .present(&PortFilter::default(), SortKey::Actions, true)
            .iter()
            .map(|p| p.port)
            .collect();
        assert_eq!(ports, vec![9000, 5000, 1000, 3000]);

        let favorites = engine.query(&PortFilter::default().with_favorites_only(true));
        assert_eq!(favorites.len(), 1);
        assert!(!favorites[0].is_active);
    }

    #[tokio::test]
    async fn test_set_refresh_interval_clamps_and_persists() {
        let engine = engine().await;

        let applied = engine
            .set_refresh_interval(Duration::from_millis(200))
            .await
            .unwrap();
        assert_eq!(applied, MIN_REFRESH_INTERVAL);
        assert_eq!(engine.config.interval.load(Ordering::SeqCst), 1);

        engine
            .set_refresh_interval(Duration::from_secs(30))
            .await
            .unwrap();
        assert_eq!(engine.refresh_interval(), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_reload_config_replaces_overlay() {
        let engine = engine().await;
        engine.add_favorite(3000).await.unwrap();

        *engine.config.favorites.lock() = [4000].into_iter().collect();
        engine.config.interval.store(12, Ordering::SeqCst);
        engine.reload_config().await.unwrap();

        assert!(!engine.is_favorite(3000));
        assert!(engine.is_favorite(4000));
        assert_eq!(engine.refresh_interval(), Duration::from_secs(12));
    }

    #[tokio::test]
    async fn test_monitor_refreshes_until_shutdown() {
        let engine = Arc::new(engine().await);
        engine.scanner.push(Ok(vec![live(3000, 1, "node")]));
        let mut rx = engine.subscribe();

        let handle = Arc::clone(&engine).spawn_monitor();
        let event = timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event, EngineEvent::RegistryUpdated { generation: 1 });

        handle.shutdown().await;
        assert!(engine.is_port_active(3000));
    }
}
