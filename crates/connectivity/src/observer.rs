//! Connectivity observer - background task that monitors reachability.

use crate::config::ConnectivityConfig;
use crate::source::ReachabilitySource;
use crate::status::{PathState, PathStatus};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Receiver for connectivity flips. The value is the current satisfied flag.
pub type ConnectivitySubscription = watch::Receiver<bool>;

struct MonitorTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// State shared between the observer and its monitor task.
#[derive(Clone)]
struct Shared {
    state: Arc<Mutex<PathState>>,
    changes: Arc<watch::Sender<bool>>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, PathState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn handle_status(&self, status: PathStatus) -> bool {
        let mut guard = self.lock();
        if !guard.apply(status) {
            return false;
        }
        let satisfied = guard.is_satisfied();
        drop(guard);

        tracing::info!(%status, satisfied, "connectivity changed");
        self.changes.send_replace(satisfied);
        true
    }
}

/// Watches a [`ReachabilitySource`] and publishes satisfied/unsatisfied flips.
///
/// Probing runs on a spawned tokio task. Consumers receive flips through
/// [`ConnectivityObserver::subscribe`] and read them on their own task, which
/// keeps all coordinator state on one owner.
pub struct ConnectivityObserver {
    source: Arc<dyn ReachabilitySource>,
    interval: Duration,
    shared: Shared,
    task: Option<MonitorTask>,
}

impl ConnectivityObserver {
    pub fn new(source: Arc<dyn ReachabilitySource>, config: &ConnectivityConfig) -> Self {
        Self::with_interval(source, config.poll_interval())
    }

    pub fn with_interval(source: Arc<dyn ReachabilitySource>, interval: Duration) -> Self {
        let (changes, _) = watch::channel(false);
        Self {
            source,
            interval,
            shared: Shared {
                state: Arc::new(Mutex::new(PathState::new())),
                changes: Arc::new(changes),
            },
            task: None,
        }
    }

    /// Observer probing the TCP endpoint from `config`.
    pub fn tcp(config: &ConnectivityConfig) -> Self {
        Self::new(Arc::new(config.tcp_probe()), config)
    }

    /// Start monitoring. Must be called from within a tokio runtime.
    ///
    /// Calling this while already running is a no-op.
    pub fn start(&mut self) {
        if self.is_running() {
            tracing::warn!("ConnectivityObserver already running");
            return;
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(monitor(
            Arc::clone(&self.source),
            self.shared.clone(),
            self.interval,
            cancel.clone(),
        ));
        self.task = Some(MonitorTask { cancel, handle });
    }

    /// Stop monitoring. Safe to call repeatedly.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.cancel.cancel();
        }
    }

    pub fn is_running(&self) -> bool {
        match &self.task {
            Some(task) => !task.handle.is_finished() && !task.cancel.is_cancelled(),
            None => false,
        }
    }

    /// Last known satisfied flag. Safe to call from any thread.
    pub fn has_connectivity(&self) -> bool {
        self.shared.lock().is_satisfied()
    }

    /// Last raw status seen by the observer.
    pub fn last_status(&self) -> PathStatus {
        self.shared.lock().last_status()
    }

    /// Subscribe to satisfied/unsatisfied flips.
    pub fn subscribe(&self) -> ConnectivitySubscription {
        self.shared.changes.subscribe()
    }

    /// Feed a status pushed by a platform callback instead of polling.
    ///
    /// Returns `true` if the status flipped connectivity.
    pub fn handle_path_update(&self, status: PathStatus) -> bool {
        self.shared.handle_status(status)
    }
}

impl Drop for ConnectivityObserver {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn monitor(
    source: Arc<dyn ReachabilitySource>,
    shared: Shared,
    interval: Duration,
    cancel: CancellationToken,
) {
    tracing::info!(?interval, "ConnectivityObserver started");

    loop {
        let status = tokio::select! {
            _ = cancel.cancelled() => break,
            status = source.probe() => status,
        };

        shared.handle_status(status);

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }

    tracing::info!("ConnectivityObserver stopped");
}
