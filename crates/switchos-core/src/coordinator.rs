// ── Polling coordinator ──
//
// Owns the refresh loop for one switch. Fetches are single-flight, the
// shared state is swapped whole, and every completed cycle (success or
// failure) fans out to registered observers and stream subscribers.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, Weak};
use std::time::Duration;

use arc_swap::ArcSwap;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::CoordinatorConfig;
use crate::error::CoreError;
use crate::model::Snapshot;
use crate::observer::{Observer, ObserverSet};
use crate::source::{HttpSource, SnapshotSource};
use crate::state::CoordinatorState;
use crate::stream::StateStream;

// ── Coordinator ──────────────────────────────────────────────────

/// Shared polling coordinator for a single switch.
///
/// Cheaply cloneable via `Arc<CoordinatorInner>`. Every clone sees the same
/// state and drives the same refresh loop. Dropping the last clone stops
/// the background task.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    config: CoordinatorConfig,
    source: Arc<dyn SnapshotSource>,
    state: ArcSwap<CoordinatorState>,
    /// `None` once torn down, which closes every `StateStream`.
    state_tx: std::sync::Mutex<Option<watch::Sender<Arc<CoordinatorState>>>>,
    observers: ObserverSet,
    /// Held for the whole fetch-commit-notify cycle.
    refresh_gate: Mutex<()>,
    /// Held from the teardown check through notify, and while teardown
    /// sets `torn_down`, so a cycle either completes before teardown
    /// begins or is discarded.
    commit_lock: std::sync::Mutex<()>,
    /// Completed refresh cycles. Bumped while holding the gate.
    cycles: AtomicU64,
    first_snapshot: OnceLock<Arc<Snapshot>>,
    armed: AtomicBool,
    torn_down: AtomicBool,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Drop for CoordinatorInner {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl Coordinator {
    /// Create a coordinator without fetching anything. Call
    /// [`start_first_refresh()`](Self::start_first_refresh) before reading.
    pub fn new(config: CoordinatorConfig, source: Arc<dyn SnapshotSource>) -> Self {
        let initial = Arc::new(CoordinatorState::default());
        let (state_tx, _) = watch::channel(Arc::clone(&initial));

        Self {
            inner: Arc::new(CoordinatorInner {
                config,
                source,
                state: ArcSwap::new(initial),
                state_tx: std::sync::Mutex::new(Some(state_tx)),
                observers: ObserverSet::new(),
                refresh_gate: Mutex::new(()),
                commit_lock: std::sync::Mutex::new(()),
                cycles: AtomicU64::new(0),
                first_snapshot: OnceLock::new(),
                armed: AtomicBool::new(false),
                torn_down: AtomicBool::new(false),
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Create a coordinator and run the first refresh.
    ///
    /// Fails if the first fetch fails; there is no stale data to fall back on.
    pub async fn setup(
        config: CoordinatorConfig,
        source: Arc<dyn SnapshotSource>,
    ) -> Result<Self, CoreError> {
        let coordinator = Self::new(config, source);
        coordinator.start_first_refresh().await?;
        Ok(coordinator)
    }

    /// [`setup()`](Self::setup) against the switch's HTTP interface.
    pub async fn connect(config: CoordinatorConfig) -> Result<Self, CoreError> {
        let source = Arc::new(HttpSource::from_config(&config)?);
        Self::setup(config, source).await
    }

    /// One-shot: set up without polling, run closure, tear down.
    pub async fn oneshot<F, Fut, T>(
        config: CoordinatorConfig,
        source: Arc<dyn SnapshotSource>,
        f: F,
    ) -> Result<T, CoreError>
    where
        F: FnOnce(Coordinator) -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        let cfg = config.with_refresh_interval(Duration::ZERO);
        let coordinator = Self::setup(cfg, source).await?;
        let result = f(coordinator.clone()).await;
        coordinator.teardown().await;
        result
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.inner.config
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Run the initial fetch and, on success, arm the periodic refresh task.
    ///
    /// Idempotent: once a snapshot exists this returns `Ok` without fetching.
    pub async fn start_first_refresh(&self) -> Result<(), CoreError> {
        if self.is_torn_down() {
            return Err(CoreError::ShutDown);
        }
        if self.inner.first_snapshot.get().is_none() {
            self.refresh_now().await?;
        }
        self.arm().await;
        Ok(())
    }

    /// Spawn the periodic refresh task, at most once.
    async fn arm(&self) {
        let config = &self.inner.config;
        if !config.polls() || self.inner.armed.swap(true, Ordering::AcqRel) {
            return;
        }

        let handle = tokio::spawn(refresh_task(
            Arc::downgrade(&self.inner),
            config.refresh_interval,
            self.inner.cancel.clone(),
        ));
        self.inner.task_handles.lock().await.push(handle);

        info!(
            source = %self.inner.source.describe(),
            interval_secs = config.refresh_interval.as_secs(),
            "periodic refresh armed"
        );
    }

    /// Stop the refresh task and drop all observers.
    ///
    /// A fetch in flight is allowed to finish, but its result is discarded.
    /// No observer is notified once this has started. Must not be called from
    /// inside an observer callback.
    pub async fn teardown(&self) {
        let already = {
            let _commit = self
                .inner
                .commit_lock
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            self.inner.torn_down.swap(true, Ordering::AcqRel)
        };
        if already {
            return;
        }
        self.inner.cancel.cancel();

        let handles: Vec<_> = self.inner.task_handles.lock().await.drain(..).collect();
        for handle in handles {
            let _ = handle.await;
        }

        // Wait out any manual refresh still holding the gate.
        drop(self.inner.refresh_gate.lock().await);

        self.inner.observers.clear();
        self.inner
            .state_tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        debug!("coordinator torn down");
    }

    pub fn is_torn_down(&self) -> bool {
        self.inner.torn_down.load(Ordering::Acquire)
    }

    // ── Refresh ──────────────────────────────────────────────────

    /// Refresh now, or join the refresh already in flight.
    ///
    /// Callers that arrive while a fetch is running wait for it and receive
    /// its outcome instead of starting another. Either way observers are
    /// notified exactly once for the cycle.
    pub async fn refresh_now(&self) -> Result<(), CoreError> {
        let seen = self.inner.cycles.load(Ordering::Acquire);
        let _gate = self.inner.refresh_gate.lock().await;

        if self.is_torn_down() {
            return Err(CoreError::ShutDown);
        }
        if self.inner.cycles.load(Ordering::Acquire) != seen {
            return self.inner.state.load().outcome();
        }

        let result = self.inner.source.fetch_snapshot().await;

        if self.is_torn_down() {
            debug!("discarding refresh result after teardown");
            return Err(CoreError::ShutDown);
        }

        let previous = self.inner.state.load_full();
        let next = match result {
            Ok(snapshot) => {
                if let Some(err) = &previous.last_error {
                    info!(previous_error = %err, "refresh recovered");
                }
                previous.succeeded(snapshot)
            }
            Err(err) => {
                if previous.last_error.is_none() {
                    warn!(
                        source = %self.inner.source.describe(),
                        error = %err,
                        "refresh failed"
                    );
                } else {
                    debug!(error = %err, attempts = previous.attempts + 1, "refresh still failing");
                }
                previous.failed(err)
            }
        };

        let _commit = self
            .inner
            .commit_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if self.is_torn_down() {
            debug!("discarding refresh result after teardown");
            return Err(CoreError::ShutDown);
        }

        if let Some(snapshot) = &next.snapshot {
            self.inner
                .first_snapshot
                .get_or_init(|| Arc::clone(snapshot));
        }
        let next = Arc::new(next);
        let outcome = next.outcome();
        self.inner.state.store(Arc::clone(&next));
        self.inner.cycles.fetch_add(1, Ordering::AcqRel);
        self.inner.observers.notify();
        // Stream subscribers wake after observers have seen the cycle.
        self.publish(next);
        outcome
    }

    fn publish(&self, next: Arc<CoordinatorState>) {
        if let Some(tx) = self
            .inner
            .state_tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            tx.send_replace(next);
        }
    }

    // ── Reads ────────────────────────────────────────────────────

    /// Most recent successful snapshot. Never waits on I/O.
    pub fn current_snapshot(&self) -> Result<Arc<Snapshot>, CoreError> {
        self.inner
            .state
            .load()
            .snapshot
            .clone()
            .ok_or(CoreError::Unavailable)
    }

    /// Snapshot from the first successful refresh. Capability checks are
    /// made against this one so they never change afterwards.
    pub fn first_snapshot(&self) -> Option<Arc<Snapshot>> {
        self.inner.first_snapshot.get().cloned()
    }

    pub fn state(&self) -> Arc<CoordinatorState> {
        self.inner.state.load_full()
    }

    pub fn last_error(&self) -> Option<CoreError> {
        self.inner.state.load().last_error.clone()
    }

    pub fn last_update_success(&self) -> bool {
        self.inner.state.load().last_update_success()
    }

    // ── Observation ──────────────────────────────────────────────

    /// Register an observer. Registering the same `Arc` twice is a no-op.
    ///
    /// The coordinator holds it weakly; dropping the last `Arc` elsewhere
    /// stops notifications. Ignored after teardown.
    pub fn register<O: Observer + 'static>(&self, observer: &Arc<O>) -> bool {
        if self.is_torn_down() {
            return false;
        }
        self.inner.observers.register(observer)
    }

    /// Unregister an observer. Unknown observers are ignored.
    pub fn unregister<O: Observer + ?Sized>(&self, observer: &Arc<O>) -> bool {
        self.inner.observers.unregister(observer)
    }

    pub fn observer_count(&self) -> usize {
        self.inner.observers.len()
    }

    /// Subscribe to state changes. The stream ends at teardown.
    pub fn subscribe(&self) -> StateStream {
        let guard = self
            .inner
            .state_tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match guard.as_ref() {
            Some(tx) => StateStream::new(tx.subscribe()),
            None => {
                let (_, rx) = watch::channel(self.state());
                StateStream::new(rx)
            }
        }
    }
}

// ── Background task ──────────────────────────────────────────────

/// Periodically refresh the coordinator until cancelled or dropped.
async fn refresh_task(inner: Weak<CoordinatorInner>, period: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                let Some(inner) = inner.upgrade() else { break };
                // Outcome is recorded in the state and logged by refresh_now.
                let _ = Coordinator { inner }.refresh_now().await;
            }
        }
    }

    debug!("refresh task stopped");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;

    use async_trait::async_trait;
    use chrono::Utc;

    use super::*;
    use crate::model::{DeviceIdentity, MacAddress, SystemMetrics};

    struct Scripted {
        results: std::sync::Mutex<VecDeque<Result<Snapshot, CoreError>>>,
        fetches: AtomicUsize,
    }

    #[async_trait]
    impl SnapshotSource for Scripted {
        async fn fetch_snapshot(&self) -> Result<Snapshot, CoreError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(CoreError::Internal("script exhausted".into())))
        }

        fn describe(&self) -> String {
            "scripted".into()
        }
    }

    fn snapshot(temp: f64) -> Snapshot {
        Snapshot {
            identity: DeviceIdentity {
                name: "sw".into(),
                serial_number: "S1".into(),
                mac: MacAddress::new("001122334455"),
                model: "CSS610".into(),
                firmware: "2.17".into(),
            },
            system: SystemMetrics {
                cpu_temperature: Some(temp),
                ..SystemMetrics::default()
            },
            poe: None,
            ports: Vec::new(),
            fetched_at: Utc::now(),
        }
    }

    fn config() -> CoordinatorConfig {
        CoordinatorConfig::new("http://192.168.88.1".parse().unwrap())
            .with_refresh_interval(Duration::ZERO)
    }

    fn scripted(results: Vec<Result<Snapshot, CoreError>>) -> Arc<Scripted> {
        Arc::new(Scripted {
            results: std::sync::Mutex::new(results.into()),
            fetches: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn start_first_refresh_is_idempotent() {
        let source = scripted(vec![Ok(snapshot(40.0))]);
        let coordinator = Coordinator::setup(config(), source.clone()).await.unwrap();
        coordinator.start_first_refresh().await.unwrap();
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
        assert_eq!(coordinator.state().generation, 1);
    }

    #[tokio::test]
    async fn refresh_after_teardown_is_rejected() {
        let source = scripted(vec![Ok(snapshot(40.0))]);
        let coordinator = Coordinator::setup(config(), source.clone()).await.unwrap();
        coordinator.teardown().await;
        assert_eq!(coordinator.refresh_now().await, Err(CoreError::ShutDown));
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
        // Last good data stays readable.
        assert!(coordinator.current_snapshot().is_ok());
    }

    #[tokio::test]
    async fn subscribe_after_teardown_ends_immediately() {
        let source = scripted(vec![Ok(snapshot(40.0))]);
        let coordinator = Coordinator::setup(config(), source).await.unwrap();
        coordinator.teardown().await;
        let mut stream = coordinator.subscribe();
        assert!(stream.current().is_ready());
        assert!(stream.changed().await.is_none());
    }
}
