#![allow(clippy::unwrap_used)]
// Integration tests for `Coordinator` driven by a scripted snapshot source.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures_util::StreamExt;
use pretty_assertions::assert_eq;

use switchos_core::{Coordinator, CoreError, Observer};

use common::{CountingObserver, ScriptedSource, config, connection_error, plain_snapshot};

const INTERVAL: Duration = Duration::from_secs(10);

async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

// ── Startup ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_setup_fails_when_first_refresh_fails() {
    let source = ScriptedSource::new(vec![Err(connection_error())]);
    let result = Coordinator::setup(config(INTERVAL), source.clone()).await;

    assert!(
        matches!(result, Err(CoreError::ConnectionFailed { .. })),
        "expected ConnectionFailed, got: {:?}",
        result.err()
    );
    assert_eq!(source.fetches(), 1);
}

#[tokio::test]
async fn test_current_snapshot_unavailable_before_first_refresh() {
    let source = ScriptedSource::new(vec![Ok(plain_snapshot(40.0, 2))]);
    let coordinator = Coordinator::new(config(INTERVAL), source.clone());

    assert_eq!(coordinator.current_snapshot().err(), Some(CoreError::Unavailable));
    assert!(!coordinator.last_update_success());
    assert!(coordinator.first_snapshot().is_none());
    assert_eq!(source.fetches(), 0);
}

#[tokio::test]
async fn test_failed_first_refresh_can_be_retried() {
    let source = ScriptedSource::new(vec![Err(connection_error()), Ok(plain_snapshot(40.0, 2))]);
    let coordinator = Coordinator::new(config(Duration::ZERO), source.clone());

    assert!(coordinator.start_first_refresh().await.is_err());
    assert!(coordinator.current_snapshot().is_err());

    coordinator.start_first_refresh().await.unwrap();
    let snapshot = coordinator.current_snapshot().unwrap();
    assert_eq!(snapshot.system.cpu_temperature, Some(40.0));
    assert_eq!(coordinator.state().generation, 1);
    assert_eq!(coordinator.state().attempts, 2);
}

// ── Refresh outcomes ────────────────────────────────────────────────

#[tokio::test]
async fn test_failure_keeps_last_good_snapshot() {
    let source = ScriptedSource::new(vec![Ok(plain_snapshot(42.0, 2)), Err(connection_error())]);
    let coordinator = Coordinator::setup(config(Duration::ZERO), source.clone())
        .await
        .unwrap();
    let before = coordinator.current_snapshot().unwrap();

    let result = coordinator.refresh_now().await;

    assert_eq!(result, Err(connection_error()));
    let after = coordinator.current_snapshot().unwrap();
    assert!(Arc::ptr_eq(&before, &after));
    assert_eq!(coordinator.last_error(), Some(connection_error()));
    assert!(!coordinator.last_update_success());
}

#[tokio::test]
async fn test_success_clears_error() {
    let source = ScriptedSource::new(vec![
        Ok(plain_snapshot(42.0, 2)),
        Err(connection_error()),
        Ok(plain_snapshot(45.0, 2)),
    ]);
    let coordinator = Coordinator::setup(config(Duration::ZERO), source.clone())
        .await
        .unwrap();

    let _ = coordinator.refresh_now().await;
    coordinator.refresh_now().await.unwrap();

    assert!(coordinator.last_error().is_none());
    assert!(coordinator.last_update_success());
    assert_eq!(
        coordinator.current_snapshot().unwrap().system.cpu_temperature,
        Some(45.0)
    );
    let state = coordinator.state();
    assert_eq!(state.generation, 2);
    assert_eq!(state.attempts, 3);
}

#[tokio::test]
async fn test_first_snapshot_is_pinned() {
    let source = ScriptedSource::new(vec![Ok(plain_snapshot(42.0, 2)), Ok(plain_snapshot(50.0, 2))]);
    let coordinator = Coordinator::setup(config(Duration::ZERO), source.clone())
        .await
        .unwrap();
    coordinator.refresh_now().await.unwrap();

    let first = coordinator.first_snapshot().unwrap();
    assert_eq!(first.system.cpu_temperature, Some(42.0));
    assert_eq!(
        coordinator.current_snapshot().unwrap().system.cpu_temperature,
        Some(50.0)
    );
}

// ── Single-flight ───────────────────────────────────────────────────

#[tokio::test]
async fn test_concurrent_refreshes_share_one_fetch() {
    let source = ScriptedSource::gated(vec![Ok(plain_snapshot(42.0, 2)), Ok(plain_snapshot(43.0, 2))]);
    source.release();
    let coordinator = Coordinator::setup(config(Duration::ZERO), source.clone())
        .await
        .unwrap();
    let observer = Arc::new(CountingObserver::default());
    coordinator.register(&observer);

    let callers: Vec<_> = (0..5)
        .map(|_| {
            let c = coordinator.clone();
            tokio::spawn(async move { c.refresh_now().await })
        })
        .collect();
    settle().await;
    assert_eq!(source.fetches(), 2);

    source.release();
    for caller in callers {
        caller.await.unwrap().unwrap();
    }

    assert_eq!(source.fetches(), 2);
    assert_eq!(observer.calls(), 1);
    assert_eq!(
        coordinator.current_snapshot().unwrap().system.cpu_temperature,
        Some(43.0)
    );
}

#[tokio::test(start_paused = true)]
async fn test_manual_refresh_joins_timer_refresh() {
    let source = ScriptedSource::gated(vec![Ok(plain_snapshot(42.0, 2)), Ok(plain_snapshot(43.0, 2))]);
    source.release();
    let coordinator = Coordinator::setup(config(INTERVAL), source.clone())
        .await
        .unwrap();
    let observer = Arc::new(CountingObserver::default());
    coordinator.register(&observer);

    // Let the task arm its interval, then fire it; its fetch blocks on the gate.
    settle().await;
    tokio::time::advance(INTERVAL).await;
    settle().await;
    assert_eq!(source.fetches(), 2);

    let manual = {
        let c = coordinator.clone();
        tokio::spawn(async move { c.refresh_now().await })
    };
    settle().await;
    assert_eq!(source.fetches(), 2);

    source.release();
    manual.await.unwrap().unwrap();

    assert_eq!(source.fetches(), 2);
    assert_eq!(observer.calls(), 1);
    assert_eq!(
        coordinator.current_snapshot().unwrap().system.cpu_temperature,
        Some(43.0)
    );
    coordinator.teardown().await;
}

#[tokio::test]
async fn test_joined_callers_receive_the_shared_error() {
    let source = ScriptedSource::gated(vec![Ok(plain_snapshot(42.0, 2)), Err(connection_error())]);
    source.release();
    let coordinator = Coordinator::setup(config(Duration::ZERO), source.clone())
        .await
        .unwrap();

    let callers: Vec<_> = (0..3)
        .map(|_| {
            let c = coordinator.clone();
            tokio::spawn(async move { c.refresh_now().await })
        })
        .collect();
    settle().await;
    source.release();

    for caller in callers {
        assert_eq!(caller.await.unwrap(), Err(connection_error()));
    }
    assert_eq!(source.fetches(), 2);
}

// ── Periodic refresh ────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_timer_drives_refresh_and_notifies_once_per_cycle() {
    let source = ScriptedSource::new(vec![
        Ok(plain_snapshot(42.0, 2)),
        Err(connection_error()),
        Ok(plain_snapshot(45.0, 2)),
    ]);
    let coordinator = Coordinator::setup(config(INTERVAL), source.clone())
        .await
        .unwrap();
    let observer = Arc::new(CountingObserver::default());
    coordinator.register(&observer);
    let mut stream = coordinator.subscribe();

    // t1: connection error, stale data still served.
    let state = stream.changed().await.unwrap();
    assert_eq!(state.last_error, Some(connection_error()));
    assert_eq!(
        coordinator.current_snapshot().unwrap().system.cpu_temperature,
        Some(42.0)
    );
    assert_eq!(observer.calls(), 1);

    // t2: recovered.
    let state = stream.changed().await.unwrap();
    assert!(state.last_error.is_none());
    assert_eq!(
        state.snapshot.as_ref().unwrap().system.cpu_temperature,
        Some(45.0)
    );
    assert_eq!(observer.calls(), 2);
    assert_eq!(source.fetches(), 3);

    coordinator.teardown().await;
}

#[tokio::test(start_paused = true)]
async fn test_no_refresh_task_when_interval_is_zero() {
    let source = ScriptedSource::new(vec![Ok(plain_snapshot(42.0, 2))]);
    let coordinator = Coordinator::setup(config(Duration::ZERO), source.clone())
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_secs(60)).await;

    assert_eq!(source.fetches(), 1);
    coordinator.teardown().await;
}

#[tokio::test(start_paused = true)]
async fn test_state_stream_yields_current_state_first() {
    let source = ScriptedSource::new(vec![Ok(plain_snapshot(42.0, 2)), Ok(plain_snapshot(43.0, 2))]);
    let coordinator = Coordinator::setup(config(INTERVAL), source.clone())
        .await
        .unwrap();

    let mut states = coordinator.subscribe().into_stream();
    let first = states.next().await.unwrap();
    assert_eq!(first.generation, 1);
    let second = states.next().await.unwrap();
    assert_eq!(second.generation, 2);

    coordinator.teardown().await;
    assert!(states.next().await.is_none());
}

// ── Observers ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_register_and_unregister_are_idempotent() {
    let source = ScriptedSource::new(vec![Ok(plain_snapshot(42.0, 2)), Ok(plain_snapshot(43.0, 2))]);
    let coordinator = Coordinator::setup(config(Duration::ZERO), source.clone())
        .await
        .unwrap();
    let observer = Arc::new(CountingObserver::default());

    assert!(coordinator.register(&observer));
    assert!(!coordinator.register(&observer));
    coordinator.refresh_now().await.unwrap();
    assert_eq!(observer.calls(), 1);

    assert!(coordinator.unregister(&observer));
    assert!(!coordinator.unregister(&observer));
    coordinator.refresh_now().await.unwrap_err();
    assert_eq!(observer.calls(), 1);
}

#[tokio::test]
async fn test_dropped_observer_is_not_notified() {
    let source = ScriptedSource::new(vec![Ok(plain_snapshot(42.0, 2)), Ok(plain_snapshot(43.0, 2))]);
    let coordinator = Coordinator::setup(config(Duration::ZERO), source.clone())
        .await
        .unwrap();
    let observer = Arc::new(CountingObserver::default());
    coordinator.register(&observer);
    assert_eq!(coordinator.observer_count(), 1);

    drop(observer);
    coordinator.refresh_now().await.unwrap();
    assert_eq!(coordinator.observer_count(), 0);
}

#[tokio::test]
async fn test_observer_reads_new_snapshot_during_notification() {
    struct Reader {
        coordinator: Coordinator,
        seen: std::sync::Mutex<Vec<f64>>,
    }

    impl switchos_core::Observer for Reader {
        fn handle_refresh(&self) {
            if let Some(t) = self
                .coordinator
                .current_snapshot()
                .ok()
                .and_then(|s| s.system.cpu_temperature)
            {
                self.seen.lock().unwrap().push(t);
            }
        }
    }

    let source = ScriptedSource::new(vec![Ok(plain_snapshot(42.0, 2)), Ok(plain_snapshot(45.0, 2))]);
    let coordinator = Coordinator::setup(config(Duration::ZERO), source.clone())
        .await
        .unwrap();
    let reader = Arc::new(Reader {
        coordinator: coordinator.clone(),
        seen: std::sync::Mutex::new(Vec::new()),
    });
    coordinator.register(&reader);

    coordinator.refresh_now().await.unwrap();
    assert_eq!(*reader.seen.lock().unwrap(), vec![45.0]);
}

// ── Teardown ────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_teardown_stops_timer_and_notifications() {
    let source = ScriptedSource::new(vec![Ok(plain_snapshot(42.0, 2))]);
    let coordinator = Coordinator::setup(config(INTERVAL), source.clone())
        .await
        .unwrap();
    let observer = Arc::new(CountingObserver::default());
    coordinator.register(&observer);

    coordinator.teardown().await;
    tokio::time::sleep(INTERVAL * 5).await;

    assert_eq!(source.fetches(), 1);
    assert_eq!(observer.calls(), 0);
    assert_eq!(coordinator.observer_count(), 0);
    assert!(!coordinator.register(&observer));
}

#[tokio::test]
async fn test_in_flight_fetch_is_discarded_after_teardown() {
    let source = ScriptedSource::gated(vec![Ok(plain_snapshot(42.0, 2)), Ok(plain_snapshot(99.0, 2))]);
    source.release();
    let coordinator = Coordinator::setup(config(Duration::ZERO), source.clone())
        .await
        .unwrap();
    let observer = Arc::new(CountingObserver::default());
    coordinator.register(&observer);

    let refresh = {
        let c = coordinator.clone();
        tokio::spawn(async move { c.refresh_now().await })
    };
    settle().await;
    let teardown = {
        let c = coordinator.clone();
        tokio::spawn(async move { c.teardown().await })
    };
    settle().await;
    source.release();

    assert_eq!(refresh.await.unwrap(), Err(CoreError::ShutDown));
    teardown.await.unwrap();

    assert_eq!(observer.calls(), 0);
    assert_eq!(
        coordinator.current_snapshot().unwrap().system.cpu_temperature,
        Some(42.0)
    );
    assert!(coordinator.is_torn_down());
}

/// Counts notifications delivered after teardown has started.
struct LateNotificationWitness {
    coordinator: Coordinator,
    late: AtomicUsize,
}

impl Observer for LateNotificationWitness {
    fn handle_refresh(&self) {
        if self.coordinator.is_torn_down() {
            self.late.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_no_notification_once_teardown_has_begun() {
    for _ in 0..200 {
        let source = ScriptedSource::new(vec![Ok(plain_snapshot(42.0, 2)), Ok(plain_snapshot(43.0, 2))]);
        let coordinator = Coordinator::setup(config(Duration::ZERO), source.clone())
            .await
            .unwrap();
        let witness = Arc::new(LateNotificationWitness {
            coordinator: coordinator.clone(),
            late: AtomicUsize::new(0),
        });
        coordinator.register(&witness);

        let refresh = {
            let c = coordinator.clone();
            tokio::spawn(async move { c.refresh_now().await })
        };
        let teardown = {
            let c = coordinator.clone();
            tokio::spawn(async move { c.teardown().await })
        };
        let outcome = refresh.await.unwrap();
        teardown.await.unwrap();

        assert_eq!(witness.late.load(Ordering::SeqCst), 0);
        assert!(matches!(outcome, Ok(()) | Err(CoreError::ShutDown)), "got {outcome:?}");
    }
}
