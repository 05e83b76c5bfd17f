// Shared fixtures for coordinator and sensor integration tests.
#![allow(dead_code, clippy::unwrap_used)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Semaphore;

use switchos_core::{
    CoordinatorConfig, CoreError, DeviceIdentity, MacAddress, Observer, PoeMetrics, PoePort,
    PortInfo, PsuMetrics, Snapshot, SnapshotSource, StateSink, SensorState, SystemMetrics,
};

// ── Scripted source ─────────────────────────────────────────────────

/// Returns queued results in order. Once the script runs out, every fetch
/// fails with a connection error.
pub struct ScriptedSource {
    results: Mutex<VecDeque<Result<Snapshot, CoreError>>>,
    fetches: AtomicUsize,
    /// When set, each fetch waits for one permit before returning.
    gate: Option<Semaphore>,
}

impl ScriptedSource {
    pub fn new(results: Vec<Result<Snapshot, CoreError>>) -> Arc<Self> {
        Arc::new(Self {
            results: Mutex::new(results.into()),
            fetches: AtomicUsize::new(0),
            gate: None,
        })
    }

    pub fn gated(results: Vec<Result<Snapshot, CoreError>>) -> Arc<Self> {
        Arc::new(Self {
            results: Mutex::new(results.into()),
            fetches: AtomicUsize::new(0),
            gate: Some(Semaphore::new(0)),
        })
    }

    pub fn push(&self, result: Result<Snapshot, CoreError>) {
        self.results.lock().unwrap().push_back(result);
    }

    /// Let one gated fetch complete.
    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnapshotSource for ScriptedSource {
    async fn fetch_snapshot(&self) -> Result<Snapshot, CoreError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(connection_error()))
    }

    fn describe(&self) -> String {
        "scripted".into()
    }
}

// ── Fixtures ────────────────────────────────────────────────────────

pub fn config(interval: Duration) -> CoordinatorConfig {
    CoordinatorConfig::new("http://192.168.88.1".parse().unwrap()).with_refresh_interval(interval)
}

pub fn connection_error() -> CoreError {
    CoreError::ConnectionFailed {
        url: "http://192.168.88.1/sys.b".into(),
        reason: "connection refused".into(),
    }
}

fn ports(count: usize) -> Vec<PortInfo> {
    (0..count)
        .map(|index| PortInfo {
            index,
            name: format!("Port{}", index + 1),
        })
        .collect()
}

fn identity() -> DeviceIdentity {
    DeviceIdentity {
        name: "rack-switch".into(),
        serial_number: "HF1234567".into(),
        mac: MacAddress::new("64d154aabbcc"),
        model: "CSS610-8P-2S+".into(),
        firmware: "2.17".into(),
    }
}

/// Non-PoE switch reporting only CPU temperature.
pub fn plain_snapshot(temp: f64, port_count: usize) -> Snapshot {
    Snapshot {
        identity: identity(),
        system: SystemMetrics {
            cpu_temperature: Some(temp),
            ..SystemMetrics::default()
        },
        poe: None,
        ports: ports(port_count),
        fetched_at: Utc::now(),
    }
}

/// PoE switch with PSU1 readings and `port_count` PoE ports, where port
/// `i` draws `i` watts.
pub fn poe_snapshot(temp: f64, port_count: usize) -> Snapshot {
    #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
    let poe_ports = (0..port_count)
        .map(|i| PoePort {
            power: Some(i as f64),
            current: Some(i as f64 * 20.0),
            voltage: Some(48.0),
        })
        .collect();
    Snapshot {
        identity: identity(),
        system: SystemMetrics {
            cpu_temperature: Some(temp),
            psu1: Some(PsuMetrics {
                current: Some(1200.0),
                voltage: Some(48.2),
                power: Some(57.8),
            }),
            psu2: None,
            total_power: Some(12.5),
        },
        poe: Some(PoeMetrics { ports: poe_ports }),
        ports: ports(port_count),
        fetched_at: Utc::now(),
    }
}

// ── Observers ───────────────────────────────────────────────────────

#[derive(Default)]
pub struct CountingObserver {
    calls: AtomicUsize,
}

impl CountingObserver {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Observer for CountingObserver {
    fn handle_refresh(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

/// Sink that records every state written to it.
#[derive(Default)]
pub struct RecordingSink {
    states: Mutex<Vec<SensorState>>,
}

impl RecordingSink {
    pub fn states(&self) -> Vec<SensorState> {
        self.states.lock().unwrap().clone()
    }

    pub fn for_id(&self, unique_id: &str) -> Vec<SensorState> {
        self.states()
            .into_iter()
            .filter(|s| s.unique_id == unique_id)
            .collect()
    }
}

impl StateSink for RecordingSink {
    fn write_state(&self, state: &SensorState) {
        self.states.lock().unwrap().push(state.clone());
    }
}
