// ── Sensor entities ──
//
// A `Sensor` is one description bound to a coordinator (and, for PoE
// readings, to a port). It reads through the coordinator on demand and,
// when registered, pushes its state to a host sink after every refresh.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::coordinator::Coordinator;
use crate::error::CoreError;
use crate::model::PortInfo;
use crate::observer::Observer;

use super::description::{
    DeviceClass, GLOBAL_SENSORS, PORT_SENSORS, SensorDescription, SensorScope, Unit,
};

/// Host callback that receives sensor state after each refresh.
pub trait StateSink: Send + Sync {
    fn write_state(&self, state: &SensorState);
}

/// What a sensor publishes to its host.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorState {
    pub unique_id: String,
    pub key: &'static str,
    /// `"03 Uplink"` for port sensors.
    pub port: Option<String>,
    pub value: Option<f64>,
    pub available: bool,
    pub device_class: DeviceClass,
    pub unit: Unit,
    pub precision: u8,
}

impl SensorState {
    /// Value rounded to the suggested precision, with its unit.
    pub fn display_value(&self) -> Option<String> {
        let value = self.value?;
        let precision = usize::from(self.precision);
        Some(format!("{value:.precision$} {}", self.unit))
    }
}

// ── Sensor ───────────────────────────────────────────────────────

/// One bound sensor.
pub struct Sensor {
    coordinator: Coordinator,
    description: &'static SensorDescription,
    port: Option<PortInfo>,
    unique_id: String,
    enabled: bool,
    sink: Option<Arc<dyn StateSink>>,
}

impl Sensor {
    /// Bind `description` to the coordinator's device.
    ///
    /// Port sensors need a port index inside the first snapshot's port list;
    /// global sensors must not be given one. Whether the sensor is enabled is
    /// decided here, once, from the first snapshot.
    pub fn bind(
        coordinator: &Coordinator,
        description: &'static SensorDescription,
        port: Option<usize>,
    ) -> Result<Self, CoreError> {
        let first = coordinator.first_snapshot().ok_or(CoreError::Unavailable)?;

        let port = match (description.scope(), port) {
            (SensorScope::Global, None) => None,
            (SensorScope::Port, Some(index)) => Some(
                first
                    .port(index)
                    .cloned()
                    .ok_or(CoreError::PortOutOfRange {
                        port: index,
                        available: first.port_count(),
                    })?,
            ),
            (SensorScope::Global, Some(_)) => {
                return Err(CoreError::InvalidSensor {
                    key: description.key.into(),
                    reason: "device-wide sensor cannot be bound to a port".into(),
                });
            }
            (SensorScope::Port, None) => {
                return Err(CoreError::InvalidSensor {
                    key: description.key.into(),
                    reason: "port sensor needs a port index".into(),
                });
            }
        };

        let index = port.as_ref().map(|p| p.index);
        let resolves = description.kind.read(&first, index).is_some();
        let enabled = resolves && (!description.kind.requires_poe() || first.supports_poe());

        let serial = &first.identity.serial_number;
        let unique_id = match index {
            Some(i) => format!("{serial}_{i}_{}", description.key),
            None => format!("{serial}_{}", description.key),
        };

        Ok(Self {
            coordinator: coordinator.clone(),
            description,
            port,
            unique_id,
            enabled,
            sink: None,
        })
    }

    /// Publish state to `sink` on every refresh once registered.
    pub fn with_sink(mut self, sink: Arc<dyn StateSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn description(&self) -> &'static SensorDescription {
        self.description
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    pub fn port(&self) -> Option<&PortInfo> {
        self.port.as_ref()
    }

    /// `"03 Uplink"`: one-based two-digit number, then the port name.
    pub fn port_label(&self) -> Option<String> {
        self.port.as_ref().map(|p| format!("{} {}", p.label(), p.name))
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Current value from the latest good snapshot.
    pub fn native_value(&self) -> Option<f64> {
        let snapshot = self.coordinator.current_snapshot().ok()?;
        self.description
            .kind
            .read(&snapshot, self.port.as_ref().map(|p| p.index))
    }

    /// Whether the most recent refresh succeeded.
    pub fn available(&self) -> bool {
        self.coordinator.last_update_success()
    }

    pub fn state(&self) -> SensorState {
        SensorState {
            unique_id: self.unique_id.clone(),
            key: self.description.key,
            port: self.port_label(),
            value: self.native_value(),
            available: self.available(),
            device_class: self.description.device_class,
            unit: self.description.unit,
            precision: self.description.precision,
        }
    }
}

impl Observer for Sensor {
    fn handle_refresh(&self) {
        if let Some(sink) = &self.sink {
            sink.write_state(&self.state());
        }
    }
}

impl std::fmt::Debug for Sensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sensor")
            .field("unique_id", &self.unique_id)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

// ── SensorSet ────────────────────────────────────────────────────

/// Every sensor the device supports, with the enabled ones registered.
///
/// Dropping the set unregisters its sensors.
pub struct SensorSet {
    coordinator: Coordinator,
    sensors: Vec<Arc<Sensor>>,
}

impl SensorSet {
    /// Bind every global sensor, and every port sensor for every port of
    /// the first snapshot. Enabled sensors are registered as observers that
    /// publish to `sink`.
    pub fn build(coordinator: &Coordinator, sink: &Arc<dyn StateSink>) -> Result<Self, CoreError> {
        let first = coordinator.first_snapshot().ok_or(CoreError::Unavailable)?;

        let globals = GLOBAL_SENSORS.iter().map(|d| (d, None));
        let per_port = PORT_SENSORS
            .iter()
            .flat_map(|d| (0..first.port_count()).map(move |i| (d, Some(i))));

        let mut sensors = Vec::new();
        for (description, port) in globals.chain(per_port) {
            let sensor =
                Arc::new(Sensor::bind(coordinator, description, port)?.with_sink(Arc::clone(sink)));
            if sensor.is_enabled() {
                coordinator.register(&sensor);
            }
            sensors.push(sensor);
        }

        debug!(
            total = sensors.len(),
            enabled = sensors.iter().filter(|s| s.is_enabled()).count(),
            "sensors bound"
        );

        Ok(Self {
            coordinator: coordinator.clone(),
            sensors,
        })
    }

    pub fn sensors(&self) -> &[Arc<Sensor>] {
        &self.sensors
    }

    pub fn enabled(&self) -> impl Iterator<Item = &Arc<Sensor>> {
        self.sensors.iter().filter(|s| s.is_enabled())
    }

    pub fn get(&self, unique_id: &str) -> Option<&Arc<Sensor>> {
        self.sensors.iter().find(|s| s.unique_id() == unique_id)
    }

    /// Publish every enabled sensor's current state once, without waiting
    /// for a refresh.
    pub fn publish_all(&self) {
        for sensor in self.enabled() {
            sensor.handle_refresh();
        }
    }

    /// Unregister every sensor from the coordinator.
    pub fn teardown(&self) {
        for sensor in &self.sensors {
            self.coordinator.unregister(sensor);
        }
    }
}

impl Drop for SensorSet {
    fn drop(&mut self) {
        self.teardown();
    }
}
