// ── Snapshot domain types ──
//
// One immutable read of the switch. Shared as `Arc<Snapshot>` and
// replaced whole on every successful refresh, never mutated in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::mac::MacAddress;

/// Identity fields, stable for the lifetime of the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    /// User-assigned device name.
    pub name: String,
    pub serial_number: String,
    pub mac: MacAddress,
    pub model: String,
    pub firmware: String,
}

/// Readings for one power supply input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PsuMetrics {
    /// mA
    pub current: Option<f64>,
    /// V
    pub voltage: Option<f64>,
    /// W
    pub power: Option<f64>,
}

impl PsuMetrics {
    pub fn is_empty(&self) -> bool {
        self.current.is_none() && self.voltage.is_none() && self.power.is_none()
    }
}

/// System-wide health. `None` means the hardware does not report it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemMetrics {
    /// °C
    pub cpu_temperature: Option<f64>,
    pub psu1: Option<PsuMetrics>,
    pub psu2: Option<PsuMetrics>,
    /// W
    pub total_power: Option<f64>,
}

/// PoE output on one port.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PoePort {
    /// W
    pub power: Option<f64>,
    /// mA
    pub current: Option<f64>,
    /// V
    pub voltage: Option<f64>,
}

/// Per-port PoE output, indexed by port number.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoeMetrics {
    pub ports: Vec<PoePort>,
}

/// A physical port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortInfo {
    /// Zero-based index, stable across snapshots.
    pub index: usize,
    pub name: String,
}

impl PortInfo {
    /// One-based, zero-padded port number as printed on the chassis.
    pub fn label(&self) -> String {
        format!("{:02}", self.index + 1)
    }
}

/// A full point-in-time read of the switch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub identity: DeviceIdentity,
    pub system: SystemMetrics,
    /// `None` on models without PoE hardware.
    pub poe: Option<PoeMetrics>,
    pub ports: Vec<PortInfo>,
    pub fetched_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn port(&self, index: usize) -> Option<&PortInfo> {
        self.ports.get(index)
    }

    pub fn poe_port(&self, index: usize) -> Option<&PoePort> {
        self.poe.as_ref()?.ports.get(index)
    }

    pub fn supports_poe(&self) -> bool {
        self.poe.is_some()
    }

    pub fn port_count(&self) -> usize {
        self.ports.len()
    }
}
