// ── API-to-domain type conversions ──
//
// Bridges raw `switchos_api` page payloads into the canonical `Snapshot`.
// Scales fixed-point readings into SI units and turns missing keys into
// `None`, never into zero.

use chrono::Utc;

use switchos_api::{DevicePages, LinkPayload, PoePayload, SystemPayload};

use crate::model::{
    DeviceIdentity, MacAddress, PoeMetrics, PoePort, PortInfo, PsuMetrics, Snapshot,
    SystemMetrics,
};

// ── Helpers ────────────────────────────────────────────────────────

/// Fixed-point tenths (0.1 V, 0.1 W) to a float.
#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
fn tenths(raw: u64) -> f64 {
    raw as f64 / 10.0
}

#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
fn whole(raw: u64) -> f64 {
    raw as f64
}

fn psu(current: Option<u64>, voltage: Option<u64>, power: Option<u64>) -> Option<PsuMetrics> {
    let metrics = PsuMetrics {
        current: current.map(whole),
        voltage: voltage.map(tenths),
        power: power.map(tenths),
    };
    (!metrics.is_empty()).then_some(metrics)
}

// ── Conversions ────────────────────────────────────────────────────

impl From<&SystemPayload> for DeviceIdentity {
    fn from(sys: &SystemPayload) -> Self {
        Self {
            name: sys.identity.clone(),
            serial_number: sys.serial_number.clone(),
            mac: MacAddress::new(&sys.mac),
            model: sys.model.clone(),
            firmware: sys.firmware.clone(),
        }
    }
}

impl From<&SystemPayload> for SystemMetrics {
    #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
    fn from(sys: &SystemPayload) -> Self {
        Self {
            cpu_temperature: sys.cpu_temp.map(|t| t as f64),
            psu1: psu(sys.psu1_current, sys.psu1_voltage, sys.psu1_power),
            psu2: psu(sys.psu2_current, sys.psu2_voltage, sys.psu2_power),
            total_power: sys.power_consumption.map(tenths),
        }
    }
}

impl From<&PoePayload> for PoeMetrics {
    fn from(poe: &PoePayload) -> Self {
        let len = poe.power.len().max(poe.current.len()).max(poe.voltage.len());
        let ports = (0..len)
            .map(|i| PoePort {
                power: poe.power.get(i).copied().map(tenths),
                current: poe.current.get(i).copied().map(whole),
                voltage: poe.voltage.get(i).copied().map(tenths),
            })
            .collect();
        Self { ports }
    }
}

/// Build the port list. The explicit count wins; otherwise the longest of
/// the name list and the PoE arrays decides.
fn ports_from(links: &LinkPayload, poe: Option<&PoeMetrics>) -> Vec<PortInfo> {
    let count = links
        .port_count
        .and_then(|c| usize::try_from(c).ok())
        .unwrap_or_else(|| links.names.len().max(poe.map_or(0, |p| p.ports.len())));

    (0..count)
        .map(|index| PortInfo {
            index,
            name: links
                .names
                .get(index)
                .filter(|n| !n.is_empty())
                .cloned()
                .unwrap_or_else(|| format!("Port {}", index + 1)),
        })
        .collect()
}

impl From<DevicePages> for Snapshot {
    fn from(pages: DevicePages) -> Self {
        let poe = pages.poe.as_ref().map(PoeMetrics::from);
        let ports = ports_from(&pages.links, poe.as_ref());
        Self {
            identity: DeviceIdentity::from(&pages.system),
            system: SystemMetrics::from(&pages.system),
            poe,
            ports,
            fetched_at: Utc::now(),
        }
    }
}
