// ── Sensor descriptions ──
//
// Static metadata for every sensor the switch can back, plus the pure
// selector that reads each one out of a snapshot.

use serde::Serialize;
use strum::{Display, EnumIter, IntoStaticStr};

use crate::model::Snapshot;

/// Which value a sensor reads. One variant per (category, field).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumIter, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SensorKind {
    CpuTemperature,
    Psu1Current,
    Psu1Voltage,
    Psu1Power,
    Psu2Current,
    Psu2Voltage,
    Psu2Power,
    TotalPower,
    PoePower,
    PoeCurrent,
    PoeVoltage,
}

/// Whether a sensor exists once per device or once per port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SensorScope {
    Global,
    Port,
}

impl SensorKind {
    pub fn scope(self) -> SensorScope {
        match self {
            Self::PoePower | Self::PoeCurrent | Self::PoeVoltage => SensorScope::Port,
            _ => SensorScope::Global,
        }
    }

    /// Power-supply readings are only meaningful on PoE-capable hardware.
    pub fn requires_poe(self) -> bool {
        matches!(
            self,
            Self::Psu1Current
                | Self::Psu1Voltage
                | Self::Psu1Power
                | Self::Psu2Current
                | Self::Psu2Voltage
                | Self::Psu2Power
                | Self::TotalPower
        )
    }

    /// Read this value out of `snapshot`.
    ///
    /// `port` is ignored for global kinds and required for port kinds.
    /// `None` when the device does not report the value.
    pub fn read(self, snapshot: &Snapshot, port: Option<usize>) -> Option<f64> {
        let system = &snapshot.system;
        let psu1 = || system.psu1.unwrap_or_default();
        let psu2 = || system.psu2.unwrap_or_default();
        match self {
            Self::CpuTemperature => system.cpu_temperature,
            Self::Psu1Current => psu1().current,
            Self::Psu1Voltage => psu1().voltage,
            Self::Psu1Power => psu1().power,
            Self::Psu2Current => psu2().current,
            Self::Psu2Voltage => psu2().voltage,
            Self::Psu2Power => psu2().power,
            Self::TotalPower => system.total_power,
            Self::PoePower => snapshot.poe_port(port?)?.power,
            Self::PoeCurrent => snapshot.poe_port(port?)?.current,
            Self::PoeVoltage => snapshot.poe_port(port?)?.voltage,
        }
    }
}

/// Measurement category, as a host would classify the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DeviceClass {
    Temperature,
    Current,
    Voltage,
    Power,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Unit {
    Celsius,
    Milliampere,
    Volt,
    Watt,
}

impl Unit {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Celsius => "°C",
            Self::Milliampere => "mA",
            Self::Volt => "V",
            Self::Watt => "W",
        }
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Static description of one sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SensorDescription {
    /// Stable key, used in unique ids.
    pub key: &'static str,
    pub kind: SensorKind,
    pub device_class: DeviceClass,
    pub unit: Unit,
    /// Suggested number of decimals when displaying.
    pub precision: u8,
}

impl SensorDescription {
    pub fn scope(&self) -> SensorScope {
        self.kind.scope()
    }
}

const fn describe(
    key: &'static str,
    kind: SensorKind,
    device_class: DeviceClass,
    unit: Unit,
    precision: u8,
) -> SensorDescription {
    SensorDescription {
        key,
        kind,
        device_class,
        unit,
        precision,
    }
}

/// Sensors that exist once per device.
#[rustfmt::skip]
pub static GLOBAL_SENSORS: [SensorDescription; 8] = [
    describe("cpu_temperature", SensorKind::CpuTemperature, DeviceClass::Temperature, Unit::Celsius, 0),
    describe("psu1_current", SensorKind::Psu1Current, DeviceClass::Current, Unit::Milliampere, 0),
    describe("psu1_voltage", SensorKind::Psu1Voltage, DeviceClass::Voltage, Unit::Volt, 2),
    describe("psu1_power", SensorKind::Psu1Power, DeviceClass::Power, Unit::Watt, 1),
    describe("psu2_current", SensorKind::Psu2Current, DeviceClass::Current, Unit::Milliampere, 0),
    describe("psu2_voltage", SensorKind::Psu2Voltage, DeviceClass::Voltage, Unit::Volt, 2),
    describe("psu2_power", SensorKind::Psu2Power, DeviceClass::Power, Unit::Watt, 1),
    describe("total_power", SensorKind::TotalPower, DeviceClass::Power, Unit::Watt, 1),
];

/// Sensors that exist once per PoE port.
#[rustfmt::skip]
pub static PORT_SENSORS: [SensorDescription; 3] = [
    describe("poe_power", SensorKind::PoePower, DeviceClass::Power, Unit::Watt, 1),
    describe("poe_current", SensorKind::PoeCurrent, DeviceClass::Current, Unit::Milliampere, 1),
    describe("poe_voltage", SensorKind::PoeVoltage, DeviceClass::Voltage, Unit::Volt, 1),
];

/// Look a description up by key in both tables.
pub fn find_description(key: &str) -> Option<&'static SensorDescription> {
    GLOBAL_SENSORS
        .iter()
        .chain(PORT_SENSORS.iter())
        .find(|d| d.key == key)
}
