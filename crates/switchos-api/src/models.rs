// Raw page payloads
//
// Field names follow the switch's own short keys. Every metric is
// optional: a key the firmware does not emit deserializes to `None`.

use serde::{Deserialize, Deserializer};

use crate::notation::decode_hex_text;

/// `sys.b`: identity and system-wide health.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SystemPayload {
    /// Device identity (user-assigned name).
    #[serde(rename = "id", default, deserialize_with = "hex_text")]
    pub identity: String,
    /// Firmware version string.
    #[serde(rename = "ver", default, deserialize_with = "hex_text")]
    pub firmware: String,
    /// Board / model name.
    #[serde(rename = "brd", default, deserialize_with = "hex_text")]
    pub model: String,
    /// Serial number.
    #[serde(rename = "sid", default, deserialize_with = "hex_text")]
    pub serial_number: String,
    /// MAC address as 12 raw hex digits.
    #[serde(default)]
    pub mac: String,
    /// CPU temperature, degrees Celsius.
    #[serde(rename = "temp", default)]
    pub cpu_temp: Option<i64>,
    /// PSU 1 current, mA.
    #[serde(rename = "p1c", default)]
    pub psu1_current: Option<u64>,
    /// PSU 1 voltage, tenths of a volt.
    #[serde(rename = "p1v", default)]
    pub psu1_voltage: Option<u64>,
    /// PSU 1 power, tenths of a watt.
    #[serde(rename = "p1p", default)]
    pub psu1_power: Option<u64>,
    #[serde(rename = "p2c", default)]
    pub psu2_current: Option<u64>,
    #[serde(rename = "p2v", default)]
    pub psu2_voltage: Option<u64>,
    #[serde(rename = "p2p", default)]
    pub psu2_power: Option<u64>,
    /// Total power consumption, tenths of a watt.
    #[serde(rename = "pwr", default)]
    pub power_consumption: Option<u64>,
}

/// `poe.b`: per-port PoE output. Arrays are indexed by port number and
/// may be shorter than the port count on partial-PoE models.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PoePayload {
    /// Output power per port, tenths of a watt.
    #[serde(rename = "pwr", default)]
    pub power: Vec<u64>,
    /// Output current per port, mA.
    #[serde(rename = "curr", default)]
    pub current: Vec<u64>,
    /// Output voltage per port, tenths of a volt.
    #[serde(rename = "volt", default)]
    pub voltage: Vec<u64>,
}

/// `link.b`: port naming and count.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LinkPayload {
    /// Number of ports, when the firmware reports it explicitly.
    #[serde(rename = "prt", default)]
    pub port_count: Option<u64>,
    /// Port names.
    #[serde(rename = "nm", default, deserialize_with = "hex_text_list")]
    pub names: Vec<String>,
}

/// Everything fetched in one refresh cycle.
#[derive(Debug, Clone, Default)]
pub struct DevicePages {
    pub system: SystemPayload,
    /// `None` when the model has no PoE page.
    pub poe: Option<PoePayload>,
    pub links: LinkPayload,
}

// ── Hex text helpers ─────────────────────────────────────────────────

fn hex_text<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
    let raw = String::deserialize(de)?;
    decode_hex_text(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid hex text '{raw}'")))
}

fn hex_text_list<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<String>, D::Error> {
    let raw = Vec::<String>::deserialize(de)?;
    raw.iter()
        .map(|s| {
            decode_hex_text(s)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid hex text '{s}'")))
        })
        .collect()
}
