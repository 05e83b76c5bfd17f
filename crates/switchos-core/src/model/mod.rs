// ── Domain model ──

pub mod mac;
pub mod snapshot;

pub use mac::MacAddress;
pub use snapshot::{
    DeviceIdentity, PoeMetrics, PoePort, PortInfo, PsuMetrics, Snapshot, SystemMetrics,
};
