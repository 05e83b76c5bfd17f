// ── Sensor projection ──
//
// Scalar views over the coordinator's snapshot: a static description
// table and the bound sensors built from it.

mod description;
mod entity;

pub use description::{
    DeviceClass, GLOBAL_SENSORS, PORT_SENSORS, SensorDescription, SensorKind, SensorScope, Unit,
    find_description,
};
pub use entity::{Sensor, SensorSet, SensorState, StateSink};
