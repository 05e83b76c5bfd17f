//! Shared polling coordinator between `switchos-api` and its consumers.
//!
//! This crate owns the domain model and the refresh machinery for one
//! MikroTik SwitchOS device:
//!
//! - **[`Coordinator`]**: Drives a single periodic refresh loop.
//!   [`setup()`](Coordinator::setup) requires the first fetch to succeed;
//!   later failures keep the last good [`Snapshot`] and record the error.
//!   Fetches are single-flight: concurrent [`refresh_now()`](Coordinator::refresh_now)
//!   callers share one in-flight request.
//!
//! - **[`Observer`]**: Payload-free callback fired once per completed
//!   refresh cycle. Held weakly; registration is idempotent.
//!
//! - **[`StateStream`]**: `watch`-backed subscription exposing
//!   `current()` / `latest()` / `changed()` for async consumers.
//!
//! - **[`sensor`]**: Static sensor descriptions and [`Sensor`] observers
//!   that read one scalar from the snapshot and publish it to a [`StateSink`].
//!
//! - **[`SnapshotSource`]**: Seam between the coordinator and the network.
//!   [`HttpSource`] reads the switch's web pages.

pub mod config;
pub mod convert;
pub mod coordinator;
pub mod error;
pub mod model;
pub mod observer;
pub mod sensor;
pub mod source;
pub mod state;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{
    AuthCredentials, CoordinatorConfig, DEFAULT_REFRESH_INTERVAL, DEFAULT_TIMEOUT,
};
pub use coordinator::Coordinator;
pub use error::CoreError;
pub use observer::Observer;
pub use sensor::{
    DeviceClass, GLOBAL_SENSORS, PORT_SENSORS, Sensor, SensorDescription, SensorKind,
    SensorScope, SensorSet, SensorState, StateSink, Unit,
};
pub use source::{HttpSource, SnapshotSource};
pub use state::CoordinatorState;
pub use stream::{StateStream, StateWatchStream};

pub use model::{
    DeviceIdentity, MacAddress, PoeMetrics, PoePort, PortInfo, PsuMetrics, Snapshot,
    SystemMetrics,
};
