//! Async client for the MikroTik SwitchOS web management pages.
//!
//! The switch exposes its state as a handful of pages (`sys.b`, `poe.b`,
//! `link.b`) written in a relaxed object notation. [`SwitchClient`] fetches
//! and decodes them into the raw payload types in [`models`]; turning those
//! into a domain snapshot is `switchos-core`'s job.

pub mod client;
pub mod error;
pub mod models;
pub mod notation;
pub mod transport;

pub use client::SwitchClient;
pub use error::Error;
pub use models::{DevicePages, LinkPayload, PoePayload, SystemPayload};
pub use transport::{Credentials, TransportConfig};
