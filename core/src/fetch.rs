//! Table acquisition from devices.
//!
//! Each fetcher opens its own [`Session`](crate::session::Session), runs the commands it
//! needs in structured mode, closes the session and turns the rows into a typed table.
//! The row-to-table conversions are plain functions so they can be tested without a device.

pub mod arp;
pub mod mac;

pub use arp::{build_arp_table, fetch_arp_table};
pub use mac::{access_ports, fetch_mac_table, port_mac_records};
