//! The tables and records flowing through the correlation pipeline.
//!
//! Each stage produces one of these and hands it read-only to the next:
//! MAC/port table -> [`PortMacRecord`], ARP join -> [`IpPortRecord`],
//! DNS annotation -> [`PortIdentityRecord`], per switch -> [`SwitchReport`].

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::net::IpAddr;

use crate::network::interface;
use crate::network::mac::MacAddress;

/// Placeholder for a reverse lookup that was attempted and failed.
pub const DNS_NOT_FOUND: &str = "DNS Not Found";

/// A router's MAC -> IP cache. One IP per MAC; a later insert for the same MAC replaces
/// the earlier one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArpTable {
    entries: HashMap<MacAddress, IpAddr>,
}

impl ArpTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `mac -> ip`, returning the address it displaced, if any.
    pub fn insert(&mut self, mac: MacAddress, ip: IpAddr) -> Option<IpAddr> {
        self.entries.insert(mac, ip)
    }

    pub fn get(&self, mac: &MacAddress) -> Option<IpAddr> {
        self.entries.get(mac).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(MacAddress, IpAddr)> for ArpTable {
    fn from_iter<I: IntoIterator<Item = (MacAddress, IpAddr)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (mac, ip) in iter {
            table.insert(mac, ip);
        }
        table
    }
}

/// A MAC address seen on a user-facing access port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortMacRecord {
    pub port: String,
    pub mac: MacAddress,
}

impl PortMacRecord {
    pub fn new(port: impl Into<String>, mac: MacAddress) -> Self {
        Self {
            port: port.into(),
            mac,
        }
    }
}

impl Ord for PortMacRecord {
    fn cmp(&self, other: &Self) -> Ordering {
        interface::natural_cmp(&self.port, &other.port).then_with(|| self.mac.cmp(&other.mac))
    }
}

impl PartialOrd for PortMacRecord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A [`PortMacRecord`] that found its IP in the ARP table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpPortRecord {
    pub port: String,
    pub mac: MacAddress,
    pub ip: IpAddr,
}

/// Result of reverse-resolving a record's IP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedName {
    Host(String),
    NotFound,
}

impl ResolvedName {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Host(name) => name,
            Self::NotFound => DNS_NOT_FOUND,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Host(_))
    }
}

impl fmt::Display for ResolvedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal record: who is plugged in where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortIdentityRecord {
    pub port: String,
    pub mac: MacAddress,
    pub ip: IpAddr,
    pub name: ResolvedName,
}

impl PortIdentityRecord {
    pub fn from_ip_record(record: IpPortRecord, name: ResolvedName) -> Self {
        Self {
            port: record.port,
            mac: record.mac,
            ip: record.ip,
            name,
        }
    }
}

/// Per-switch results of one audit run.
///
/// A switch is in `entries` only once its whole pipeline finished; a switch whose
/// pipeline failed is in `failures` with the reason instead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SwitchReport {
    pub entries: BTreeMap<String, Vec<PortIdentityRecord>>,
    pub failures: BTreeMap<String, String>,
}

impl SwitchReport {
    pub fn record_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn resolved_count(&self) -> usize {
        self.entries
            .values()
            .flatten()
            .filter(|r| r.name.is_resolved())
            .count()
    }
}
