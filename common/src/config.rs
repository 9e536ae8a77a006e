//! # Configuration
//!
//! One YAML document drives both workflows:
//!
//! ```yaml
//! router: [10.0.0.1]
//! switch_list: [10.0.1.11, 10.0.1.12]
//! user_vlan: [10, 20]
//! dns_server_list: [10.0.0.53, 10.0.0.54]
//!
//! device_list: [10.0.0.1]
//! interface_configuration:
//!   - ip helper-address 10.0.0.10
//! ```
//!
//! The audit reads the first four keys, the deploy flow the last two. Every other key
//! is an optional tuning knob with a default.

use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::network::device::DEFAULT_SSH_PORT;
use crate::network::vlan::{UserVlans, VlanId};

pub const DNS_PORT: u16 = 53;

/// Timeouts and concurrency bounds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub ssh_port: u16,
    pub connect_timeout_secs: u64,
    pub command_timeout_secs: u64,
    /// Upper bound on simultaneously open device sessions.
    pub max_sessions: usize,
    /// Upper bound on in-flight reverse lookups across all switches.
    pub max_dns_queries: usize,
    pub dns_timeout_ms: u64,
    /// Extra attempts for lookups that failed in transport. Confirmed negatives are never retried.
    pub dns_retries: u8,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            ssh_port: DEFAULT_SSH_PORT,
            connect_timeout_secs: 10,
            command_timeout_secs: 30,
            max_sessions: 4,
            max_dns_queries: 16,
            dns_timeout_ms: 2_000,
            dns_retries: 0,
        }
    }
}

impl Tuning {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    pub fn dns_timeout(&self) -> Duration {
        Duration::from_millis(self.dns_timeout_ms)
    }
}

/// The configuration file as written by the operator.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub router: Vec<String>,
    #[serde(default)]
    pub switch_list: Vec<String>,
    #[serde(default)]
    pub user_vlan: Vec<VlanId>,
    #[serde(default)]
    pub dns_server_list: Vec<String>,
    #[serde(default)]
    pub device_list: Vec<String>,
    #[serde(default)]
    pub interface_configuration: Vec<String>,
    #[serde(flatten)]
    pub tuning: Tuning,
}

/// Validated input of an audit run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditPlan {
    /// ARP source. Only the first configured router is queried.
    pub router: String,
    /// Sorted, deduplicated.
    pub switches: Vec<String>,
    pub vlans: UserVlans,
    /// In priority order.
    pub dns_servers: Vec<SocketAddr>,
    pub tuning: Tuning,
}

/// Validated input of an interface configuration push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployPlan {
    pub devices: Vec<String>,
    pub interface_lines: Vec<String>,
    pub tuning: Tuning,
}

impl ConfigFile {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn audit_plan(&self) -> Result<AuditPlan, ConfigError> {
        let router = self
            .router
            .iter()
            .map(|r| r.trim())
            .find(|r| !r.is_empty())
            .ok_or(ConfigError::Missing("router"))?
            .to_string();

        let vlans = UserVlans::from(self.user_vlan.as_slice());
        if vlans.is_empty() {
            return Err(ConfigError::Missing("user_vlan"));
        }

        let dns_servers = self
            .dns_server_list
            .iter()
            .map(|s| parse_dns_server(s))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(AuditPlan {
            router,
            switches: sorted_unique(&self.switch_list),
            vlans,
            dns_servers,
            tuning: self.tuning.clone(),
        })
    }

    pub fn deploy_plan(&self) -> Result<DeployPlan, ConfigError> {
        let devices = sorted_unique(&self.device_list);
        if devices.is_empty() {
            return Err(ConfigError::Missing("device_list"));
        }
        if self.interface_configuration.is_empty() {
            return Err(ConfigError::Missing("interface_configuration"));
        }

        Ok(DeployPlan {
            devices,
            interface_lines: self.interface_configuration.clone(),
            tuning: self.tuning.clone(),
        })
    }
}

fn sorted_unique(items: &[String]) -> Vec<String> {
    let mut out: Vec<String> = items
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    out.sort();
    out.dedup();
    out
}

/// Accepts `a.b.c.d`, `a.b.c.d:port`, a bare IPv6 address or `[v6]:port`.
pub fn parse_dns_server(s: &str) -> Result<SocketAddr, ConfigError> {
    let s = s.trim();
    s.parse::<SocketAddr>()
        .or_else(|_| s.parse::<IpAddr>().map(|ip| SocketAddr::new(ip, DNS_PORT)))
        .map_err(|_| ConfigError::InvalidDnsServer(s.to_string()))
}
