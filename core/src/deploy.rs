//! Interface configuration push.
//!
//! Every change is preceded by a running-config backup of the same device; when the
//! backup fails nothing is pushed. Saving to startup-config is a separate step the
//! caller confirms.

use std::path::{Path, PathBuf};

use edgemap_common::{
    debug,
    error::DeviceError,
    info,
    network::device::DeviceEndpoint,
};
use edgemap_protocols::cli::{ios, ParsedRow};
use thiserror::Error;

use crate::backup::{backup_running_config, BackupError};
use crate::session::{Connector, Session};

const UNASSIGNED: &str = "unassigned";

#[derive(Debug, Error)]
pub enum DeployError {
    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error("backup of {host} failed, no change pushed")]
    Backup {
        host: String,
        #[source]
        source: BackupError,
    },
}

/// What was done to one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployOutcome {
    pub host: String,
    pub backup: PathBuf,
    /// Interfaces that received the configuration set, in device order.
    pub interfaces: Vec<String>,
}

/// Layer-3 interfaces from `show ip interface brief` rows: those with an address.
pub fn l3_interfaces(rows: &[ParsedRow]) -> Vec<String> {
    rows.iter()
        .filter_map(ParsedRow::as_record)
        .filter(|f| f.get("ipaddr").is_some_and(|ip| !ip.eq_ignore_ascii_case(UNASSIGNED)))
        .filter_map(|f| f.get("intf").map(str::to_string))
        .collect()
}

pub async fn discover_l3_interfaces(session: &mut Session) -> Result<Vec<String>, DeviceError> {
    let rows = session.run_parsed(ios::SHOW_IP_INTERFACE_BRIEF).await?;
    Ok(l3_interfaces(&rows))
}

/// `interface <name>` followed by the configured lines.
pub fn interface_config_set(interface: &str, lines: &[String]) -> Vec<String> {
    std::iter::once(format!("interface {interface}"))
        .chain(lines.iter().cloned())
        .collect()
}

/// Backs up `endpoint`, then applies `lines` to each of its layer-3 interfaces.
pub async fn deploy_interface_config(
    connector: &dyn Connector,
    endpoint: &DeviceEndpoint,
    lines: &[String],
    backup_dir: &Path,
) -> Result<DeployOutcome, DeployError> {
    let mut session = Session::open(connector, endpoint).await?;
    let result = push(&mut session, lines, backup_dir).await;
    session.close().await;
    result
}

async fn push(session: &mut Session, lines: &[String], backup_dir: &Path) -> Result<DeployOutcome, DeployError> {
    let interfaces = discover_l3_interfaces(session).await?;
    debug!(host = session.host(), interfaces = interfaces.len(), "layer-3 interfaces found");

    let backup = backup_running_config(session, backup_dir)
        .await
        .map_err(|source| DeployError::Backup {
            host: session.host().to_string(),
            source,
        })?;

    for interface in &interfaces {
        session.send_config_set(&interface_config_set(interface, lines)).await?;
        info!(host = session.host(), interface = %interface, "interface configured");
    }

    Ok(DeployOutcome {
        host: session.host().to_string(),
        backup,
        interfaces,
    })
}

/// Saves the running configuration to startup-config and returns what the device printed.
pub async fn write_memory(connector: &dyn Connector, endpoint: &DeviceEndpoint) -> Result<String, DeviceError> {
    let mut session = Session::open(connector, endpoint).await?;
    let result = session.run_raw(ios::WRITE_MEMORY).await;
    session.close().await;
    result
}
