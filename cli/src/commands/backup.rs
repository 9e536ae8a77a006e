use std::path::Path;
use std::sync::Arc;

use tracing::{info_span, Instrument};

use crate::terminal::spinner;
use edgemap_common::{
    config::ConfigFile,
    error,
    network::device::{Credentials, DeviceEndpoint},
    success,
};
use edgemap_core::{backup::backup_device, session::ssh::SshConnector};

/// `device_list` when present, otherwise the audit router and switches.
fn targets(config: &ConfigFile) -> Vec<String> {
    let mut devices: Vec<String> = if config.device_list.is_empty() {
        config.router.iter().take(1).chain(&config.switch_list).cloned().collect()
    } else {
        config.device_list.clone()
    };
    devices.iter_mut().for_each(|d| *d = d.trim().to_string());
    devices.retain(|d| !d.is_empty());
    devices.sort();
    devices.dedup();
    devices
}

pub async fn backup(config: &ConfigFile, credentials: Arc<Credentials>, backup_dir: &Path) -> anyhow::Result<()> {
    let devices = targets(config);
    anyhow::ensure!(!devices.is_empty(), "no devices to back up");

    let connector = SshConnector::from(&config.tuning);
    let span = info_span!("backup", indicatif.pb_show = true);
    spinner::start(&span, &format!("Backing up {} devices...", devices.len()));

    let mut failed: usize = 0;
    for device in &devices {
        let endpoint = DeviceEndpoint::new(device.as_str(), Arc::clone(&credentials)).with_port(config.tuning.ssh_port);
        match backup_device(&connector, &endpoint, backup_dir).instrument(span.clone()).await {
            Ok(path) => success!(device = %device, "saved to {}", path.display()),
            Err(e) => {
                failed += 1;
                error!(device = %device, "{e}");
            }
        }
    }

    anyhow::ensure!(failed == 0, "{failed} of {} backups failed", devices.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_list_takes_precedence() {
        let config = ConfigFile::from_yaml("router: [r1]\nswitch_list: [s1]\ndevice_list: [d2, d1]\n").unwrap();
        assert_eq!(targets(&config), vec!["d1", "d2"]);
    }

    #[test]
    fn falls_back_to_router_and_switches() {
        let config = ConfigFile::from_yaml("router: [r1, r2]\nswitch_list: [s2, s1, s1]\n").unwrap();
        assert_eq!(targets(&config), vec!["r1", "s1", "s2"]);
    }
}
