use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tracing::{info_span, Instrument};

use crate::terminal::{print, prompt, spinner};
use edgemap_common::{
    config::ConfigFile,
    debug, error,
    info,
    network::device::{Credentials, DeviceEndpoint},
    success,
};
use edgemap_core::{
    deploy::{deploy_interface_config, write_memory},
    session::ssh::SshConnector,
};

pub async fn deploy(config: &ConfigFile, credentials: Arc<Credentials>, backup_dir: &Path) -> anyhow::Result<()> {
    let plan = config.deploy_plan().context("invalid deploy configuration")?;
    let connector = SshConnector::from(&plan.tuning);

    print::notice();
    for line in &plan.interface_lines {
        print::print_status(line);
    }

    let mut configured: Vec<DeviceEndpoint> = Vec::new();
    for device in &plan.devices {
        let endpoint = DeviceEndpoint::new(device.as_str(), Arc::clone(&credentials)).with_port(plan.tuning.ssh_port);
        let span = info_span!("deploy", indicatif.pb_show = true, device = %device);
        spinner::start(&span, &format!("Configuring {device}..."));

        match deploy_interface_config(&connector, &endpoint, &plan.interface_lines, backup_dir)
            .instrument(span)
            .await
        {
            Ok(outcome) => {
                success!(
                    device = %device,
                    backup = %outcome.backup.display(),
                    "configured {} interfaces",
                    outcome.interfaces.len()
                );
                configured.push(endpoint);
            }
            Err(e) => error!(device = %device, "{:#}", anyhow::Error::from(e)),
        }
    }

    anyhow::ensure!(!configured.is_empty(), "no device was configured");

    if !prompt::confirm("write configuration to startup-config?")? {
        info!("running-config left unsaved on {} devices", configured.len());
        return Ok(());
    }

    let mut failed: usize = 0;
    for endpoint in &configured {
        match write_memory(&connector, endpoint).await {
            Ok(output) => {
                debug!(device = endpoint.address(), "write memory replied: {output:?}");
                for line in reply_lines(&output) {
                    print::print_status(line);
                }
                success!(device = endpoint.address(), "startup-config written");
            }
            Err(e) => {
                failed += 1;
                error!("{e}");
            }
        }
    }

    anyhow::ensure!(failed == 0, "write memory failed on {failed} devices");
    Ok(())
}

/// The non-blank lines of a device reply.
fn reply_lines(output: &str) -> impl Iterator<Item = &str> {
    output.lines().map(str::trim).filter(|line| !line.is_empty())
}
