use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use colored::*;
use tracing::{info_span, Instrument};

use crate::{mprint, terminal::{colors, print, spinner}};
use edgemap_common::{
    config::ConfigFile,
    network::device::Credentials,
    records::{PortIdentityRecord, SwitchReport},
    success, warn,
};
use edgemap_core::{
    correlate::NameResolution,
    pipeline::{AuditPipeline, FailurePolicy},
    report,
    resolver::UdpResolver,
    session::{ssh::SshConnector, Connector},
};

type Detail = (String, ColoredString);

pub struct AuditOptions {
    pub fail_fast: bool,
    pub csv: Option<PathBuf>,
    pub xlsx: Option<PathBuf>,
}

pub async fn audit(config: &ConfigFile, credentials: Arc<Credentials>, opts: AuditOptions) -> anyhow::Result<()> {
    let plan = config.audit_plan().context("invalid audit configuration")?;
    if plan.dns_servers.is_empty() {
        warn!("dns_server_list is empty, every user will read as DNS Not Found");
    }

    let connector: Arc<dyn Connector> = Arc::new(SshConnector::from(&plan.tuning));
    let resolver = Arc::new(UdpResolver::new(plan.dns_servers.clone(), plan.tuning.dns_timeout()));
    let names = NameResolution::new(resolver, plan.tuning.max_dns_queries, plan.tuning.dns_retries);
    let policy = if opts.fail_fast { FailurePolicy::Abort } else { FailurePolicy::Continue };

    let span = info_span!("audit", indicatif.pb_show = true);
    spinner::start(&span, &format!("Reading the ARP table of {}...", plan.router));

    let pipeline = AuditPipeline::new(connector, names, plan.tuning.max_sessions)
        .with_policy(policy)
        .on_switch_done(spinner::switch_progress(span.clone()));

    let start_time: Instant = Instant::now();
    let report = pipeline
        .run(&plan, credentials)
        .instrument(span.clone())
        .await
        .context("audit aborted")?;
    drop(span);

    audit_ends(&report, start_time.elapsed());

    if let Some(path) = &opts.csv {
        report::save_csv(&report, path).with_context(|| format!("writing {}", path.display()))?;
        success!("CSV report written to {}", path.display());
    }
    if let Some(path) = &opts.xlsx {
        report::save_xlsx(&report, path).with_context(|| format!("writing {}", path.display()))?;
        success!("spreadsheet written to {}", path.display());
    }

    Ok(())
}

fn audit_ends(report: &SwitchReport, total_time: Duration) {
    print::header("Edge Audit");

    let mut idx: usize = 0;
    for (switch, records) in &report.entries {
        let note: ColoredString = format!("({} ports)", records.len()).color(colors::SEPARATOR);
        print::tree_head(idx, switch, note);
        print::as_tree_one_level(records.iter().map(record_to_detail).collect());
        mprint!();
        idx += 1;
    }

    for (switch, reason) in &report.failures {
        print::tree_head(idx, switch, "failed".color(colors::FAILURE).bold());
        print::as_tree_one_level(vec![("Reason".to_string(), reason.as_str().color(colors::FAILURE))]);
        mprint!();
        idx += 1;
    }

    print_summary(report, total_time);
}

fn record_to_detail(record: &PortIdentityRecord) -> Detail {
    let ip: ColoredString = match record.ip {
        IpAddr::V4(v4) => v4.to_string().color(colors::IPV4_ADDR),
        IpAddr::V6(v6) => v6.to_string().color(colors::IPV6_ADDR),
    };
    let name: ColoredString = if record.name.is_resolved() {
        record.name.as_str().color(colors::HOSTNAME).bold()
    } else {
        record.name.as_str().color(colors::UNRESOLVED).italic()
    };

    let value: ColoredString = format!(
        "{} {} {}",
        record.mac.to_string().color(colors::MAC_ADDR),
        ip,
        name
    )
    .normal();

    (record.port.clone(), value)
}

fn print_summary(report: &SwitchReport, total_time: Duration) {
    let records: ColoredString = format!("{} users", report.record_count()).bold().green();
    let unresolved: usize = report.record_count() - report.resolved_count();
    let switches: ColoredString = format!("{} switches", report.entries.len()).bold().green();
    let total_time: ColoredString = format!("{:.2}s", total_time.as_secs_f64()).bold().yellow();

    let mut line: String = format!("Audit Complete: {records} on {switches} in {total_time}");
    if unresolved > 0 {
        line.push_str(&format!(", {} without DNS", unresolved.to_string().yellow()));
    }
    if !report.failures.is_empty() {
        line.push_str(&format!(", {} failed", report.failures.len().to_string().red().bold()));
    }

    print::fat_separator();
    print::centerln(&line.color(colors::TEXT_DEFAULT).to_string());
}
