use std::net::SocketAddr;
use std::sync::Arc;

use edgemap_common::config::{AuditPlan, ConfigFile};
use edgemap_common::records::{ResolvedName, SwitchReport, DNS_NOT_FOUND};
use edgemap_core::correlate::NameResolution;
use edgemap_core::pipeline::{AuditPipeline, FailurePolicy, PipelineError};
use edgemap_core::report;
use edgemap_core::resolver::UdpResolver;
use edgemap_core::session::scripted::{ScriptedConnector, ScriptedDevice};
use edgemap_protocols::cli::ios;
use tokio::net::UdpSocket;

use crate::support::*;

/*************************************************************
                          Fixtures
**************************************************************/

fn router() -> ScriptedDevice {
    ScriptedDevice::new().respond(ios::SHOW_IP_ARP, ARP)
}

fn access_switch() -> ScriptedDevice {
    ScriptedDevice::new()
        .respond(ios::SHOW_INTERFACES_STATUS, STATUS)
        .respond(ios::show_mac_address_table_vlan("10"), MAC_VLAN_10)
        .respond(ios::show_mac_address_table_vlan("20"), MAC_VLAN_20)
}

fn plan(switches: &[&str], dns: SocketAddr) -> AuditPlan {
    let yaml = format!(
        "router: [{ROUTER}]\nswitch_list: [{}]\nuser_vlan: [10, \"20\"]\ndns_server_list: [\"{dns}\"]\ndns_timeout_ms: 300\n",
        switches.join(", ")
    );
    ConfigFile::from_yaml(&yaml).unwrap().audit_plan().unwrap()
}

fn pipeline(connector: &ScriptedConnector, plan: &AuditPlan) -> AuditPipeline {
    let resolver = UdpResolver::new(plan.dns_servers.clone(), plan.tuning.dns_timeout());
    let names = NameResolution::new(Arc::new(resolver), plan.tuning.max_dns_queries, plan.tuning.dns_retries);
    AuditPipeline::new(Arc::new(connector.clone()), names, plan.tuning.max_sessions)
}

async fn named_dns() -> SocketAddr {
    dns_responder(&[("5.0.0.10.in-addr.arpa", "host1.example.com.")]).await
}

type UserRow = (String, String, String, String);

fn row(port: &str, mac: &str, ip: &str, name: &str) -> UserRow {
    (port.to_string(), mac.to_string(), ip.to_string(), name.to_string())
}

fn users(report: &SwitchReport, switch: &str) -> Vec<UserRow> {
    report.entries[switch]
        .iter()
        .map(|r| (r.port.clone(), r.mac.to_string(), r.ip.to_string(), r.name.to_string()))
        .collect()
}

/*************************************************************
                     Correlation pipeline
**************************************************************/

#[tokio::test]
async fn access_ports_are_correlated_end_to_end() {
    let connector = ScriptedConnector::new()
        .with_device(ROUTER, router())
        .with_device(SWITCH_A, access_switch());
    let plan = plan(&[SWITCH_A], named_dns().await);

    let report = pipeline(&connector, &plan).run(&plan, credentials()).await.unwrap();

    // Gi1/0/2 has no ARP entry and Gi1/0/24 is a trunk: neither shows up.
    assert_eq!(
        users(&report, SWITCH_A),
        vec![
            row("Gi1/0/1", "aa:bb:cc:dd:ee:01", "10.0.0.5", "host1"),
            row("Gi1/0/3", "aa:bb:cc:dd:ee:03", "10.0.0.6", DNS_NOT_FOUND),
        ]
    );
    assert!(report.failures.is_empty());
    assert_eq!(connector.open_sessions(), 0);
}

#[tokio::test]
async fn unreachable_switch_is_reported_and_others_complete() {
    let connector = ScriptedConnector::new()
        .with_device(ROUTER, router())
        .with_device(SWITCH_A, access_switch())
        .with_unreachable(SWITCH_B);
    let plan = plan(&[SWITCH_B, SWITCH_A], named_dns().await);

    let report = pipeline(&connector, &plan).run(&plan, credentials()).await.unwrap();

    assert_eq!(report.entries.len(), 1);
    assert_eq!(report.entries[SWITCH_A].len(), 2);
    assert!(!report.entries.contains_key(SWITCH_B));
    assert!(report.failures[SWITCH_B].contains(SWITCH_B));
}

#[tokio::test]
async fn fail_fast_aborts_the_run() {
    let connector = ScriptedConnector::new()
        .with_device(ROUTER, router())
        .with_device(SWITCH_A, access_switch());
    let plan = plan(&[SWITCH_A, SWITCH_B], named_dns().await);

    let result = pipeline(&connector, &plan)
        .with_policy(FailurePolicy::Abort)
        .run(&plan, credentials())
        .await;

    match result {
        Err(PipelineError::Switch { switch, .. }) => assert_eq!(switch, SWITCH_B),
        other => panic!("expected a switch failure, got {other:?}"),
    }
}

#[tokio::test]
async fn dns_outage_keeps_every_record() {
    let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let connector = ScriptedConnector::new()
        .with_device(ROUTER, router())
        .with_device(SWITCH_A, access_switch());
    let plan = plan(&[SWITCH_A], silent.local_addr().unwrap());

    let report = pipeline(&connector, &plan).run(&plan, credentials()).await.unwrap();

    let records = &report.entries[SWITCH_A];
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.name == ResolvedName::NotFound));
}

#[tokio::test]
async fn repeated_runs_are_identical() {
    let connector = ScriptedConnector::new()
        .with_device(ROUTER, router())
        .with_device(SWITCH_A, access_switch())
        .with_device(SWITCH_B, access_switch());
    let plan = plan(&[SWITCH_A, SWITCH_B], named_dns().await);
    let pipeline = pipeline(&connector, &plan);

    let first = pipeline.run(&plan, credentials()).await.unwrap();
    let second = pipeline.run(&plan, credentials()).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.entries.keys().collect::<Vec<_>>(), vec![SWITCH_A, SWITCH_B]);
}

#[tokio::test]
async fn csv_report_lists_every_user() {
    let connector = ScriptedConnector::new()
        .with_device(ROUTER, router())
        .with_device(SWITCH_A, access_switch());
    let plan = plan(&[SWITCH_A], named_dns().await);
    let report = pipeline(&connector, &plan).run(&plan, credentials()).await.unwrap();
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("audit.csv");

    report::save_csv(&report, &path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines[0], "Switch IP,Interface,MAC address,IP address,User");
    assert_eq!(lines[1], "10.0.1.11,Gi1/0/1,aa:bb:cc:dd:ee:01,10.0.0.5,host1");
    assert_eq!(lines.len(), 3);
}

#[test]
fn shared_config_fixture_is_valid() {
    let plan = ConfigFile::from_yaml(CONFIG).unwrap().audit_plan().unwrap();
    assert_eq!(plan.switches, vec![SWITCH_A, SWITCH_B]);
    assert_eq!(plan.vlans.len(), 2);
}
