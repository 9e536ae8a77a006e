use edgemap_common::network::device::DeviceEndpoint;
use edgemap_core::deploy::{deploy_interface_config, write_memory, DeployError};
use edgemap_core::session::scripted::{ScriptedConnector, ScriptedDevice};
use edgemap_protocols::cli::ios;

use crate::support::*;

const BRIEF: &str = "\
Interface              IP-Address      OK? Method Status                Protocol
Vlan1                  unassigned      YES NVRAM  administratively down down
Vlan10                 10.0.10.1       YES NVRAM  up                    up
Vlan20                 10.0.20.1       YES NVRAM  up                    up
";

const RUNNING: &str = "Building configuration...\n\nhostname core1\n!\ninterface Vlan10\n ip address 10.0.10.1 255.255.255.0\n!\nend\n";

fn lines() -> Vec<String> {
    vec![
        "ip helper-address 10.0.0.10".to_string(),
        "no ip proxy-arp".to_string(),
    ]
}

fn endpoint() -> DeviceEndpoint {
    DeviceEndpoint::new(ROUTER, credentials())
}

#[tokio::test]
async fn deploy_backs_up_before_any_change_then_saves() {
    let tmp = tempfile::tempdir().unwrap();
    let backup_dir = tmp.path().join("config_backup_files");
    let connector = ScriptedConnector::new().with_device(
        ROUTER,
        ScriptedDevice::new()
            .respond(ios::SHOW_IP_INTERFACE_BRIEF, BRIEF)
            .respond(ios::SHOW_RUNNING_CONFIG, RUNNING)
            .respond(ios::WRITE_MEMORY, "Building configuration...\n[OK]\n"),
    );

    let outcome = deploy_interface_config(&connector, &endpoint(), &lines(), &backup_dir)
        .await
        .unwrap();

    assert_eq!(std::fs::read_to_string(&outcome.backup).unwrap(), RUNNING);
    assert_eq!(outcome.interfaces, vec!["Vlan10", "Vlan20"]);
    assert_eq!(
        connector.config_sets(ROUTER),
        vec![
            vec!["interface Vlan10", "ip helper-address 10.0.0.10", "no ip proxy-arp"],
            vec!["interface Vlan20", "ip helper-address 10.0.0.10", "no ip proxy-arp"],
        ]
    );

    write_memory(&connector, &endpoint()).await.unwrap();
    assert_eq!(
        connector.transcript(ROUTER),
        vec![ios::SHOW_IP_INTERFACE_BRIEF, ios::SHOW_RUNNING_CONFIG, ios::WRITE_MEMORY]
    );
    assert_eq!(connector.open_sessions(), 0);
}

#[tokio::test]
async fn failed_backup_leaves_device_untouched() {
    let tmp = tempfile::tempdir().unwrap();
    let connector = ScriptedConnector::new().with_device(
        ROUTER,
        ScriptedDevice::new()
            .respond(ios::SHOW_IP_INTERFACE_BRIEF, BRIEF)
            .drop_on(ios::SHOW_RUNNING_CONFIG),
    );

    let err = deploy_interface_config(&connector, &endpoint(), &lines(), tmp.path())
        .await
        .unwrap_err();

    assert!(matches!(err, DeployError::Backup { .. }));
    assert!(connector.config_sets(ROUTER).is_empty());
    assert_eq!(connector.open_sessions(), 0);
}

#[tokio::test]
async fn unreachable_device_is_a_connection_error() {
    let tmp = tempfile::tempdir().unwrap();
    let connector = ScriptedConnector::new();

    let err = deploy_interface_config(&connector, &endpoint(), &lines(), tmp.path())
        .await
        .unwrap_err();

    assert!(matches!(err, DeployError::Device(ref e) if e.host() == ROUTER));
}
