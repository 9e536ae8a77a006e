//! Cisco IOS commands and the templates that structure their output.

use std::sync::LazyLock;

use super::template::{ParsedRow, Template};

pub const SHOW_IP_ARP: &str = "show ip arp";
pub const SHOW_INTERFACES_STATUS: &str = "show interfaces status";
pub const SHOW_IP_INTERFACE_BRIEF: &str = "show ip interface brief";
pub const SHOW_RUNNING_CONFIG: &str = "show running-config";
pub const WRITE_MEMORY: &str = "write memory";

const MAC_TABLE_PREFIX: &str = "show mac address-table";

/// The device's MAC table is scoped per VLAN; one command per VLAN.
pub fn show_mac_address_table_vlan(vlan: &str) -> String {
    format!("{MAC_TABLE_PREFIX} vlan {}", vlan.trim())
}

/// Markers IOS prints when it refuses a command.
const REJECTION_MARKERS: &[&str] = &[
    "% Invalid input",
    "% Incomplete command",
    "% Ambiguous command",
    "% Unknown command",
    "% Unrecognized command",
    "% Authorization failed",
];

/// Returns the device's complaint if the output says the command was refused.
pub fn rejection(output: &str) -> Option<&str> {
    output
        .lines()
        .map(str::trim)
        .find(|line| REJECTION_MARKERS.iter().any(|m| line.starts_with(m)))
}

static ARP: LazyLock<Template> = LazyLock::new(|| {
    Template::new(
        SHOW_IP_ARP,
        r"^(?P<protocol>Internet)\s+(?P<address>\S+)\s+(?P<age>\d+|-)\s+(?P<mac>\S+)\s+(?P<type>\S+)(?:\s+(?P<interface>\S+))?\s*$",
        &[r"^Protocol\s+Address\s+Age"],
    )
    .expect("arp template is valid")
});

static INTERFACES_STATUS: LazyLock<Template> = LazyLock::new(|| {
    Template::new(
        SHOW_INTERFACES_STATUS,
        r"^(?P<port>\S+)\s+(?:(?P<name>.*?)\s+)?(?P<status>connected|notconnect|notconnec|disabled|err-disabled|inactive|monitoring|suspended|sfpAbsent|xcvrAbsent|noXcvr|faulty)\s+(?P<vlan>\S+)\s+(?P<duplex>\S+)\s+(?P<speed>\S+)(?:\s+(?P<type>.*?))?\s*$",
        &[r"^Port\s+Name\s+Status\s+Vlan"],
    )
    .expect("interface status template is valid")
});

static MAC_TABLE: LazyLock<Template> = LazyLock::new(|| {
    Template::new(
        MAC_TABLE_PREFIX,
        r"^\s*\*?\s*(?P<vlan>\S+)\s+(?P<destination_address>[0-9a-fA-F]{4}\.[0-9a-fA-F]{4}\.[0-9a-fA-F]{4})\s+(?P<type>\S+)\s+(?:(?:Yes|No|-)\s+(?:\d+|-)\s+)?(?P<destination_port>\S.*?)\s*$",
        &[
            r"^\s*Mac Address Table",
            r"^\s*Vlan\s+Mac Address\s+Type",
            r"^\s*-+\s+-+",
            r"^\s*Total Mac Addresses",
            r"^\s*Multicast Entries",
        ],
    )
    .expect("mac table template is valid")
});

static IP_INTERFACE_BRIEF: LazyLock<Template> = LazyLock::new(|| {
    Template::new(
        SHOW_IP_INTERFACE_BRIEF,
        r"^(?P<intf>\S+)\s+(?P<ipaddr>\S+)\s+(?P<ok>YES|NO)\s+(?P<method>\S+)\s+(?P<status>up|down|administratively down|deleted)\s+(?P<proto>up|down)\s*$",
        &[r"^Interface\s+IP-Address\s+OK\?"],
    )
    .expect("ip interface brief template is valid")
});

/// Finds the template for a command line, tolerating extra whitespace and case.
pub fn template_for(command: &str) -> Option<&'static Template> {
    let normalized = command
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_lowercase();

    let is = |prefix: &str| normalized == prefix || normalized.starts_with(&format!("{prefix} "));

    if is(SHOW_IP_ARP) {
        Some(&*ARP)
    } else if is(SHOW_INTERFACES_STATUS) {
        Some(&*INTERFACES_STATUS)
    } else if is(MAC_TABLE_PREFIX) {
        Some(&*MAC_TABLE)
    } else if is(SHOW_IP_INTERFACE_BRIEF) {
        Some(&*IP_INTERFACE_BRIEF)
    } else {
        None
    }
}

/// Structures `output` of `command`, or `None` when no template covers the command.
pub fn parse(command: &str, output: &str) -> Option<Vec<ParsedRow>> {
    template_for(command).map(|t| t.parse(output))
}
