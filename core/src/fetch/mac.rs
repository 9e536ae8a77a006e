use std::collections::HashSet;

use edgemap_common::{
    debug,
    error::DeviceError,
    network::{device::DeviceEndpoint, mac::MacAddress, vlan::UserVlans},
    records::PortMacRecord,
};
use edgemap_protocols::cli::{ios, ParsedRow};

use crate::session::{Connector, Session};

/// Ports whose `show interfaces status` VLAN column names a user VLAN.
///
/// Trunks report `trunk` there and routed ports `routed`, so neither can qualify.
pub fn access_ports(rows: &[ParsedRow], vlans: &UserVlans) -> HashSet<String> {
    rows.iter()
        .filter_map(ParsedRow::as_record)
        .filter(|f| f.get("vlan").is_some_and(|v| vlans.contains(v)))
        .filter_map(|f| f.get("port").map(str::to_string))
        .collect()
}

/// Keeps MAC table rows learned in a user VLAN on one of `access_ports`.
///
/// Only the first destination port of a row counts.
pub fn port_mac_records(
    rows: &[ParsedRow],
    vlans: &UserVlans,
    access_ports: &HashSet<String>,
) -> Vec<PortMacRecord> {
    let mut records = Vec::new();

    for row in rows {
        let Some(fields) = row.as_record() else {
            debug!("skipping unparsable mac table row: {row:?}");
            continue;
        };

        if !fields.get("vlan").is_some_and(|v| vlans.contains(v)) {
            continue;
        }

        let Some(port) = fields.first_of("destination_port") else {
            continue;
        };
        if !access_ports.contains(port) {
            continue;
        }

        match fields.get("destination_address").map(str::parse::<MacAddress>) {
            Some(Ok(mac)) => records.push(PortMacRecord::new(port, mac)),
            _ => debug!(port, "skipping mac table row without a usable address"),
        }
    }

    records
}

/// Retrieves the (port, MAC) pairs on a switch's user-facing access ports.
///
/// One `show mac address-table vlan V` per user VLAN, on a single session. The result is
/// ordered by port, then MAC.
pub async fn fetch_mac_table(
    connector: &dyn Connector,
    switch: &DeviceEndpoint,
    vlans: &UserVlans,
) -> Result<Vec<PortMacRecord>, DeviceError> {
    let mut session = Session::open(connector, switch).await?;
    let result = collect_port_macs(&mut session, vlans).await;
    session.close().await;

    let mut records = result?;
    records.sort();
    debug!(switch = switch.address(), records = records.len(), "mac table fetched");
    Ok(records)
}

async fn collect_port_macs(
    session: &mut Session,
    vlans: &UserVlans,
) -> Result<Vec<PortMacRecord>, DeviceError> {
    let status = session.run_parsed(ios::SHOW_INTERFACES_STATUS).await?;
    let ports = access_ports(&status, vlans);
    debug!(host = session.host(), access_ports = ports.len(), "access ports selected");

    let mut records = Vec::new();
    for vlan in vlans.iter() {
        let rows = session.run_parsed(&ios::show_mac_address_table_vlan(vlan)).await?;
        let found = port_mac_records(&rows, vlans, &ports);
        debug!(host = session.host(), vlan, rows = rows.len(), kept = found.len(), "mac table queried");
        records.extend(found);
    }

    Ok(records)
}
