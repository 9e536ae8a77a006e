use std::net::IpAddr;

use edgemap_common::{
    debug,
    error::DeviceError,
    network::{device::DeviceEndpoint, mac::MacAddress},
    records::ArpTable,
};
use edgemap_protocols::cli::{ios, ParsedRow};

use crate::session::{Connector, Session};

/// Builds the MAC -> IP map from `show ip arp` rows.
///
/// Rows the template could not structure, and rows whose MAC or address do not parse
/// (e.g. `Incomplete` entries), are skipped. A MAC seen twice keeps its last address.
pub fn build_arp_table(rows: &[ParsedRow]) -> ArpTable {
    let mut table = ArpTable::new();

    for row in rows {
        let Some(fields) = row.as_record() else {
            debug!("skipping unparsable arp row: {row:?}");
            continue;
        };

        let (Some(mac), Some(address)) = (fields.get("mac"), fields.get("address")) else {
            continue;
        };

        let (Ok(mac), Ok(ip)) = (mac.parse::<MacAddress>(), address.parse::<IpAddr>()) else {
            debug!(mac, address, "skipping arp entry without a usable mac/ip");
            continue;
        };

        if let Some(previous) = table.insert(mac, ip) {
            debug!(%mac, %previous, current = %ip, "duplicate arp entry, keeping the later address");
        }
    }

    table
}

/// Retrieves the router's ARP cache.
pub async fn fetch_arp_table(
    connector: &dyn Connector,
    router: &DeviceEndpoint,
) -> Result<ArpTable, DeviceError> {
    let mut session = Session::open(connector, router).await?;
    let rows = session.run_parsed(ios::SHOW_IP_ARP).await;
    session.close().await;

    let table = build_arp_table(&rows?);
    debug!(router = router.address(), entries = table.len(), "arp table fetched");
    Ok(table)
}
