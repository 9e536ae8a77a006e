//! Canned device output and a loopback DNS responder shared by the integration tests.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use edgemap_common::network::device::Credentials;
use edgemap_protocols::dns::{build_ptr_reply, DNS_HDR_LEN};
use tokio::net::UdpSocket;

pub const ROUTER: &str = "10.0.0.1";
pub const SWITCH_A: &str = "10.0.1.11";
pub const SWITCH_B: &str = "10.0.1.12";

pub const ARP: &str = "\
Protocol  Address          Age (min)  Hardware Addr   Type   Interface
Internet  10.0.0.5               12   aabb.ccdd.ee01  ARPA   Vlan10
Internet  10.0.0.6                3   aabb.ccdd.ee03  ARPA   Vlan20
Internet  10.0.0.254              -   aabb.ccdd.eeff  ARPA   Vlan10
";

pub const STATUS: &str = "\
Port      Name               Status       Vlan       Duplex  Speed Type
Gi1/0/1   desk-101           connected    10         a-full a-1000 10/100/1000BaseTX
Gi1/0/2   desk-102           connected    10         a-full a-1000 10/100/1000BaseTX
Gi1/0/3   printer            connected    20         a-full  a-100 10/100/1000BaseTX
Gi1/0/24  uplink             connected    trunk      a-full a-1000 10/100/1000BaseTX
";

pub const MAC_VLAN_10: &str = "\
          Mac Address Table
-------------------------------------------

Vlan    Mac Address       Type        Ports
----    -----------       --------    -----
  10    aabb.ccdd.ee01    DYNAMIC     Gi1/0/1
  10    ffff.ffff.fffe    DYNAMIC     Gi1/0/2
  10    aabb.ccdd.eeff    DYNAMIC     Gi1/0/24
Total Mac Addresses for this criterion: 3
";

pub const MAC_VLAN_20: &str = "\
          Mac Address Table
-------------------------------------------

Vlan    Mac Address       Type        Ports
----    -----------       --------    -----
  20    aabb.ccdd.ee03    DYNAMIC     Gi1/0/3
Total Mac Addresses for this criterion: 1
";

pub const CONFIG: &str = "
router: [10.0.0.1]
switch_list: [10.0.1.12, 10.0.1.11]
user_vlan: [10, 20]
dns_server_list: []
dns_timeout_ms: 500
";

pub fn credentials() -> Arc<Credentials> {
    Arc::new(Credentials::new("netops", "secret"))
}

/// Reads the question name of a query: `5.0.0.10.in-addr.arpa`.
fn question_name(query: &[u8]) -> Option<String> {
    let mut labels = Vec::new();
    let mut pos = DNS_HDR_LEN;
    loop {
        let len = *query.get(pos)? as usize;
        if len == 0 {
            break;
        }
        let label = query.get(pos + 1..pos + 1 + len)?;
        labels.push(String::from_utf8_lossy(label).into_owned());
        pos += 1 + len;
    }
    Some(labels.join("."))
}

/// Answers PTR queries from `names` (reverse name -> target) and NXDOMAIN for the rest.
pub async fn dns_responder(names: &[(&str, &str)]) -> SocketAddr {
    let names: HashMap<String, String> = names
        .iter()
        .map(|(q, a)| (q.to_string(), a.to_string()))
        .collect();
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let addr = socket.local_addr().unwrap();

    tokio::spawn(async move {
        let mut buf = [0u8; 512];
        while let Ok((len, peer)) = socket.recv_from(&mut buf).await {
            let query = &buf[..len];
            let reply = match question_name(query).and_then(|q| names.get(&q)) {
                Some(target) => build_ptr_reply(query, 0, Some(target)),
                None => build_ptr_reply(query, 3, None),
            };
            let _ = socket.send_to(&reply, peer).await;
        }
    });

    addr
}
