//! Reverse (PTR) lookups on the wire.
//!
//! Queries are built by hand with `pnet`'s DNS packet view; answers are decoded with
//! `dns-parser`, which follows name compression pointers inside the full message.

use std::net::IpAddr;

use anyhow::Context;
use dns_parser::{Packet, RData, ResponseCode};
use pnet::packet::dns::{DnsClass, DnsTypes, MutableDnsPacket, Opcode, Retcode};

pub const DNS_HDR_LEN: usize = 12;
const QUESTION_FIXED_LEN: usize = 4;

/// What a resolver said about a PTR question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PtrOutcome {
    /// First PTR target, without the trailing root dot.
    Found(String),
    /// NXDOMAIN, or NOERROR with no PTR in the answer section.
    NoRecord,
    /// SERVFAIL, REFUSED and friends. The raw RCODE is kept for logging.
    ServerError(u8),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PtrAnswer {
    pub id: u16,
    pub outcome: PtrOutcome,
}

/// `10.0.0.5` -> `5.0.0.10.in-addr.arpa`, IPv6 -> nibble form under `ip6.arpa`.
pub fn reverse_name(ip_addr: &IpAddr) -> String {
    match ip_addr {
        IpAddr::V4(v4) => {
            let [a, b, c, d] = v4.octets();
            format!("{d}.{c}.{b}.{a}.in-addr.arpa")
        }
        IpAddr::V6(v6) => {
            let mut labels: Vec<String> = Vec::with_capacity(34);
            for byte in v6.octets().iter().rev() {
                labels.push(format!("{:x}", byte & 0x0f));
                labels.push(format!("{:x}", byte >> 4));
            }
            labels.push("ip6.arpa".to_string());
            labels.join(".")
        }
    }
}

pub fn create_ptr_packet(ip_addr: &IpAddr, id: u16) -> anyhow::Result<Vec<u8>> {
    let qname: Vec<u8> = encode_dns_name(&reverse_name(ip_addr));
    let total: usize = DNS_HDR_LEN + qname.len() + QUESTION_FIXED_LEN;
    let mut buffer: Vec<u8> = vec![0u8; total];

    {
        let mut dns: MutableDnsPacket =
            MutableDnsPacket::new(&mut buffer).context("creating dns header")?;
        dns.set_id(id);
        dns.set_is_response(0);
        dns.set_opcode(Opcode::StandardQuery);
        dns.set_is_authoriative(0);
        dns.set_is_truncated(0);
        dns.set_is_recursion_desirable(1);
        dns.set_is_recursion_available(0);
        dns.set_zero_reserved(0);
        dns.set_is_non_authenticated_data(0);
        dns.set_rcode(Retcode::NoError);
        dns.set_query_count(1);
        dns.set_response_count(0);
        dns.set_authority_rr_count(0);
        dns.set_additional_rr_count(0);
    }

    let mut cursor: usize = DNS_HDR_LEN;
    buffer[cursor..cursor + qname.len()].copy_from_slice(&qname);
    cursor += qname.len();

    buffer[cursor..cursor + 2].copy_from_slice(&DnsTypes::PTR.0.to_be_bytes());
    cursor += 2;
    buffer[cursor..cursor + 2].copy_from_slice(&DnsClass(1).0.to_be_bytes());

    Ok(buffer)
}

/// Decodes a resolver reply to a PTR question.
pub fn parse_ptr_response(payload: &[u8]) -> anyhow::Result<PtrAnswer> {
    let packet = Packet::parse(payload).context("failed to parse DNS response")?;
    anyhow::ensure!(!packet.header.query, "packet is a query, not a response");

    let id = packet.header.id;
    let outcome = match packet.header.response_code {
        ResponseCode::NoError => packet
            .answers
            .iter()
            .find_map(|record| match &record.data {
                RData::PTR(ptr) => Some(ptr.0.to_string().trim_end_matches('.').to_string()),
                _ => None,
            })
            .filter(|name| !name.is_empty())
            .map_or(PtrOutcome::NoRecord, PtrOutcome::Found),
        ResponseCode::NameError => PtrOutcome::NoRecord,
        _ => PtrOutcome::ServerError(payload.get(3).map_or(0, |b| b & 0x0f)),
    };

    Ok(PtrAnswer { id, outcome })
}

/// Leftmost label of a fully qualified name: `host1.example.com` -> `host1`.
pub fn short_hostname(fqdn: &str) -> &str {
    fqdn.split('.').next().unwrap_or(fqdn)
}

fn encode_dns_name(name: &str) -> Vec<u8> {
    let mut encoded: Vec<u8> = Vec::new();
    for label in name.split('.') {
        if label.is_empty() {
            continue;
        }
        encoded.push(label.len() as u8);
        encoded.extend_from_slice(label.as_bytes());
    }
    encoded.push(0);
    encoded
}

/// Builds the reply a resolver would send for `query`. Only used to exercise the
/// decoder and the UDP resolver against a local responder.
pub fn build_ptr_reply(query: &[u8], rcode: u8, ptr_target: Option<&str>) -> Vec<u8> {
    let mut reply = query.to_vec();
    if reply.len() < DNS_HDR_LEN {
        return reply;
    }
    // QR=1, keep opcode and RD; RA=1, rcode as given.
    reply[2] |= 0x80;
    reply[3] = 0x80 | (rcode & 0x0f);

    if let Some(target) = ptr_target {
        reply[6..8].copy_from_slice(&1u16.to_be_bytes());
        let rdata = encode_dns_name(target);
        // Name points back at the question (offset 12).
        reply.extend_from_slice(&[0xc0, 0x0c]);
        reply.extend_from_slice(&DnsTypes::PTR.0.to_be_bytes());
        reply.extend_from_slice(&1u16.to_be_bytes());
        reply.extend_from_slice(&300u32.to_be_bytes());
        reply.extend_from_slice(&(rdata.len() as u16).to_be_bytes());
        reply.extend_from_slice(&rdata);
    }
    reply
}
