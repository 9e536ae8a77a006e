//! The joins that turn device tables into identity records.
//!
//! * [`ip_table`]: **inner** join of the MAC/port table with the ARP table on MAC. A MAC
//!   the router never ARPed produces no record at all.
//! * [`dns_query`]: annotates every joined record with its reverse name. A failed lookup
//!   degrades the record to [`ResolvedName::NotFound`]; it is never dropped and never
//!   aborts the batch.

use std::sync::Arc;
use std::time::Duration;

use edgemap_common::{
    debug,
    error::LookupError,
    records::{ArpTable, IpPortRecord, PortIdentityRecord, PortMacRecord, ResolvedName},
    warn,
};
use edgemap_protocols::dns::short_hostname;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::resolver::ReverseLookup;

/// Pause before the first retry of a lookup; each further retry waits one step longer.
const RETRY_BACKOFF: Duration = Duration::from_millis(50);

/// Joins each record's MAC against the ARP table, keeping input order.
pub fn ip_table(records: &[PortMacRecord], arp: &ArpTable) -> Vec<IpPortRecord> {
    records
        .iter()
        .filter_map(|record| match arp.get(&record.mac) {
            Some(ip) => Some(IpPortRecord {
                port: record.port.clone(),
                mac: record.mac,
                ip,
            }),
            None => {
                debug!(port = %record.port, mac = %record.mac, "no arp entry, dropping");
                None
            }
        })
        .collect()
}

/// How reverse names are obtained: the resolver, a limiter shared by every batch in the
/// run, and the number of extra attempts for transport failures.
#[derive(Clone)]
pub struct NameResolution {
    resolver: Arc<dyn ReverseLookup>,
    limiter: Arc<Semaphore>,
    retries: u8,
}

impl NameResolution {
    pub fn new(resolver: Arc<dyn ReverseLookup>, max_in_flight: usize, retries: u8) -> Self {
        Self {
            resolver,
            limiter: Arc::new(Semaphore::new(max_in_flight.max(1))),
            retries,
        }
    }

    /// Resolves one address to its short hostname.
    pub async fn resolve(&self, record: &IpPortRecord) -> ResolvedName {
        let mut attempt: u8 = 0;

        let outcome = loop {
            let result = match self.limiter.acquire().await {
                Ok(_permit) => self.resolver.lookup_ptr(record.ip).await,
                Err(_) => Err(LookupError::Transport("resolver limiter closed".to_string())),
            };

            match result {
                Err(e) if e.is_transient() && attempt < self.retries => {
                    attempt += 1;
                    debug!(ip = %record.ip, attempt, "retrying reverse lookup: {e}");
                    tokio::time::sleep(RETRY_BACKOFF * u32::from(attempt)).await;
                }
                other => break other,
            }
        };

        match outcome {
            Ok(fqdn) => match short_hostname(&fqdn) {
                "" => ResolvedName::NotFound,
                host => ResolvedName::Host(host.to_string()),
            },
            Err(LookupError::NotFound) => {
                debug!(ip = %record.ip, port = %record.port, "no PTR record");
                ResolvedName::NotFound
            }
            Err(e) => {
                warn!(ip = %record.ip, port = %record.port, "reverse lookup failed: {e}");
                ResolvedName::NotFound
            }
        }
    }
}

/// Resolves every record concurrently, bounded by the shared limiter. The output has
/// exactly one element per input, in input order.
///
/// The lookups belong to this future: dropping it aborts whatever is still in flight.
pub async fn dns_query(records: Vec<IpPortRecord>, names: &NameResolution) -> Vec<PortIdentityRecord> {
    let mut lookups = JoinSet::new();
    for (index, record) in records.iter().cloned().enumerate() {
        let names = names.clone();
        lookups.spawn(async move { (index, names.resolve(&record).await) });
    }

    let mut resolved = vec![ResolvedName::NotFound; records.len()];
    while let Some(joined) = lookups.join_next().await {
        match joined {
            Ok((index, name)) => resolved[index] = name,
            Err(e) => warn!("reverse lookup task failed: {e}"),
        }
    }

    records
        .into_iter()
        .zip(resolved)
        .map(|(record, name)| PortIdentityRecord::from_ip_record(record, name))
        .collect()
}
