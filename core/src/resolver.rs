//! Reverse name resolution.
//!
//! [`ReverseLookup`] is the seam between the correlator and the DNS transport: the
//! production implementation walks the configured servers over UDP ([`udp::UdpResolver`]),
//! tests substitute [`StaticResolver`].

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use edgemap_common::error::LookupError;

pub mod udp;

pub use udp::UdpResolver;

#[async_trait]
pub trait ReverseLookup: Send + Sync {
    /// Returns the first PTR target for `ip`, fully qualified, without the trailing dot.
    async fn lookup_ptr(&self, ip: IpAddr) -> Result<String, LookupError>;
}

/// Answers from a fixed table. Addresses without an entry are [`LookupError::NotFound`].
#[derive(Debug, Default)]
pub struct StaticResolver {
    answers: HashMap<IpAddr, Result<String, LookupError>>,
    calls: AtomicUsize,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, ip: IpAddr, name: impl Into<String>) -> Self {
        self.answers.insert(ip, Ok(name.into()));
        self
    }

    pub fn with_failure(mut self, ip: IpAddr, error: LookupError) -> Self {
        self.answers.insert(ip, Err(error));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ReverseLookup for StaticResolver {
    async fn lookup_ptr(&self, ip: IpAddr) -> Result<String, LookupError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.answers
            .get(&ip)
            .cloned()
            .unwrap_or(Err(LookupError::NotFound))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_resolver_defaults_to_not_found() {
        let ip: IpAddr = "10.0.0.5".parse().unwrap();
        let resolver = StaticResolver::new().with_name(ip, "host1.example.com");

        assert_eq!(resolver.lookup_ptr(ip).await.unwrap(), "host1.example.com");
        assert_eq!(
            resolver.lookup_ptr("10.0.0.6".parse().unwrap()).await,
            Err(LookupError::NotFound)
        );
        assert_eq!(resolver.calls(), 2);
    }
}
