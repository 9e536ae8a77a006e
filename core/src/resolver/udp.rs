use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use edgemap_common::{debug, error::LookupError, trace};
use edgemap_protocols::dns::{self, PtrOutcome};
use tokio::net::UdpSocket;
use tokio::time::{timeout_at, Instant};

use super::ReverseLookup;

const MAX_DATAGRAM: usize = 512;

/// Sends PTR queries to each configured server in order until one gives a definite answer.
#[derive(Debug, Clone)]
pub struct UdpResolver {
    servers: Vec<SocketAddr>,
    timeout: Duration,
}

impl UdpResolver {
    pub fn new(servers: Vec<SocketAddr>, timeout: Duration) -> Self {
        Self { servers, timeout }
    }

    /// One question to one server. `Ok` carries the definite outcome, `Err` means
    /// this server could not answer and the next one should be asked.
    async fn query(&self, server: SocketAddr, ip: IpAddr) -> Result<Result<String, LookupError>, LookupError> {
        let bind: SocketAddr = match server {
            SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        };
        let socket = UdpSocket::bind(bind)
            .await
            .map_err(|e| LookupError::Transport(e.to_string()))?;
        socket
            .connect(server)
            .await
            .map_err(|e| LookupError::Transport(e.to_string()))?;

        let id: u16 = rand::random();
        let packet = dns::create_ptr_packet(&ip, id).map_err(|e| LookupError::Malformed(e.to_string()))?;
        socket
            .send(&packet)
            .await
            .map_err(|e| LookupError::Transport(e.to_string()))?;

        let deadline = Instant::now() + self.timeout;
        let mut buf = [0u8; MAX_DATAGRAM];

        loop {
            let len = timeout_at(deadline, socket.recv(&mut buf))
                .await
                .map_err(|_| LookupError::Transport(format!("{server} timed out")))?
                .map_err(|e| LookupError::Transport(e.to_string()))?;

            let answer = dns::parse_ptr_response(&buf[..len])
                .map_err(|e| LookupError::Malformed(format!("{server}: {e}")))?;

            if answer.id != id {
                trace!(%server, expected = id, got = answer.id, "ignoring reply with foreign id");
                continue;
            }

            return match answer.outcome {
                PtrOutcome::Found(name) => Ok(Ok(name)),
                PtrOutcome::NoRecord => Ok(Err(LookupError::NotFound)),
                PtrOutcome::ServerError(rcode) => {
                    Err(LookupError::Transport(format!("{server} answered rcode {rcode}")))
                }
            };
        }
    }
}

#[async_trait]
impl ReverseLookup for UdpResolver {
    async fn lookup_ptr(&self, ip: IpAddr) -> Result<String, LookupError> {
        let mut last_error = LookupError::Transport("no DNS servers configured".to_string());

        for &server in &self.servers {
            match self.query(server, ip).await {
                Ok(outcome) => return outcome,
                Err(e) => {
                    debug!(%ip, %server, "server gave no answer: {e}");
                    last_error = e;
                }
            }
        }

        Err(match last_error {
            LookupError::Malformed(reason) => LookupError::Transport(reason),
            other => other,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    /// Answers every query it receives with the reply `answer` builds for it.
    async fn responder<F>(answer: F) -> SocketAddr
    where
        F: Fn(&[u8]) -> Vec<u8> + Send + Sync + 'static,
    {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        let answer = Arc::new(answer);

        tokio::spawn(async move {
            let mut buf = [0u8; MAX_DATAGRAM];
            while let Ok((len, peer)) = socket.recv_from(&mut buf).await {
                let reply = answer(&buf[..len]);
                let _ = socket.send_to(&reply, peer).await;
            }
        });

        addr
    }

    /// A bound socket that never answers.
    async fn silent() -> (UdpSocket, SocketAddr) {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        (socket, addr)
    }

    fn ip() -> IpAddr {
        "10.0.0.5".parse().unwrap()
    }

    #[tokio::test]
    async fn resolves_ptr() {
        let server = responder(|q| dns::build_ptr_reply(q, 0, Some("host1.example.com."))).await;
        let resolver = UdpResolver::new(vec![server], Duration::from_secs(2));

        assert_eq!(resolver.lookup_ptr(ip()).await.unwrap(), "host1.example.com");
    }

    #[tokio::test]
    async fn nxdomain_is_not_found_and_stops_the_walk() {
        let nx = responder(|q| dns::build_ptr_reply(q, 3, None)).await;
        let never = responder(|q| dns::build_ptr_reply(q, 0, Some("wrong.example.com."))).await;
        let resolver = UdpResolver::new(vec![nx, never], Duration::from_secs(2));

        assert_eq!(resolver.lookup_ptr(ip()).await, Err(LookupError::NotFound));
    }

    #[tokio::test]
    async fn servfail_and_timeout_fall_through_to_next_server() {
        let (_hold, dead) = silent().await;
        let servfail = responder(|q| dns::build_ptr_reply(q, 2, None)).await;
        let good = responder(|q| dns::build_ptr_reply(q, 0, Some("host1.example.com."))).await;
        let resolver = UdpResolver::new(vec![dead, servfail, good], Duration::from_millis(200));

        assert_eq!(resolver.lookup_ptr(ip()).await.unwrap(), "host1.example.com");
    }

    #[tokio::test]
    async fn all_servers_failing_is_transport() {
        let (_hold, dead) = silent().await;
        let resolver = UdpResolver::new(vec![dead], Duration::from_millis(100));

        let err = resolver.lookup_ptr(ip()).await.unwrap_err();
        assert!(err.is_transient());
    }
}
