// ────────────────────────────────
// src/listener/tcp.rs
// Low‑level resolve + bind; TLS is layered on top by the factory.
// ────────────────────────────────
use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use tokio::net::TcpListener;

use super::error::{BindFailure, ListenerError};
use crate::config::ListenerConfig;

/// Resolve the configured endpoint and make a single bind attempt on one
/// address, IPv4 preferred.
///
/// Blocks on name resolution. Must be called inside a Tokio runtime, since the
/// socket is registered with its reactor.
pub(crate) fn bind_tcp(config: &ListenerConfig) -> Result<TcpListener, ListenerError> {
    let endpoint = config.endpoint();

    let addr = resolve(config).map_err(|source| ListenerError::AddressBindFailure {
        endpoint: endpoint.clone(),
        reason: BindFailure::HostNotFound,
        source,
    })?;

    let bind_failure = |source: io::Error| ListenerError::AddressBindFailure {
        endpoint: endpoint.clone(),
        reason: BindFailure::classify(&source),
        source,
    };

    let listener = std::net::TcpListener::bind(addr).map_err(bind_failure)?;
    listener.set_nonblocking(true).map_err(bind_failure)?;
    TcpListener::from_std(listener).map_err(bind_failure)
}

fn resolve(config: &ListenerConfig) -> io::Result<SocketAddr> {
    let addrs = (config.host(), config.port).to_socket_addrs()?;
    select_addr(addrs).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("no addresses found for {}", config.host()),
        )
    })
}

/// First IPv4 address, else the first address of any family.
fn select_addr(addrs: impl IntoIterator<Item = SocketAddr>) -> Option<SocketAddr> {
    let mut first = None;
    for addr in addrs {
        if addr.is_ipv4() {
            return Some(addr);
        }
        first.get_or_insert(addr);
    }
    first
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> SocketAddr {
        s.parse().unwrap()
    }

    #[test]
    fn resolves_ip_literals_without_lookup() {
        let resolved = resolve(&ListenerConfig::new("127.0.0.1", 2525)).unwrap();
        assert_eq!(resolved, addr("127.0.0.1:2525"));

        let resolved = resolve(&ListenerConfig::new("::1", 0)).unwrap();
        assert_eq!(resolved, addr("[::1]:0"));
    }

    #[test]
    fn empty_address_resolves_to_unspecified() {
        let resolved = resolve(&ListenerConfig::new("", 0)).unwrap();
        assert!(resolved.ip().is_unspecified());
    }

    #[test]
    fn selects_a_single_address_preferring_ipv4() {
        let dual = [addr("[::1]:25"), addr("127.0.0.1:25"), addr("10.0.0.1:25")];
        assert_eq!(select_addr(dual), Some(addr("127.0.0.1:25")));

        let v6_only = [addr("[::1]:25"), addr("[fe80::1]:25")];
        assert_eq!(select_addr(v6_only), Some(addr("[::1]:25")));

        assert_eq!(select_addr(Vec::new()), None);
    }

    #[tokio::test]
    async fn unresolvable_host_is_classified_before_binding() {
        let err = bind_tcp(&ListenerConfig::new("abcd.invalid", 0)).unwrap_err();
        assert_eq!(err.bind_failure(), Some(BindFailure::HostNotFound));
        assert!(err.to_string().starts_with("listen tcp abcd.invalid:0: no such host"));
    }

    #[tokio::test]
    async fn binds_ephemeral_port() {
        let listener = bind_tcp(&ListenerConfig::new("127.0.0.1", 0)).unwrap();
        let addr = listener.local_addr().unwrap();
        assert!(addr.ip().is_loopback());
        assert_ne!(addr.port(), 0);
    }
}
