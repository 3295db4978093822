//! Target resolution and connection establishment.

use std::net::SocketAddr;

use tokio::net::{TcpStream, lookup_host};
use tracing::{debug, info};

use crate::config::RelayConfig;
use crate::error::{Error, Result};

/// Resolve the configured target to one concrete socket address.
///
/// Exactly one address is selected (the first lookup result); any additional
/// results are discarded. Lookup failure is fatal: no retry, no fallback
/// address.
pub async fn resolve_target(config: &RelayConfig) -> Result<SocketAddr> {
    let query = format!("{}:{}", config.host, config.port);
    let mut addrs = lookup_host(&query).await.map_err(|source| Error::Resolve {
        host: config.host.clone(),
        port: config.port,
        source,
    })?;
    let addr = addrs.next().ok_or_else(|| Error::NoAddress {
        host: config.host.clone(),
        port: config.port,
    })?;
    debug!(%addr, "Resolved target address");
    Ok(addr)
}

/// Open the TCP connection and announce it.
///
/// The confirmation line is the only connection-status output the relay
/// produces; everything else on stdout is forwarded payload.
pub async fn connect(addr: SocketAddr) -> Result<TcpStream> {
    let stream = TcpStream::connect(addr)
        .await
        .map_err(|source| Error::Connect { addr, source })?;
    info!(peer = %addr, "Connection established");

    // Program output, not a log line.
    #[allow(clippy::print_stdout)]
    {
        println!("{}", connection_banner(addr));
    }
    Ok(stream)
}

/// One-line, user-visible connection confirmation.
pub fn connection_banner(addr: SocketAddr) -> String {
    format!("Connected to {} on port {}!", addr.ip(), addr.port())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[allow(clippy::unwrap_used)]
    fn banner_names_peer_ip_and_port() {
        let addr: SocketAddr = "127.0.0.1:12345".parse().unwrap();
        assert_eq!(
            connection_banner(addr),
            "Connected to 127.0.0.1 on port 12345!"
        );
    }

    #[tokio::test]
    #[allow(clippy::unwrap_used)]
    async fn resolve_selects_first_address_for_ip_literal() {
        let config = RelayConfig {
            host: "127.0.0.1".to_string(),
            port: 12345,
            ..RelayConfig::default()
        };
        let addr = resolve_target(&config).await.unwrap();
        assert_eq!(addr, "127.0.0.1:12345".parse().unwrap());
    }

    #[tokio::test]
    #[allow(clippy::unwrap_used)]
    async fn resolve_fails_for_unknown_host() {
        let config = RelayConfig {
            host: "wirepipe-test.invalid".to_string(),
            port: 12345,
            ..RelayConfig::default()
        };
        let err = resolve_target(&config).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Resolve { .. } | Error::NoAddress { .. }
        ));
        assert_ne!(err.exit_code(), 0);
    }
}
