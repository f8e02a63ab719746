//! TCP listener setup.
//!
//! # Responsibilities
//! - Resolve the configured bind address plus the requested port
//! - Bind synchronously so `listen` can report the port before returning
//! - Register the socket with the event loop

use std::net::{IpAddr, SocketAddr};

use tokio::net::TcpListener;
use tokio::runtime::Handle;

use crate::error::ServerBindError;

/// Bind `host:port` and hand the socket to the event loop.
///
/// Port 0 asks the OS for an ephemeral port; read it back from
/// `TcpListener::local_addr`.
pub fn bind(runtime: &Handle, host: &str, port: u16) -> Result<TcpListener, ServerBindError> {
    let ip: IpAddr = host
        .parse()
        .map_err(|e: std::net::AddrParseError| ServerBindError::InvalidAddress {
            address: host.to_string(),
            reason: e.to_string(),
        })?;
    let addr = SocketAddr::new(ip, port);
    let bind_error = |source: std::io::Error| ServerBindError::Bind {
        address: addr.to_string(),
        source,
    };

    let std_listener = std::net::TcpListener::bind(addr).map_err(bind_error)?;
    std_listener.set_nonblocking(true).map_err(bind_error)?;

    let _guard = runtime.enter();
    let listener = TcpListener::from_std(std_listener).map_err(bind_error)?;

    if let Ok(local_addr) = listener.local_addr() {
        tracing::info!(address = %local_addr, "Listener bound");
    }
    Ok(listener)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ephemeral_port_is_assigned() {
        let listener = bind(&Handle::current(), "127.0.0.1", 0).unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }

    #[tokio::test]
    async fn hostname_is_rejected() {
        let err = bind(&Handle::current(), "localhost", 0).unwrap_err();
        assert!(matches!(err, ServerBindError::InvalidAddress { .. }));
    }

    #[tokio::test]
    async fn port_in_use_is_a_bind_error() {
        let first = bind(&Handle::current(), "127.0.0.1", 0).unwrap();
        let port = first.local_addr().unwrap().port();
        let err = bind(&Handle::current(), "127.0.0.1", port).unwrap_err();
        assert!(matches!(err, ServerBindError::Bind { .. }));
    }
}
