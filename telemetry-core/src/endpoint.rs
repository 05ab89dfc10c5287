//! Client endpoint identity: numeric address and port in textual form.

use std::fmt;
use std::net::SocketAddr;

/// A sender identified by its numeric IP address and port, both as text.
/// Textual form lets IPv4, IPv6 and IPv4-mapped senders share one key type.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct ClientEndpoint {
    ip: String,
    port: String,
}

impl ClientEndpoint {
    pub fn new(ip: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            port: port.into(),
        }
    }

    pub fn ip(&self) -> &str {
        &self.ip
    }

    pub fn port(&self) -> &str {
        &self.port
    }
}

impl From<SocketAddr> for ClientEndpoint {
    /// Numeric host and service, as the source address was received.
    /// IPv4 senders on a dual-stack socket keep their `::ffff:a.b.c.d` form.
    fn from(addr: SocketAddr) -> Self {
        Self::new(addr.ip().to_string(), addr.port().to_string())
    }
}

impl fmt::Display for ClientEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IP: {}, Port: {}", self.ip, self.port)
    }
}
