//! Server settings. Built in: the process reads no config file, flags or env vars.

use telemetry_core::Limits;

/// Ingestion endpoint configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Host to resolve for the passive bind (default `::`, all addresses).
    pub bind_host: String,
    /// Well-known UDP port (default 9999).
    pub port: u16,
    /// Receive buffer; longer datagrams are truncated by the transport (default 300).
    pub max_datagram_size: usize,
    /// Range bounds and abrupt-change thresholds.
    pub limits: Limits,
}

fn default_bind_host() -> String {
    "::".to_string()
}
fn default_port() -> u16 {
    9999
}
fn default_max_datagram_size() -> usize {
    300
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_host: default_bind_host(),
            port: default_port(),
            max_datagram_size: default_max_datagram_size(),
            limits: Limits::default(),
        }
    }
}

#[cfg(test)]
impl Config {
    /// IPv4 loopback, ephemeral port.
    pub fn for_test() -> Self {
        Self {
            bind_host: "127.0.0.1".to_string(),
            port: 0,
            ..Self::default()
        }
    }
}
