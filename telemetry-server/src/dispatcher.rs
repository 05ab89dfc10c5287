//! Dual-stack UDP bind and the receive loop: one detached task per datagram.

use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;

use socket2::{Domain, Protocol, Socket, Type};
use telemetry_core::ClientTable;
use tokio::net::UdpSocket;

use crate::config::Config;
use crate::handler::{Datagram, Handler};

/// Pause after a failed receive so a persistent error cannot spin the loop.
const RECV_ERROR_BACKOFF: Duration = Duration::from_millis(50);

/// Startup failure. Fatal: nothing has been served yet.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("failed to get local address {host}:{port}: {source}")]
    Resolve {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },
    #[error("no local address for {host}:{port}")]
    NoAddress { host: String, port: u16 },
    #[error("failed to open socket: {0}")]
    Socket(#[source] io::Error),
    #[error("bind to {addr} failed: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
}

/// Passive address for `host:port`. IPv6 preferred so the socket can take both families.
pub fn resolve(host: &str, port: u16) -> Result<SocketAddr, StartupError> {
    let addrs: Vec<SocketAddr> = (host, port)
        .to_socket_addrs()
        .map_err(|source| StartupError::Resolve {
            host: host.to_string(),
            port,
            source,
        })?
        .collect();
    pick_address(&addrs).ok_or_else(|| StartupError::NoAddress {
        host: host.to_string(),
        port,
    })
}

/// First IPv6 candidate, else the first of any family.
fn pick_address(addrs: &[SocketAddr]) -> Option<SocketAddr> {
    addrs
        .iter()
        .find(|a| a.is_ipv6())
        .or_else(|| addrs.first())
        .copied()
}

/// Open and bind the listening socket. IPv6 sockets accept IPv4 traffic too
/// (IPV6_V6ONLY off). Must run inside the tokio runtime.
pub fn bind(addr: SocketAddr) -> Result<UdpSocket, StartupError> {
    let socket = Socket::new(Domain::for_address(addr), Type::DGRAM, Some(Protocol::UDP))
        .map_err(StartupError::Socket)?;
    if addr.is_ipv6() {
        socket.set_only_v6(false).map_err(StartupError::Socket)?;
    }
    socket
        .bind(&addr.into())
        .map_err(|source| StartupError::Bind { addr, source })?;
    socket.set_nonblocking(true).map_err(StartupError::Socket)?;
    UdpSocket::from_std(socket.into()).map_err(StartupError::Socket)
}

/// Owns the bound socket and hands each datagram to its own handler task.
pub struct Dispatcher {
    socket: Arc<UdpSocket>,
    handler: Arc<Handler>,
    max_datagram_size: usize,
}

impl Dispatcher {
    /// Resolve and bind per `config`. The table is shared with every handler.
    pub fn bind(config: &Config, table: Arc<ClientTable>) -> Result<Self, StartupError> {
        let addr = resolve(&config.bind_host, config.port)?;
        let socket = Arc::new(bind(addr)?);
        let handler = Arc::new(Handler::new(socket.clone(), table, config.limits));
        Ok(Self {
            socket,
            handler,
            max_datagram_size: config.max_datagram_size,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Receive forever. Handlers are detached and unbounded in number; a failure in
    /// one never reaches this loop.
    pub async fn run(self) {
        let mut buf = vec![0u8; self.max_datagram_size];
        let mut seq: u64 = 0;
        loop {
            let (n, from) = match self.socket.recv_from(&mut buf).await {
                Ok(received) => received,
                Err(e) => {
                    log::warn!("receive failed: {}", e);
                    tokio::time::sleep(RECV_ERROR_BACKOFF).await;
                    continue;
                }
            };
            if n == 0 {
                log::debug!("ignoring empty datagram from {}", from);
                continue;
            }
            seq += 1;
            let mut payload = Vec::new();
            if let Err(e) = payload.try_reserve_exact(n) {
                log::error!("#{}: dropping datagram from {}: {}", seq, from, e);
                continue;
            }
            payload.extend_from_slice(&buf[..n]);
            log::debug!("#{}: {} bytes from {}", seq, n, from);

            let handler = self.handler.clone();
            tokio::spawn(async move {
                handler.handle(Datagram { seq, payload, from }).await;
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use telemetry_core::{ClientEndpoint, ACK_PAYLOAD};
    use tokio::time::{sleep, timeout};

    async fn start(table: Arc<ClientTable>, config: &Config) -> SocketAddr {
        let dispatcher = Dispatcher::bind(config, table).unwrap();
        let addr = dispatcher.local_addr().unwrap();
        tokio::spawn(dispatcher.run());
        addr
    }

    async fn wait_for_record(table: &ClientTable, ep: &ClientEndpoint, readings: u64) {
        for _ in 0..100 {
            if table.get(ep).map(|r| r.readings) == Some(readings) {
                return;
            }
            sleep(Duration::from_millis(10)).await;
        }
        panic!("record for {} never reached {} readings", ep, readings);
    }

    #[test]
    fn resolves_unspecified_v6_by_default() {
        let addr = resolve("::", 9999).unwrap();
        assert!(addr.is_ipv6());
        assert!(addr.ip().is_unspecified());
        assert_eq!(addr.port(), 9999);
        assert_eq!(resolve("127.0.0.1", 0).unwrap(), "127.0.0.1:0".parse().unwrap());
    }

    #[test]
    fn unresolvable_host_is_a_resolve_error() {
        match resolve("bad\0host", 9999) {
            Err(StartupError::Resolve { host, port, .. }) => {
                assert_eq!(host, "bad\0host");
                assert_eq!(port, 9999);
            }
            other => panic!("expected resolve failure, got {:?}", other),
        }
    }

    #[test]
    fn address_pick_prefers_v6_and_reports_none() {
        assert_eq!(pick_address(&[]), None);
        let v4: SocketAddr = "127.0.0.1:9999".parse().unwrap();
        let v6: SocketAddr = "[::1]:9999".parse().unwrap();
        assert_eq!(pick_address(&[v4, v6]), Some(v6));
        assert_eq!(pick_address(&[v4]), Some(v4));
    }

    #[tokio::test]
    async fn second_bind_on_same_port_fails() {
        let first = bind("127.0.0.1:0".parse().unwrap()).unwrap();
        let taken = first.local_addr().unwrap();
        match bind(taken) {
            Err(StartupError::Bind { addr, .. }) => assert_eq!(addr, taken),
            other => panic!("expected bind failure, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn serves_after_garbage() {
        let table = Arc::new(ClientTable::new());
        let server = start(table.clone(), &Config::for_test()).await;
        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let ep = ClientEndpoint::from(client.local_addr().unwrap());

        client.send_to(b"garbage", server).await.unwrap();
        client
            .send_to(b"QoS: 1, Temp: 23.50, Humidity: 45.00", server)
            .await
            .unwrap();

        let mut buf = [0u8; 64];
        let (n, from) = timeout(Duration::from_secs(2), client.recv_from(&mut buf))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(&buf[..n], ACK_PAYLOAD);
        assert_eq!(from, server);

        wait_for_record(&table, &ep, 1).await;
        let rec = table.get(&ep).unwrap();
        assert_eq!((rec.last_temperature, rec.last_humidity), (23.5, 45.0));
        assert_eq!(table.len(), 1);
    }

    #[tokio::test]
    async fn oversized_datagram_is_truncated_not_rejected() {
        let table = Arc::new(ClientTable::new());
        let server = start(table.clone(), &Config::for_test()).await;
        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let ep = ClientEndpoint::from(client.local_addr().unwrap());

        let mut msg = b"QoS: 0, Temp: 30, Humidity: 60".to_vec();
        msg.resize(1000, b'x');
        client.send_to(&msg, server).await.unwrap();

        wait_for_record(&table, &ep, 1).await;
        assert_eq!(table.get(&ep).unwrap().last_humidity, 60.0);
    }

    #[tokio::test]
    async fn two_senders_get_two_records() {
        let table = Arc::new(ClientTable::new());
        let server = start(table.clone(), &Config::for_test()).await;
        let a = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let b = UdpSocket::bind("127.0.0.1:0").await.unwrap();

        a.send_to(b"QoS: 0, Temp: 20, Humidity: 40", server)
            .await
            .unwrap();
        b.send_to(b"QoS: 0, Temp: 21, Humidity: 41", server)
            .await
            .unwrap();

        wait_for_record(&table, &ClientEndpoint::from(a.local_addr().unwrap()), 1).await;
        wait_for_record(&table, &ClientEndpoint::from(b.local_addr().unwrap()), 1).await;
        assert_eq!(table.len(), 2);
    }

    #[tokio::test]
    async fn v4_sender_reaches_v6_wildcard_bind() {
        let table = Arc::new(ClientTable::new());
        let config = Config {
            bind_host: "::".to_string(),
            port: 0,
            ..Config::default()
        };
        let port = start(table.clone(), &config).await.port();
        let server: SocketAddr = ([127, 0, 0, 1], port).into();
        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();

        client
            .send_to(b"QoS: 1, Temp: 23.50, Humidity: 45.00", server)
            .await
            .unwrap();
        let mut buf = [0u8; 64];
        let (n, _) = timeout(Duration::from_secs(2), client.recv_from(&mut buf))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(&buf[..n], ACK_PAYLOAD);

        let client_port = client.local_addr().unwrap().port().to_string();
        let ep = ClientEndpoint::new("::ffff:127.0.0.1", client_port);
        wait_for_record(&table, &ep, 1).await;
        let rec = table.get(&ep).unwrap();
        assert_eq!((rec.last_temperature, rec.last_humidity), (23.5, 45.0));
    }
}
