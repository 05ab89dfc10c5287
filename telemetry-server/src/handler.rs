//! Per-datagram pipeline: endpoint -> parse -> [ack] -> validate -> record.
//!
//! Every failure here ends handling of that one datagram only. Two datagrams from the
//! same sender may be handled concurrently; whichever records last wins in the table.

use std::net::SocketAddr;
use std::sync::Arc;

use telemetry_core::{
    check_change, decode_payload, parse_reading, should_ack, validate, ClientEndpoint,
    ClientTable, Limits, ParseError, Reading, Warning,
};
use tokio::net::UdpSocket;

use crate::ack;

/// One received datagram, as handed over by the dispatcher.
#[derive(Debug)]
pub struct Datagram {
    /// Dispatch sequence number, for log correlation.
    pub seq: u64,
    pub payload: Vec<u8>,
    pub from: SocketAddr,
}

/// How handling ended.
#[derive(Debug)]
pub enum Outcome {
    /// Payload did not match the template: no ack, no record.
    ParseFailed(ParseError),
    Recorded {
        reading: Reading,
        /// An acknowledgment datagram was handed to the socket.
        acked: bool,
        warnings: Vec<Warning>,
    },
}

/// State shared by every handler task.
pub struct Handler {
    socket: Arc<UdpSocket>,
    table: Arc<ClientTable>,
    limits: Limits,
}

impl Handler {
    pub fn new(socket: Arc<UdpSocket>, table: Arc<ClientTable>, limits: Limits) -> Self {
        Self {
            socket,
            table,
            limits,
        }
    }

    pub async fn handle(&self, datagram: Datagram) -> Outcome {
        let Datagram { seq, payload, from } = datagram;
        let endpoint = ClientEndpoint::from(from);
        log::info!("#{}: Handling request from client {}", seq, endpoint);

        let text = decode_payload(&payload);
        let reading = match parse_reading(&text) {
            Ok(reading) => reading,
            Err(e) => {
                log::error!(
                    "#{}: Invalid data format received from {} ({}): {:?}",
                    seq,
                    endpoint,
                    e,
                    text
                );
                return Outcome::ParseFailed(e);
            }
        };
        log::info!("#{}: Data received -> {}", seq, reading);

        let mut acked = false;
        if should_ack(reading.qos) {
            match ack::send_ack(&self.socket, from).await {
                Ok(()) => {
                    acked = true;
                    log::info!("#{}: Sent ACK back to client", seq);
                }
                Err(e) => log::warn!("#{}: ACK to {} not sent: {}", seq, endpoint, e),
            }
        }

        let mut warnings = validate(&reading, &self.limits);
        for w in &warnings {
            log::warn!("#{}: {}", seq, w);
        }

        let update = self.table.record(&endpoint, &reading);
        if update.created {
            log::debug!("#{}: new client record for {}", seq, endpoint);
        }
        if let Some(previous) = update.previous {
            let changes = check_change(&reading, previous, &self.limits);
            for w in &changes {
                log::warn!("#{}: {}", seq, w);
            }
            warnings.extend(changes);
        }

        Outcome::Recorded {
            reading,
            acked,
            warnings,
        }
    }
}
