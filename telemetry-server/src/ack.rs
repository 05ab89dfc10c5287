//! Best-effort acknowledgment send over the listening socket.

use std::net::SocketAddr;

use telemetry_core::ACK_PAYLOAD;
use tokio::net::UdpSocket;

/// Send the fixed acknowledgment as one datagram. No retry; callers log and move on.
pub async fn send_ack(socket: &UdpSocket, to: SocketAddr) -> std::io::Result<()> {
    let sent = socket.send_to(ACK_PAYLOAD, to).await?;
    if sent != ACK_PAYLOAD.len() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::WriteZero,
            format!("short acknowledgment: {} of {} bytes", sent, ACK_PAYLOAD.len()),
        ));
    }
    Ok(())
}
