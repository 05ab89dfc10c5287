//! Acknowledgment: fixed payload, sent only when the sender asks for QoS 1.

/// Sent as one datagram back to the sender. Constant; never built per client.
pub const ACK_PAYLOAD: &[u8] = b"ACK: Message Received";

/// QoS level that requests an acknowledgment.
pub const QOS_ACK: f32 = 1.0;

/// Exact equality: 0.5, 2 or 0.999 get no acknowledgment.
pub fn should_ack(qos: f32) -> bool {
    qos == QOS_ACK
}
